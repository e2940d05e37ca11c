//! # Ataad Support
//!
//! Shared utilities for the Ataad fixture crates.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Logging bootstrap for test binaries

pub mod logging;
pub mod rendering;

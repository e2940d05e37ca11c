//! # Ataad: fixture lifecycle management for Rust tests
//!
//! Declare resource makers (two-phase setup/teardown factories), then
//! acquire, look up and release the values they produce, either in a
//! scoped bracket or with explicit start/stop calls.
//!
//! ```rust
//! use ataad::prelude::*;
//! use std::sync::Arc;
//!
//! #[ataad::resource]
//! fn user(args: &Args, _: &Resources) -> Result<Setup<String>, BoxError> {
//!     Ok(Setup::new(args.text_or("name", "John Doe")?))
//! }
//!
//! fn main() -> Result<(), ResourceError> {
//!     let resources = Resources::new();
//!     resources.register_mod(module_path!());
//!
//!     resources.ctx("user")?.scope(|user: Arc<String>| {
//!         assert_eq!(user.as_str(), "John Doe");
//!     })?;
//!     Ok(())
//! }
//! ```

use once_cell::sync::Lazy;

pub use ataad_core::*;
pub use ataad_macros::resource;
pub use ataad_support::{logging, rendering};

#[doc(hidden)]
pub use ataad_core::__private;

static GLOBAL: Lazy<Resources> = Lazy::new(Resources::new);

/// The process-wide default collection.
///
/// Created on first use. Tests sharing it should use distinct instance
/// names, since libtest runs them on parallel threads.
pub fn global() -> &'static Resources {
    &GLOBAL
}

//! Fixture lifecycle management for Ataad.
//!
//! Makers are two-phase setup/teardown factories registered under an id.
//! Their values are acquired through a scoped bracket
//! ([`ResourceContext`]) or explicit start/stop ([`ResourceManager`]) and
//! looked up by name while they are live.

pub mod args;
pub mod context;
pub mod error;
mod instance;
pub mod maker;
pub mod manager;
pub mod namespace;
pub mod provider;
pub mod resources;
pub mod values;

pub use args::{Args, NAME_KEYWORD};
pub use context::{ResourceContext, ScopedResource};
pub use error::{BoxError, ResourceError, Result};
pub use maker::{Maker, MakerEntry, Setup};
pub use manager::ResourceManager;
pub use provider::Provider;
pub use resources::{Member, Resources, ResourcesBuilder, prelude};
pub use values::Value;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}

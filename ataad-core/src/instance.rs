//! Begin/end of a single resource instance.
//!
//! Scoped acquisition and the explicit manager both go through here so
//! that a name never has more than one live instance, and a released
//! name always leaves the value registry.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::args::Args;
use crate::error::{ResourceError, Result};
use crate::maker::{Maker, Teardown};
use crate::resources::Resources;
use crate::values::Value;

/// A live instance whose value has been published.
pub(crate) struct Instance {
    pub name: String,
    pub value: Value,
    pub teardown: Option<Teardown>,
}

impl Instance {
    /// Runs the maker's setup and publishes the value under the instance name.
    ///
    /// # Errors
    /// - [`ResourceError::AlreadyStarted`] if the name is live
    /// - [`ResourceError::SetupFailed`] if the factory fails
    pub fn begin(resources: &Resources, maker: &Maker, args: &Args) -> Result<Self> {
        let name = args.name().unwrap_or(maker.id()).to_string();

        if resources.values().contains(&name) {
            return Err(ResourceError::AlreadyStarted { name });
        }

        // no lock is held here: the factory may read other resources
        let (value, teardown) = maker.setup(args, resources)?.into_parts();

        if !resources.values().put_vacant(&name, value.clone()) {
            // the factory itself published this name
            if let Some(teardown) = teardown
                && let Err(error) = teardown()
            {
                warn!(instance = %name, %error, "Teardown of rejected instance failed");
            }
            return Err(ResourceError::AlreadyStarted { name });
        }

        debug!(id = maker.id(), instance = %name, "Started resource");
        Ok(Self {
            name,
            value,
            teardown,
        })
    }
}

/// Runs the teardown for `name`, then removes it from the value registry.
///
/// The name is removed even when the teardown fails or panics; the
/// failure is returned as [`ResourceError::TeardownFailed`] (a panic is
/// resumed after the removal).
pub(crate) fn release(resources: &Resources, name: &str, teardown: Option<Teardown>) -> Result<()> {
    let outcome = match teardown {
        Some(teardown) => panic::catch_unwind(AssertUnwindSafe(teardown)),
        None => Ok(Ok(())),
    };

    resources.values().remove(name);
    debug!(instance = name, "Released resource");

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ResourceError::TeardownFailed {
            name: name.to_string(),
            source,
        }),
        Err(payload) => panic::resume_unwind(payload),
    }
}

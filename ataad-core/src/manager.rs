//! Explicit start/stop of resource instances.
//!
//! For lifetimes that do not follow one lexical scope (set up in one
//! test hook, torn down in another), [`ResourceManager`] starts an
//! instance and keeps its teardown until [`stop`](ResourceManager::stop).
//!
//! There is one manager per resource id and collection: every call to
//! [`Resources::mgr`](crate::resources::Resources::mgr) for the same id
//! returns a handle onto the same tracking table, and handles compare
//! equal.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{instrument, warn};

use crate::args::Args;
use crate::error::{ResourceError, Result};
use crate::instance::{Instance, release};
use crate::maker::{Maker, Teardown};
use crate::resources::Resources;
use crate::values::{Value, downcast};

/// Tracking table shared by every handle of one manager.
#[derive(Default)]
pub(crate) struct ManagerState {
    pending: Mutex<HashMap<String, Option<Teardown>>>,
}

/// Start/stop handle for one resource id.
#[derive(Clone)]
pub struct ResourceManager<'a> {
    resources: &'a Resources,
    maker: Arc<Maker>,
    state: Arc<ManagerState>,
}

impl<'a> ResourceManager<'a> {
    pub(crate) fn new(resources: &'a Resources, maker: Arc<Maker>, state: Arc<ManagerState>) -> Self {
        Self {
            resources,
            maker,
            state,
        }
    }

    /// The resource id.
    pub fn id(&self) -> &str {
        self.maker.id()
    }

    /// Starts an instance and returns its value.
    ///
    /// The instance is registered under `args.name()`, or the id.
    ///
    /// # Errors
    /// - [`ResourceError::AlreadyStarted`] if the name is live
    /// - [`ResourceError::SetupFailed`] if the factory fails
    #[instrument(skip(self, args), fields(id = %self.maker.id()), name = "resource_start")]
    pub fn start(&self, args: Args) -> Result<Value> {
        let Instance {
            name,
            value,
            teardown,
        } = Instance::begin(self.resources, &self.maker, &args)?;

        self.state.pending.lock().insert(name, teardown);
        Ok(value)
    }

    /// Starts an instance and returns its value as a `T`.
    ///
    /// On a type mismatch the instance is stopped again before the error
    /// is returned.
    pub fn start_as<T: Any + Send + Sync>(&self, args: Args) -> Result<Arc<T>> {
        let name = args.name().unwrap_or(self.maker.id()).to_string();
        let value = self.start(args)?;

        downcast(&name, value).inspect_err(|_| {
            if let Err(error) = self.stop(Some(&name)) {
                warn!(instance = %name, %error, "Stopping mistyped instance failed");
            }
        })
    }

    /// Stops the instance registered under `name` (the id if `None` or empty).
    ///
    /// # Errors
    /// - [`ResourceError::NotStarted`] if this manager has no instance
    ///   under that name
    /// - [`ResourceError::TeardownFailed`] if the teardown fails; the
    ///   instance is released regardless
    #[instrument(skip(self), fields(id = %self.maker.id()), name = "resource_stop")]
    pub fn stop(&self, name: Option<&str>) -> Result<()> {
        let name = self.resolve_name(name);

        let teardown = self
            .state
            .pending
            .lock()
            .remove(name)
            .ok_or_else(|| ResourceError::NotStarted {
                name: name.to_string(),
            })?;

        release(self.resources, name, teardown)
    }

    /// Returns `true` if this manager started `name` (the id if `None`).
    pub fn is_running(&self, name: Option<&str>) -> bool {
        self.state.pending.lock().contains_key(self.resolve_name(name))
    }

    /// Names started by this manager and not yet stopped, sorted.
    pub fn running(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.pending.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn resolve_name<'n>(&'n self, name: Option<&'n str>) -> &'n str {
        name.filter(|n| !n.is_empty()).unwrap_or(self.maker.id())
    }
}

impl PartialEq for ResourceManager<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.resources, other.resources) && Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for ResourceManager<'_> {}

impl fmt::Debug for ResourceManager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("id", &self.id())
            .field("running", &self.running())
            .finish()
    }
}

//! Maker registry: stores the two-phase factory for every resource id.
//!
//! A [`Maker`] pairs an id with the namespace it was declared in (its
//! origin) and a factory. The factory performs setup and hands back a
//! [`Setup`]: the produced value plus the teardown to run on release.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::args::Args;
use crate::error::{BoxError, ResourceError, Result};
use crate::namespace::NamespaceSet;
use crate::resources::Resources;
use crate::values::Value;

/// Cleanup callback run once when an instance is released.
pub type Teardown = Box<dyn FnOnce() -> std::result::Result<(), BoxError> + Send>;

/// Type alias for factory functions.
///
/// A factory receives the forwarded [`Args`] and the owning [`Resources`]
/// (to read the values of resources it depends on).
pub type FactoryFn =
    Arc<dyn Fn(&Args, &Resources) -> std::result::Result<Setup<Value>, BoxError> + Send + Sync>;

/// Plain function pointer form of a factory, used by [`MakerEntry`].
pub type FactoryPtr = fn(&Args, &Resources) -> std::result::Result<Setup<Value>, BoxError>;

/// Outcome of a maker's setup phase.
///
/// # Examples
/// ```
/// use ataad_core::maker::Setup;
///
/// let setup = Setup::new(String::from("postgres://localhost"))
///     .with_teardown(|| Ok(()));
/// assert!(setup.has_teardown());
/// ```
pub struct Setup<T> {
    value: T,
    teardown: Option<Teardown>,
}

impl<T> Setup<T> {
    /// Wraps a produced value that needs no cleanup.
    pub fn new(value: T) -> Self {
        Self {
            value,
            teardown: None,
        }
    }

    /// Attaches the teardown phase.
    pub fn with_teardown(
        mut self,
        teardown: impl FnOnce() -> std::result::Result<(), BoxError> + Send + 'static,
    ) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// The produced value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns `true` if a teardown phase is attached.
    pub fn has_teardown(&self) -> bool {
        self.teardown.is_some()
    }

    pub(crate) fn into_parts(self) -> (T, Option<Teardown>) {
        (self.value, self.teardown)
    }
}

impl<T: Any + Send + Sync> Setup<T> {
    /// Erases the value type so the setup can cross the registry.
    #[doc(hidden)]
    pub fn erase(self) -> Setup<Value> {
        Setup {
            value: Arc::new(self.value),
            teardown: self.teardown,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Setup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("value", &self.value)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// A registered two-phase setup/teardown factory.
#[derive(Clone)]
pub struct Maker {
    id: String,
    origin: String,
    factory: FactoryFn,
}

impl Maker {
    /// Creates a maker for `id`, declared in namespace `origin`.
    ///
    /// Prefer the [`maker!`](crate::maker!) macro, which derives both from
    /// the factory function itself.
    pub fn new<T, F>(id: impl Into<String>, origin: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Args, &Resources) -> std::result::Result<Setup<T>, BoxError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            origin: origin.into(),
            factory: Arc::new(move |args: &Args, resources: &Resources| {
                factory(args, resources).map(Setup::erase)
            }),
        }
    }

    /// The resource id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The namespace the maker was declared in.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Moves the maker into another namespace.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Runs the setup phase.
    ///
    /// # Errors
    /// [`ResourceError::SetupFailed`] wrapping whatever the factory returned.
    pub(crate) fn setup(&self, args: &Args, resources: &Resources) -> Result<Setup<Value>> {
        (self.factory)(args, resources).map_err(|source| ResourceError::SetupFailed {
            id: self.id.clone(),
            source,
        })
    }
}

impl fmt::Debug for Maker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Maker")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .finish()
    }
}

/// A maker declared with `#[resource]`, collected at link time.
///
/// Entries are only picked up by
/// [`Resources::register_mod`](crate::resources::Resources::register_mod).
pub struct MakerEntry {
    /// Resource id
    pub id: &'static str,
    /// `module_path!()` of the declaring module
    pub origin: &'static str,
    /// Type-erased factory
    pub factory: FactoryPtr,
}

impl MakerEntry {
    /// Const constructor for use in `inventory::submit!`.
    pub const fn new(id: &'static str, origin: &'static str, factory: FactoryPtr) -> Self {
        Self { id, origin, factory }
    }

    /// All collected entries declared in `module`.
    pub fn in_module(module: &str) -> impl Iterator<Item = &'static MakerEntry> + '_ {
        inventory::iter::<MakerEntry>
            .into_iter()
            .filter(move |entry| entry.origin == module)
    }
}

inventory::collect!(MakerEntry);

impl fmt::Debug for MakerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakerEntry")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .finish()
    }
}

impl From<&'static MakerEntry> for Maker {
    fn from(entry: &'static MakerEntry) -> Self {
        let factory = entry.factory;
        Self {
            id: entry.id.to_string(),
            origin: entry.origin.to_string(),
            factory: Arc::new(move |args: &Args, resources: &Resources| factory(args, resources)),
        }
    }
}

/// Builds a [`Maker`] from a factory function, using the function's name
/// as the id and the calling module as the origin.
///
/// ```rust,ignore
/// fn user(args: &Args, _: &Resources) -> Result<Setup<User>, BoxError> { ... }
///
/// resources.register(maker!(user));
/// ```
#[macro_export]
macro_rules! maker {
    ($factory:ident) => {
        $crate::maker::Maker::new(stringify!($factory), module_path!(), $factory)
    };
}

/// Stores all makers known to a collection.
#[derive(Debug, Default)]
pub(crate) struct MakerRegistry {
    makers: HashMap<String, Arc<Maker>>,
}

impl MakerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a maker, replacing any previous maker with the same id.
    ///
    /// Returns `true` if an existing maker was replaced.
    pub fn register(&mut self, maker: Maker) -> bool {
        debug!(id = %maker.id, origin = %maker.origin, "Registered maker");
        self.makers
            .insert(maker.id.clone(), Arc::new(maker))
            .is_some()
    }

    /// Looks up a maker by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Maker>> {
        self.makers.get(id)
    }

    /// Ids of makers whose origin is active in `namespaces`, sorted.
    pub fn active_ids(&self, namespaces: &NamespaceSet) -> Vec<String> {
        let mut ids: Vec<String> = self
            .makers
            .values()
            .filter(|maker| namespaces.contains(&maker.origin))
            .map(|maker| maker.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered makers.
    pub fn len(&self) -> usize {
        self.makers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(_: &Args, _: &Resources) -> std::result::Result<Setup<i32>, BoxError> {
        Ok(Setup::new(42))
    }

    fn make(id: &str, origin: &str) -> Maker {
        Maker::new(id, origin, number)
    }

    #[test]
    fn register_and_get() {
        let mut reg = MakerRegistry::new();
        assert!(!reg.register(make("number", "tests")));
        assert_eq!(reg.get("number").map(|m| m.origin()), Some("tests"));
        assert!(reg.get("other").is_none());
    }

    #[test]
    fn re_registering_overwrites() {
        let mut reg = MakerRegistry::new();
        reg.register(make("number", "first"));
        assert!(reg.register(make("number", "second")));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("number").map(|m| m.origin()), Some("second"));
    }

    #[test]
    fn active_ids_follow_origin() {
        let mut reg = MakerRegistry::new();
        reg.register(make("b", "mod_a"));
        reg.register(make("a", "mod_a"));
        reg.register(make("c", "mod_b"));

        let mut namespaces = NamespaceSet::new();
        assert!(reg.active_ids(&namespaces).is_empty());

        namespaces.activate("mod_a");
        assert_eq!(reg.active_ids(&namespaces), vec!["a", "b"]);
    }

    #[test]
    fn macro_derives_identity() {
        let maker = crate::maker!(number);
        assert_eq!(maker.id(), "number");
        assert_eq!(maker.origin(), module_path!());
    }

    #[test]
    fn setup_failure_is_wrapped() {
        let maker = Maker::new("broken", "tests", |_: &Args, _: &Resources| {
            Err::<Setup<()>, BoxError>("no database".into())
        });

        let resources = Resources::new();
        match maker.setup(&Args::new(), &resources).unwrap_err() {
            ResourceError::SetupFailed { id, source } => {
                assert_eq!(id, "broken");
                assert_eq!(source.to_string(), "no database");
            }
            other => panic!("Expected SetupFailed, got: {other:?}"),
        }
    }

    #[test]
    fn erased_setup_keeps_value_and_teardown() {
        let (value, teardown) = Setup::new(7u8).with_teardown(|| Ok(())).erase().into_parts();
        assert_eq!(value.downcast_ref::<u8>(), Some(&7));
        assert!(teardown.is_some());
    }
}

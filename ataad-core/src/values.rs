//! Value registry: the live value of every running instance, by name.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{ResourceError, Result};

/// A type-erased resource value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Recovers the concrete type of a value registered under `name`.
pub(crate) fn downcast<T: Any + Send + Sync>(name: &str, value: Value) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| ResourceError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Mapping from instance name to the value it produced.
///
/// Holds exactly the values of live instances. The lock only guards
/// individual map operations; callers serialize per name.
#[derive(Default)]
pub struct ValueRegistry {
    values: RwLock<HashMap<String, Value>>,
}

impl ValueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value registered under `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        trace!(instance = name, "Looking up value");
        self.values.read().get(name).cloned()
    }

    /// Stores `value` under `name`, returning the value it replaced.
    pub fn put(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.write().insert(name.into(), value)
    }

    /// Stores `value` under `name` only if the name is vacant.
    ///
    /// Returns `false` (and drops nothing) if the name was taken.
    pub fn put_vacant(&self, name: &str, value: Value) -> bool {
        let mut values = self.values.write();
        if values.contains_key(name) {
            return false;
        }
        values.insert(name.to_string(), value);
        true
    }

    /// Removes and returns the value under `name`.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.values.write().remove(name)
    }

    /// Returns `true` if a value is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered values.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl std::fmt::Debug for ValueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<T: Any + Send + Sync>(v: T) -> Value {
        Arc::new(v)
    }

    #[test]
    fn put_get_remove() {
        let reg = ValueRegistry::new();
        assert!(reg.get("user").is_none());

        assert!(reg.put("user", value("John Doe")).is_none());
        let got = reg.get("user").unwrap();
        assert_eq!(got.downcast_ref::<&str>(), Some(&"John Doe"));

        assert!(reg.remove("user").is_some());
        assert!(reg.remove("user").is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn put_replaces() {
        let reg = ValueRegistry::new();
        reg.put("n", value(1u8));
        let old = reg.put("n", value(2u8)).unwrap();
        assert_eq!(old.downcast_ref::<u8>(), Some(&1));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn put_vacant_refuses_taken_name() {
        let reg = ValueRegistry::new();
        assert!(reg.put_vacant("n", value(1u8)));
        assert!(!reg.put_vacant("n", value(2u8)));
        assert_eq!(reg.get("n").unwrap().downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn names_sorted() {
        let reg = ValueRegistry::new();
        reg.put("mary", value(()));
        reg.put("john", value(()));
        assert_eq!(reg.names(), vec!["john", "mary"]);
        assert!(reg.contains("mary"));
    }
}

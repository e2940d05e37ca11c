//! Namespace activation bookkeeping.
//!
//! A namespace is an opaque identifier, usually a `module_path!()`. Makers
//! whose origin is in the active set are reachable through the ctx/mgr
//! accessors.

use std::collections::BTreeSet;

/// The set of currently active namespaces.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSet {
    active: BTreeSet<String>,
}

impl NamespaceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `namespace` active. Returns `false` if it already was.
    pub fn activate(&mut self, namespace: impl Into<String>) -> bool {
        self.active.insert(namespace.into())
    }

    /// Marks `namespace` inactive. Returns `false` if it was not active.
    pub fn deactivate(&mut self, namespace: &str) -> bool {
        self.active.remove(namespace)
    }

    /// Returns `true` if `namespace` is active.
    pub fn contains(&self, namespace: &str) -> bool {
        self.active.contains(namespace)
    }

    /// Active namespaces in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }
}

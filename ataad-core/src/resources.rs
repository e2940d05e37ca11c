//! # The resource collection
//!
//! [`Resources`] owns everything one set of fixtures needs: the makers,
//! the active namespaces, the live values and the per-id managers.
//!
//! # Architecture
//! ```text
//! register(maker) ──> MakerRegistry ──┐
//! activate(ns)    ──> NamespaceSet  ──┤
//!                                     ├── ctx(id) ──> ResourceContext ──enter()──> ScopedResource
//!                                     └── mgr(id) ──> ResourceManager ──start()/stop()
//!                                                            │
//!                                                            ▼
//!                                                      ValueRegistry <── value(name) / get::<T>(name)
//! ```
//!
//! # Examples
//! ```rust
//! use ataad_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, PartialEq)]
//! struct User {
//!     name: String,
//! }
//!
//! fn user(args: &Args, _: &Resources) -> Result<Setup<User>, BoxError> {
//!     Ok(Setup::new(User { name: args.text_or("name", "John Doe")? }))
//! }
//!
//! let resources = Resources::builder()
//!     .maker(ataad_core::maker!(user))
//!     .activate(module_path!())
//!     .build();
//!
//! {
//!     let _user = resources.ctx("user")?.enter()?;
//!     let user: Arc<User> = resources.get("user")?;
//!     assert_eq!(user.name, "John Doe");
//! }
//! assert!(resources.value("user").is_err());
//! # Ok::<(), ResourceError>(())
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ataad_support::rendering::suggest_similar;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::context::ResourceContext;
use crate::error::{ResourceError, Result, UnknownMemberError, UnknownResourceError};
use crate::maker::{Maker, MakerEntry, MakerRegistry};
use crate::manager::{ManagerState, ResourceManager};
use crate::namespace::NamespaceSet;
use crate::provider::Provider;
use crate::values::{Value, ValueRegistry, downcast};

/// Suffix selecting the scoped-acquisition accessor of an id.
pub const CTX_SUFFIX: &str = "_ctx";

/// Suffix selecting the manager accessor of an id.
pub const MGR_SUFFIX: &str = "_mgr";

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorKind {
    Context,
    Manager,
}

// ═══════════════════════════════════════════
// ResourcesBuilder
// ═══════════════════════════════════════════

/// Builds a [`Resources`] collection up front.
///
/// # Examples
/// ```rust,ignore
/// let resources = Resources::builder()
///     .maker(maker!(user))
///     .provider(&AccountFixtures)
///     .module(module_path!())
///     .activate("shared::fixtures")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ResourcesBuilder {
    makers: Vec<Maker>,
    modules: Vec<String>,
    namespaces: Vec<String>,
}

impl ResourcesBuilder {
    /// Register a maker.
    pub fn maker(mut self, maker: Maker) -> Self {
        self.makers.push(maker);
        self
    }

    /// Register every maker of a [`Provider`] and activate its namespace.
    pub fn provider(mut self, provider: &dyn Provider) -> Self {
        let namespace = provider.namespace().to_string();
        self.makers.extend(
            provider
                .makers()
                .into_iter()
                .map(|maker| maker.with_origin(namespace.clone())),
        );
        self.namespaces.push(namespace);
        self
    }

    /// Register the `#[resource]` makers of a module and activate it.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Activate a namespace.
    pub fn activate(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Build the collection.
    pub fn build(self) -> Resources {
        let resources = Resources::new();
        for maker in self.makers {
            resources.register(maker);
        }
        for module in &self.modules {
            resources.register_mod(module);
        }
        for namespace in self.namespaces {
            resources.activate(namespace);
        }
        debug!(?resources, "Built resource collection");
        resources
    }
}

// ═══════════════════════════════════════════
// Member
// ═══════════════════════════════════════════

/// Result of a dynamic lookup through [`Resources::member`].
#[derive(Debug)]
pub enum Member<'a> {
    /// `<id>_ctx`
    Context(ResourceContext<'a>),
    /// `<id>_mgr`
    Manager(ResourceManager<'a>),
    /// Any other name: the live value.
    Value(Value),
}

impl<'a> Member<'a> {
    /// The scoped-acquisition accessor, if this is one.
    pub fn into_context(self) -> Option<ResourceContext<'a>> {
        match self {
            Member::Context(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// The manager, if this is one.
    pub fn into_manager(self) -> Option<ResourceManager<'a>> {
        match self {
            Member::Manager(mgr) => Some(mgr),
            _ => None,
        }
    }

    /// The live value, if this is one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Member::Value(value) => Some(value),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════

/// A collection of makers and the instances they produced.
///
/// Each collection is independent; tests can build as many as they like.
/// All methods take `&self` so factories can read the collection while
/// it is being populated.
#[derive(Default)]
pub struct Resources {
    makers: RwLock<MakerRegistry>,
    namespaces: RwLock<NamespaceSet>,
    accessors: RwLock<HashMap<String, (AccessorKind, String)>>,
    values: ValueRegistry,
    managers: Mutex<HashMap<String, Arc<ManagerState>>>,
}

impl Resources {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder.
    pub fn builder() -> ResourcesBuilder {
        ResourcesBuilder::default()
    }

    // ── Registration ──

    /// Register a maker under its id, replacing any previous one.
    pub fn register(&self, maker: Maker) {
        let id = maker.id().to_string();
        self.makers.write().register(maker);

        let mut accessors = self.accessors.write();
        accessors.insert(format!("{id}{CTX_SUFFIX}"), (AccessorKind::Context, id.clone()));
        accessors.insert(format!("{id}{MGR_SUFFIX}"), (AccessorKind::Manager, id));
    }

    /// Register every `#[resource]` maker declared in `module` and
    /// activate the module.
    ///
    /// Returns the number of makers registered.
    pub fn register_mod(&self, module: &str) -> usize {
        let mut count = 0;
        for entry in MakerEntry::in_module(module) {
            self.register(Maker::from(entry));
            count += 1;
        }
        self.activate(module);
        count
    }

    /// Deactivate a module activated by [`register_mod`](Self::register_mod).
    ///
    /// Its makers stay registered.
    pub fn unregister_mod(&self, module: &str) -> bool {
        self.deactivate(module)
    }

    /// Register every maker of a [`Provider`] and activate its namespace.
    pub fn add_provider(&self, provider: &dyn Provider) {
        let namespace = provider.namespace();
        for maker in provider.makers() {
            self.register(maker.with_origin(namespace));
        }
        self.activate(namespace);
    }

    // ── Namespaces ──

    /// Mark a namespace active. Returns `false` if it already was.
    pub fn activate(&self, namespace: impl Into<String>) -> bool {
        let namespace = namespace.into();
        debug!(%namespace, "Activating namespace");
        self.namespaces.write().activate(namespace)
    }

    /// Mark a namespace inactive. Returns `false` if it was not active.
    ///
    /// Live instances of its makers are not affected.
    pub fn deactivate(&self, namespace: &str) -> bool {
        debug!(%namespace, "Deactivating namespace");
        self.namespaces.write().deactivate(namespace)
    }

    /// Ids of makers whose namespace is active, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let makers = self.makers.read();
        let namespaces = self.namespaces.read();
        makers.active_ids(&namespaces)
    }

    /// Returns `true` if `id` is registered and its namespace is active.
    pub fn is_active(&self, id: &str) -> bool {
        self.active_maker(id).is_some()
    }

    // ── Accessors ──

    /// Scoped-acquisition accessor for `id`.
    ///
    /// # Errors
    /// [`ResourceError::UnknownResource`] if `id` is not active.
    pub fn ctx(&self, id: &str) -> Result<ResourceContext<'_>> {
        let maker = self.active_maker(id).ok_or_else(|| self.unknown_resource(id))?;
        Ok(ResourceContext::new(self, maker))
    }

    /// The manager for `id`. Every call returns the same manager.
    ///
    /// # Errors
    /// [`ResourceError::UnknownResource`] if `id` is not active.
    pub fn mgr(&self, id: &str) -> Result<ResourceManager<'_>> {
        let maker = self.active_maker(id).ok_or_else(|| self.unknown_resource(id))?;
        let state = self
            .managers
            .lock()
            .entry(id.to_string())
            .or_default()
            .clone();
        Ok(ResourceManager::new(self, maker, state))
    }

    /// Dynamic lookup by name.
    ///
    /// `<id>_ctx` resolves to [`ctx`](Self::ctx), `<id>_mgr` to
    /// [`mgr`](Self::mgr), anything else to the live value.
    ///
    /// # Errors
    /// - [`ResourceError::UnknownResource`] for an accessor of an inactive id
    /// - [`ResourceError::UnknownMember`] if no value is live under `name`
    pub fn member(&self, name: &str) -> Result<Member<'_>> {
        let accessor = self.accessors.read().get(name).cloned();

        match accessor {
            Some((AccessorKind::Context, id)) => self.ctx(&id).map(Member::Context),
            Some((AccessorKind::Manager, id)) => self.mgr(&id).map(Member::Manager),
            None => {
                let unregistered = name
                    .strip_suffix(CTX_SUFFIX)
                    .or_else(|| name.strip_suffix(MGR_SUFFIX));
                if let Some(id) = unregistered {
                    return Err(self.unknown_resource(id));
                }
                self.value(name).map(Member::Value)
            }
        }
    }

    /// Key-style lookup: like [`member`](Self::member), but a missing
    /// value is `Ok(None)` rather than an error.
    ///
    /// # Errors
    /// [`ResourceError::UnknownResource`] for an accessor of an inactive id.
    pub fn get_item(&self, name: &str) -> Result<Option<Member<'_>>> {
        match self.member(name) {
            Ok(member) => Ok(Some(member)),
            Err(ResourceError::UnknownMember(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if [`member`](Self::member) would succeed.
    pub fn contains(&self, name: &str) -> bool {
        self.member(name).is_ok()
    }

    // ── Values ──

    /// The live value registered under `name`.
    ///
    /// # Errors
    /// [`ResourceError::UnknownMember`] if no instance is live under `name`.
    pub fn value(&self, name: &str) -> Result<Value> {
        trace!(instance = %name, "Resolving value");
        self.values.get(name).ok_or_else(|| {
            ResourceError::UnknownMember(UnknownMemberError {
                name: name.to_string(),
                suggestions: suggest_similar(name, &self.values.names(), MAX_SUGGESTIONS),
            })
        })
    }

    /// The live value under `name`, as a `T`.
    ///
    /// ```rust,ignore
    /// let user: Arc<User> = resources.get("user")?;
    /// ```
    ///
    /// # Errors
    /// - [`ResourceError::UnknownMember`] if no instance is live under `name`
    /// - [`ResourceError::TypeMismatch`] if the value is not a `T`
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast(name, self.value(name)?)
    }

    /// Names of live instances, sorted.
    pub fn members(&self) -> Vec<String> {
        self.values.names()
    }

    /// Accessor names (`<id>_ctx`, `<id>_mgr`) of active ids.
    pub fn methods(&self) -> Vec<String> {
        let ids = self.active_ids();
        let ctx = ids.iter().map(|id| format!("{id}{CTX_SUFFIX}"));
        let mgr = ids.iter().map(|id| format!("{id}{MGR_SUFFIX}"));
        ctx.chain(mgr).collect()
    }

    /// The value registry backing this collection.
    pub fn values(&self) -> &ValueRegistry {
        &self.values
    }

    // ── Internal ──

    fn active_maker(&self, id: &str) -> Option<Arc<Maker>> {
        let makers = self.makers.read();
        let namespaces = self.namespaces.read();
        makers
            .get(id)
            .filter(|maker| namespaces.contains(maker.origin()))
            .cloned()
    }

    fn unknown_resource(&self, id: &str) -> ResourceError {
        let inactive_origin = self
            .makers
            .read()
            .get(id)
            .map(|maker| maker.origin().to_string());

        ResourceError::UnknownResource(UnknownResourceError {
            id: id.to_string(),
            inactive_origin,
            suggestions: suggest_similar(id, &self.active_ids(), MAX_SUGGESTIONS),
        })
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("makers", &self.makers.read().len())
            .field("namespaces", &self.namespaces.read().iter().collect::<Vec<_>>())
            .field("live", &self.values.names())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Member, Resources, ResourcesBuilder};
    pub use crate::args::Args;
    pub use crate::context::{ResourceContext, ScopedResource};
    pub use crate::error::{BoxError, ResourceError, Result};
    pub use crate::maker::{Maker, Setup};
    pub use crate::manager::ResourceManager;
    pub use crate::provider::Provider;
    pub use crate::values::Value;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

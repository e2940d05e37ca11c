//! Scoped acquisition of a resource.
//!
//! A [`ResourceContext`] is obtained from
//! [`Resources::ctx`](crate::resources::Resources::ctx) and can be used
//! three ways:
//!
//! - [`enter`](ResourceContext::enter) returns a [`ScopedResource`] guard;
//!   the instance is released when the guard is closed or dropped.
//! - [`scope`](ResourceContext::scope) runs a closure inside the bracket.
//! - [`wrap`](ResourceContext::wrap) decorates a function so that every
//!   call runs inside its own bracket and receives the value first.
//!
//! # Examples
//! ```
//! use ataad_core::prelude::*;
//! use std::sync::Arc;
//!
//! fn greeting(args: &Args, _: &Resources) -> Result<Setup<String>, BoxError> {
//!     Ok(Setup::new(args.text_or("text", "hello")?))
//! }
//!
//! let resources = Resources::new();
//! resources.register(ataad_core::maker!(greeting));
//! resources.activate(module_path!());
//!
//! let shout = resources
//!     .ctx("greeting")?
//!     .wrap(|greeting: Arc<String>, suffix: &'static str| format!("{greeting}{suffix}"));
//!
//! assert_eq!(shout("!")?, "hello!");
//! assert!(!resources.contains("greeting"));
//! # Ok::<(), ResourceError>(())
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::args::Args;
use crate::error::{ResourceError, Result};
use crate::instance::{Instance, release};
use crate::maker::{Maker, Teardown};
use crate::resources::Resources;
use crate::values::{Value, downcast};

/// Scoped acquisition bracket for one resource id.
///
/// Carries the arguments forwarded to the factory and the instance name
/// (the id unless overridden). Cloning is cheap.
#[derive(Clone)]
pub struct ResourceContext<'a> {
    resources: &'a Resources,
    maker: Arc<Maker>,
    args: Args,
}

impl<'a> ResourceContext<'a> {
    pub(crate) fn new(resources: &'a Resources, maker: Arc<Maker>) -> Self {
        Self {
            resources,
            maker,
            args: Args::new(),
        }
    }

    /// The resource id.
    pub fn id(&self) -> &str {
        self.maker.id()
    }

    /// The name the instance will be registered under.
    pub fn name(&self) -> &str {
        self.args.name().unwrap_or(self.maker.id())
    }

    /// Appends a positional argument for the factory.
    pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.args = self.args.arg(value);
        self
    }

    /// Sets a keyword argument for the factory.
    pub fn kwarg<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.args = self.args.kwarg(key, value);
        self
    }

    /// Overrides the instance name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.args = self.args.named(name);
        self
    }

    /// Replaces all forwarded arguments.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Sets the resource up and registers its value.
    ///
    /// # Errors
    /// - [`ResourceError::AlreadyStarted`] if the name is live
    /// - [`ResourceError::SetupFailed`] if the factory fails
    pub fn enter(&self) -> Result<ScopedResource<'a>> {
        let Instance {
            name,
            value,
            teardown,
        } = Instance::begin(self.resources, &self.maker, &self.args)?;

        Ok(ScopedResource {
            resources: self.resources,
            name,
            value,
            teardown,
            live: true,
        })
    }

    /// Runs `body` with the value, releasing the instance afterwards.
    ///
    /// The instance is also released if `body` panics.
    pub fn scope<T, R>(&self, body: impl FnOnce(Arc<T>) -> R) -> Result<R>
    where
        T: Any + Send + Sync,
    {
        let guard = self.enter()?;
        let value = guard.downcast::<T>()?;
        let ret = body(value);
        guard.close()?;
        Ok(ret)
    }

    /// Like [`scope`](Self::scope) for a fallible body.
    ///
    /// If both the body and the teardown fail, the body's error is
    /// returned and the teardown failure is logged.
    pub fn try_scope<T, R, E>(&self, body: impl FnOnce(Arc<T>) -> Result<R, E>) -> Result<R, E>
    where
        T: Any + Send + Sync,
        E: From<ResourceError>,
    {
        let guard = self.enter()?;
        let value = guard.downcast::<T>()?;
        match body(value) {
            Ok(ret) => {
                guard.close()?;
                Ok(ret)
            }
            // dropping the guard releases and logs
            Err(err) => Err(err),
        }
    }

    /// Decorates `func` so each call runs in its own bracket.
    ///
    /// The returned callable takes the remaining argument `A` (use a tuple
    /// for several) and passes the produced value in front of it.
    pub fn wrap<T, A, R, F>(self, func: F) -> impl Fn(A) -> Result<R>
    where
        T: Any + Send + Sync,
        F: Fn(Arc<T>, A) -> R,
    {
        move |rest: A| self.scope(|value: Arc<T>| func(value, rest))
    }

    /// Decorates a fallible `func`; errors follow [`try_scope`](Self::try_scope).
    pub fn try_wrap<T, A, R, E, F>(self, func: F) -> impl Fn(A) -> Result<R, E>
    where
        T: Any + Send + Sync,
        E: From<ResourceError>,
        F: Fn(Arc<T>, A) -> Result<R, E>,
    {
        move |rest: A| self.try_scope(|value: Arc<T>| func(value, rest))
    }
}

impl fmt::Debug for ResourceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("args", &self.args)
            .finish()
    }
}

/// Guard for an instance entered through a [`ResourceContext`].
///
/// Dropping the guard releases the instance; a teardown failure is then
/// logged. Use [`close`](Self::close) to observe it instead.
#[must_use = "the resource is released as soon as the guard is dropped"]
pub struct ScopedResource<'a> {
    resources: &'a Resources,
    name: String,
    value: Value,
    teardown: Option<Teardown>,
    live: bool,
}

impl ScopedResource<'_> {
    /// The name the value is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The produced value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The produced value as a `T`.
    ///
    /// # Errors
    /// [`ResourceError::TypeMismatch`] if the value is not a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        downcast(&self.name, self.value.clone())
    }

    /// Releases the instance now.
    ///
    /// # Errors
    /// [`ResourceError::TeardownFailed`]; the name is released regardless.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if !self.live {
            return Ok(());
        }
        self.live = false;
        release(self.resources, &self.name, self.teardown.take())
    }
}

impl Drop for ScopedResource<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!(instance = %self.name, error = %err, "Resource released with a failed teardown");
        }
    }
}

impl fmt::Debug for ScopedResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedResource")
            .field("name", &self.name)
            .field("live", &self.live)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::maker::Setup;
    use parking_lot::Mutex;
    use std::panic::{self, AssertUnwindSafe};

    #[derive(Debug, PartialEq)]
    struct User {
        name: String,
    }

    fn user(args: &Args, _: &Resources) -> Result<Setup<User>, BoxError> {
        Ok(Setup::new(User {
            name: args.text_or("name", "John Doe")?,
        }))
    }

    fn fixtures() -> Resources {
        let resources = Resources::new();
        resources.register(crate::maker!(user));
        resources.activate(module_path!());
        resources
    }

    /// Resources whose `probe` maker records setup and teardown events.
    fn probed(log: Arc<Mutex<Vec<String>>>, fail_teardown: bool) -> Resources {
        let resources = Resources::new();
        resources.register(Maker::new("probe", "tests", move |args: &Args, _: &Resources| {
            let name = args.name().unwrap_or("probe").to_string();
            log.lock().push(format!("setup {name}"));
            let log = log.clone();
            Ok(Setup::new(name.clone()).with_teardown(move || {
                log.lock().push(format!("teardown {name}"));
                if fail_teardown {
                    return Err("teardown exploded".into());
                }
                Ok(())
            }))
        }));
        resources.activate("tests");
        resources
    }

    #[test]
    fn value_visible_only_inside_scope() {
        let resources = fixtures();
        assert!(!resources.contains("user"));

        let guard = resources.ctx("user").unwrap().enter().unwrap();
        let user: Arc<User> = resources.get("user").unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(guard.name(), "user");

        guard.close().unwrap();
        assert!(resources.value("user").unwrap_err().is_unknown_member());
    }

    #[test]
    fn arguments_are_forwarded() {
        let resources = fixtures();
        let ctx = resources.ctx("user").unwrap().kwarg("name", "Mary Moe");

        let name = ctx.scope(|user: Arc<User>| user.name.clone()).unwrap();
        assert_eq!(name, "Mary Moe");
        assert!(!resources.contains("user"));
    }

    #[test]
    fn two_names_side_by_side() {
        let resources = fixtures();
        let ctx = resources.ctx("user").unwrap();

        let mary = ctx.clone().kwarg("name", "Mary Moe").named("mary").enter().unwrap();
        let john = ctx.kwarg("name", "John Doe").kwarg("_name", "john").enter().unwrap();

        assert_eq!(resources.get::<User>("mary").unwrap().name, "Mary Moe");
        assert_eq!(resources.get::<User>("john").unwrap().name, "John Doe");
        assert!(!resources.contains("user"));

        drop(john);
        drop(mary);
        assert!(resources.members().is_empty());
    }

    #[test]
    fn nested_same_name_is_rejected() {
        let resources = fixtures();
        let ctx = resources.ctx("user").unwrap();

        let outer = ctx.enter().unwrap();
        assert!(ctx.enter().unwrap_err().is_already_started());
        assert!(resources.contains("user"));

        drop(outer);
        assert!(!resources.contains("user"));
    }

    #[test]
    fn teardown_runs_on_drop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resources = probed(log.clone(), false);

        {
            let _guard = resources.ctx("probe").unwrap().enter().unwrap();
            assert_eq!(*log.lock(), vec!["setup probe"]);
        }

        assert_eq!(*log.lock(), vec!["setup probe", "teardown probe"]);
        assert!(!resources.contains("probe"));
    }

    #[test]
    fn teardown_runs_on_panic() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resources = probed(log.clone(), false);
        let ctx = resources.ctx("probe").unwrap();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.scope::<String, ()>(|_| panic!("test body failed"))
        }));

        assert!(outcome.is_err());
        assert_eq!(log.lock().last().map(String::as_str), Some("teardown probe"));
        assert!(!resources.contains("probe"));
    }

    #[test]
    fn failed_teardown_still_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resources = probed(log, true);

        let guard = resources.ctx("probe").unwrap().enter().unwrap();
        match guard.close().unwrap_err() {
            ResourceError::TeardownFailed { name, source } => {
                assert_eq!(name, "probe");
                assert_eq!(source.to_string(), "teardown exploded");
            }
            other => panic!("Expected TeardownFailed, got: {other:?}"),
        }
        assert!(!resources.contains("probe"));
    }

    #[test]
    fn body_error_wins_over_teardown_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resources = probed(log.clone(), true);

        let err = resources
            .ctx("probe")
            .unwrap()
            .try_scope(|_: Arc<String>| Err::<(), _>(ResourceError::NotStarted { name: "body".into() }))
            .unwrap_err();

        assert!(err.is_not_started());
        assert_eq!(log.lock().last().map(String::as_str), Some("teardown probe"));
        assert!(!resources.contains("probe"));
    }

    #[test]
    fn decorator_injects_value_each_call() {
        let resources = fixtures();
        let seen = Mutex::new(Vec::new());

        let greet = resources
            .ctx("user")
            .unwrap()
            .kwarg("name", "Mary Moe")
            .named("mary")
            .wrap(|user: Arc<User>, greeting: &str| {
                assert!(resources.contains("mary"));
                seen.lock().push(user.name.clone());
                format!("{greeting}, {}", user.name)
            });

        assert!(!resources.contains("mary"));
        assert_eq!(greet("Hello").unwrap(), "Hello, Mary Moe");
        assert_eq!(greet("Bye").unwrap(), "Bye, Mary Moe");
        assert!(!resources.contains("mary"));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn decorated_error_still_tears_down() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resources = probed(log.clone(), false);

        let failing = resources.ctx("probe").unwrap().try_wrap(|_: Arc<String>, code: i32| {
            if code > 0 {
                return Err(ResourceError::NotStarted { name: code.to_string() });
            }
            Ok(code)
        });

        assert_eq!(failing(0).unwrap(), 0);
        assert!(failing(1).is_err());
        assert_eq!(
            *log.lock(),
            vec!["setup probe", "teardown probe", "setup probe", "teardown probe"]
        );
        assert!(!resources.contains("probe"));
    }

    #[test]
    fn wrong_value_type_releases_instance() {
        let resources = fixtures();
        let err = resources
            .ctx("user")
            .unwrap()
            .scope(|_: Arc<String>| ())
            .unwrap_err();

        assert!(matches!(err, ResourceError::TypeMismatch { .. }));
        assert!(!resources.contains("user"));
    }
}

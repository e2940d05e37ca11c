//! Arguments forwarded to a maker's factory.
//!
//! [`Args`] carries positional and keyword values, type-erased so that
//! makers with different parameter lists share one registry. Factories
//! read them back with the typed accessors.
//!
//! The keyword [`NAME_KEYWORD`] is reserved: it is never forwarded and
//! instead overrides the name the instance is registered under.

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ResourceError, Result};

/// Reserved keyword holding the instance name override.
pub const NAME_KEYWORD: &str = "_name";

type ArgValue = Arc<dyn Any + Send + Sync>;

/// Positional and keyword arguments for a factory.
///
/// # Examples
/// ```
/// use ataad_core::args::Args;
///
/// let args = Args::new().arg(3u32).kwarg("name", "Mary Moe").named("mary");
///
/// assert_eq!(args.positional::<u32>(0).unwrap(), Some(&3));
/// assert_eq!(args.text_or("name", "John Doe").unwrap(), "Mary Moe");
/// assert_eq!(args.name(), Some("mary"));
/// ```
#[derive(Clone, Default)]
pub struct Args {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
    name: Option<String>,
}

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.positional.push(Arc::new(value));
        self
    }

    /// Sets a keyword argument.
    ///
    /// A string under [`NAME_KEYWORD`] is taken as the instance name
    /// instead of being forwarded.
    pub fn kwarg<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        let key = key.into();
        let value: ArgValue = Arc::new(value);

        if key == NAME_KEYWORD
            && let Some(name) = as_text(&*value)
        {
            self.name = Some(name.to_string());
            return self;
        }

        self.keyword.insert(key, value);
        self
    }

    /// Sets the instance name override.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The instance name override, if any.
    ///
    /// An empty override counts as none, so the instance keeps its id.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the positional argument at `index`.
    ///
    /// # Errors
    /// [`ResourceError::ArgumentType`] if it is present but not a `T`.
    pub fn positional<T: Any>(&self, index: usize) -> Result<Option<&T>> {
        match self.positional.get(index) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| argument_type::<T>(format!("#{index}"))),
        }
    }

    /// Returns the keyword argument `key`.
    ///
    /// # Errors
    /// [`ResourceError::ArgumentType`] if it is present but not a `T`.
    pub fn keyword<T: Any>(&self, key: &str) -> Result<Option<&T>> {
        match self.keyword.get(key) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| argument_type::<T>(format!("{key:?}"))),
        }
    }

    /// Returns the keyword argument `key`, or `default` when absent.
    pub fn keyword_or<T: Any + Clone>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.keyword::<T>(key)?.cloned().unwrap_or(default))
    }

    /// Returns a textual keyword argument, or `default` when absent.
    ///
    /// Accepts both `String` and `&'static str` values.
    pub fn text_or(&self, key: &str, default: &str) -> Result<String> {
        match self.keyword.get(key) {
            None => Ok(default.to_string()),
            Some(value) => as_text(&**value)
                .map(str::to_string)
                .ok_or_else(|| argument_type::<String>(format!("{key:?}"))),
        }
    }

    /// Number of positional and keyword arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Returns `true` if there are no positional or keyword arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Keyword argument names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keyword.keys().map(String::as_str)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("positional", &self.positional.len())
            .field("keyword", &self.keyword.keys().collect::<Vec<_>>())
            .field("name", &self.name)
            .finish()
    }
}

fn as_text(value: &(dyn Any + Send + Sync)) -> Option<&str> {
    if let Some(s) = value.downcast_ref::<String>() {
        return Some(s.as_str());
    }
    value.downcast_ref::<&'static str>().copied()
}

fn argument_type<T>(argument: String) -> ResourceError {
    ResourceError::ArgumentType {
        argument,
        expected: type_name::<T>(),
    }
}

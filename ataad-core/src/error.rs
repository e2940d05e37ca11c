//! Error types for Ataad operations.
//!
//! Every error is raised synchronously at the point of the operation
//! and carries enough context to tell which resource, instance name or
//! argument was involved.

use std::fmt;

use ataad_support::rendering::render_names;

/// Boxed error returned by factories and teardown callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Ataad operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// An accessor, context or manager was requested for an id that is
    /// not registered or whose namespace is not active.
    #[error("{}", .0)]
    UnknownResource(UnknownResourceError),

    /// Start or scoped entry for a name that already has a live instance.
    #[error("Resource {name:?} has already been started")]
    AlreadyStarted { name: String },

    /// Stop for a name with no instance tracked by the manager.
    #[error("Resource {name:?} has not been started")]
    NotStarted { name: String },

    /// Plain lookup for a name with no value currently registered.
    #[error("{}", .0)]
    UnknownMember(UnknownMemberError),

    /// The maker's factory returned an error.
    #[error("Failed to set up resource {id:?}: {source}")]
    SetupFailed {
        id: String,
        #[source]
        source: BoxError,
    },

    /// The teardown callback returned an error. The instance has been
    /// released regardless.
    #[error("Failed to tear down {name:?}: {source}")]
    TeardownFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A value was read back as a type it does not have.
    #[error("Type mismatch for {name:?}: expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// A factory argument was read back as a type it does not have.
    #[error("Argument {argument} has the wrong type: expected {expected}")]
    ArgumentType {
        argument: String,
        expected: &'static str,
    },
}

impl ResourceError {
    /// Returns `true` for [`ResourceError::UnknownResource`].
    pub fn is_unknown_resource(&self) -> bool {
        matches!(self, ResourceError::UnknownResource(_))
    }

    /// Returns `true` for [`ResourceError::UnknownMember`].
    pub fn is_unknown_member(&self) -> bool {
        matches!(self, ResourceError::UnknownMember(_))
    }

    /// Returns `true` for [`ResourceError::AlreadyStarted`].
    pub fn is_already_started(&self) -> bool {
        matches!(self, ResourceError::AlreadyStarted { .. })
    }

    /// Returns `true` for [`ResourceError::NotStarted`].
    pub fn is_not_started(&self) -> bool {
        matches!(self, ResourceError::NotStarted { .. })
    }
}

/// Error when a resource id cannot be reached through an accessor.
#[derive(Debug)]
pub struct UnknownResourceError {
    /// The id that was requested
    pub id: String,
    /// Origin of the maker, if one is registered under this id
    pub inactive_origin: Option<String>,
    /// Active ids with a similar spelling
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Don't know how to create resource {:?}", self.id)?;

        match self.inactive_origin {
            Some(ref origin) => write!(
                f,
                "\n  Hint: it is registered by {origin:?}, which is not active. Call .activate({origin:?})"
            )?,
            None if !self.suggestions.is_empty() => {
                write!(f, "\n  Did you mean: {}", render_names(&self.suggestions))?;
            }
            None => write!(f, "\n  Hint: did you forget to register it?")?,
        }
        Ok(())
    }
}

/// Error when no live instance is registered under a name.
#[derive(Debug)]
pub struct UnknownMemberError {
    /// The name that was looked up
    pub name: String,
    /// Live names with a similar spelling
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnknownMemberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No live resource named {:?}", self.name)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean: {}", render_names(&self.suggestions))?;
        }
        Ok(())
    }
}

/// Convenient Result type for Ataad operations.
///
/// The error defaults to [`ResourceError`]; factories usually spell
/// `Result<Setup<T>, BoxError>`.
pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

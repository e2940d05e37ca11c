//! Logging bootstrap built on `tracing-subscriber`.
//!
//! The filter is read from the `ATAAD_LOG` environment variable using the
//! usual `EnvFilter` directive syntax, e.g. `ATAAD_LOG=ataad_core=trace`.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "ATAAD_LOG";

/// Directives used when [`LOG_ENV`] is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "ataad=info,ataad_core=info";

/// Builds the filter from [`LOG_ENV`], falling back to [`DEFAULT_DIRECTIVES`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging() -> bool {
    let filter = env_filter();
    let directives = filter.to_string();

    let installed = tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok();
    if installed {
        debug!(%directives, "Logging initialised");
    }
    installed
}

/// Installs a fmt subscriber that writes through the libtest capture.
///
/// Safe to call from every test; only the first call has any effect.
pub fn init_test_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok();
    if installed {
        debug!("Test logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_test_init_is_harmless() {
        init_test_logging();
        init_test_logging();
        // a subscriber is already installed now
        assert!(!init_logging());
    }

    #[test]
    fn test_init_installs_global_dispatcher() {
        init_test_logging();
        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn default_directives_parse() {
        let filter = EnvFilter::new(DEFAULT_DIRECTIVES);
        assert!(filter.to_string().contains("ataad_core=info"));
    }
}

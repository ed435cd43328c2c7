//! Diagnostics subscriber initialization

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Crates whose diagnostics the default filters enable
const TARGETS: &[&str] = &["marlog_core", "marlog_store", "marlog_engine", "marlog_cli"];

/// Diagnostics profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, debug and above
    Development,
    /// JSON output, warnings and above
    Production,
    /// Bare registry; use `init_test_capture` to record events
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Default filter directive for a level, e.g. `marlog_core=warn,marlog_store=warn,...`
pub fn default_directive(level: &str) -> String {
    TARGETS
        .iter()
        .map(|t| format!("{}={}", t, level))
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

/// Install the diagnostics subscriber
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default filter. If another global subscriber is already installed the
/// call is a no-op.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(env_filter("debug"))
                .with_writer(std::io::stderr)
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter("warn"))
                .with_writer(std::io::stderr)
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Production);
    }

    #[test]
    fn test_default_directive_names_every_crate() {
        let directive = default_directive("warn");
        assert!(directive.contains("marlog_core=warn"));
        assert!(directive.contains("marlog_store=warn"));
        assert_eq!(directive.matches('=').count(), TARGETS.len());
    }
}

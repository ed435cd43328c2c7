//! Environment-aware logger quick start

use marlog_core::{Logger, Settings};
use marlog_store::{StorageFactory, StorageOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable consulted when no environment is given
pub const APP_ENV_VAR: &str = "APP_ENV";

/// Environment used when neither the caller nor `APP_ENV` names one
pub const BOOT_DEFAULT_ENV: &str = "dev";

/// Quick-start constructor for a file-backed logger
///
/// # Example
///
/// ```no_run
/// use marlog_core::{ctx, Logger};
/// use marlog_engine::LoggerBoot;
///
/// let logger = Logger::boot("shop", Some("production"), None, "10MB");
/// logger.error("payment_gateway_down", ctx! { "_origin" => "system" });
/// ```
pub trait LoggerBoot: Sized {
    /// Build a logger writing `{path}/{channel}-YYYY-MM-DD.log`
    ///
    /// - `env`: falls back to `APP_ENV`, then `dev`
    /// - `path`: falls back to `./storage/logs`
    /// - `size`: rotation threshold such as `10MB`; invalid → 10 MiB
    ///
    /// Production-like environments keep `error` and above, system
    /// origin only.
    fn boot(channel: &str, env: Option<&str>, path: Option<PathBuf>, size: &str) -> Self;
}

impl LoggerBoot for Logger {
    fn boot(channel: &str, env: Option<&str>, path: Option<PathBuf>, size: &str) -> Self {
        let env = resolve_env(env, std::env::var(APP_ENV_VAR).ok());
        let path = path.unwrap_or_else(default_boot_path);

        let settings = Arc::new(Settings::from_pairs([
            ("app_name", channel.to_string()),
            ("channel", channel.to_string()),
            ("env", env),
            ("log_path", path.to_string_lossy().into_owned()),
            ("max_log_bytes", size.to_string()),
            ("min_production_level", "error".to_string()),
        ]));

        let sink = StorageFactory::make(&StorageOptions::from_settings(&settings));
        Logger::builder(settings).sink(sink).build()
    }
}

fn resolve_env(explicit: Option<&str>, from_var: Option<String>) -> String {
    explicit
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .or_else(|| from_var.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| BOOT_DEFAULT_ENV.to_string())
}

fn default_boot_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("storage")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlog_core::ctx;
    use tempfile::TempDir;

    #[test]
    fn test_env_resolution_order() {
        assert_eq!(resolve_env(Some("staging"), Some("prod".into())), "staging");
        assert_eq!(resolve_env(Some("  "), Some("prod".into())), "prod");
        assert_eq!(resolve_env(None, Some("".into())), "dev");
        assert_eq!(resolve_env(None, None), "dev");
    }

    #[test]
    fn test_boot_writes_channel_file() {
        let tmp = TempDir::new().unwrap();
        let logger = Logger::boot("billing", Some("dev"), Some(tmp.path().to_path_buf()), "1MB");

        logger.info("invoice_sent", ctx! { "invoice" => 7 });

        assert_eq!(logger.channel(), "billing");
        assert_eq!(logger.settings().max_log_bytes(), 1024 * 1024);
        let files: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("billing-"));
    }

    #[test]
    fn test_boot_production_is_restrictive() {
        let tmp = TempDir::new().unwrap();
        let logger = Logger::boot("api", Some("production"), Some(tmp.path().to_path_buf()), "bogus");

        logger.info("user noise", ctx! {});
        logger.warning("system warning", ctx! { "_origin" => "system" });
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());

        logger.error("system error", ctx! { "_origin" => "system" });
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
        assert_eq!(logger.settings().max_log_bytes(), 10 * 1024 * 1024);
    }
}

//! Sink selection by driver name

use crate::file_sink::FileSink;
use marlog_core::settings::{Settings, DEFAULT_MAX_LOG_BYTES};
use marlog_core::{NullSink, Sink};
use marlog_errors::{LogError, LogErrorKind};
use std::path::PathBuf;
use std::sync::Arc;

pub const DRIVER_FILE: &str = "file";
pub const DRIVER_NULL: &str = "null";

/// Options for `StorageFactory::make`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// `file` or `null` (any case)
    pub driver: String,
    pub path: PathBuf,
    pub prefix: String,
    pub max_bytes: u64,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            driver: DRIVER_FILE.to_string(),
            path: std::env::temp_dir().join("marlog"),
            prefix: "app".to_string(),
            max_bytes: DEFAULT_MAX_LOG_BYTES,
        }
    }
}

impl StorageOptions {
    /// File storage under `log_path`, named after the app
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            driver: DRIVER_FILE.to_string(),
            path: settings.log_path().to_path_buf(),
            prefix: settings.app_name().to_string(),
            max_bytes: settings.max_log_bytes(),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }
}

pub struct StorageFactory;

impl StorageFactory {
    /// Build the sink named by `options.driver`
    ///
    /// Unknown drivers get a `NullSink` and a warning diagnostic.
    pub fn make(options: &StorageOptions) -> Arc<dyn Sink> {
        match options.driver.trim().to_lowercase().as_str() {
            DRIVER_FILE => Arc::new(FileSink::new(
                &options.path,
                &options.prefix,
                options.max_bytes,
            )),
            DRIVER_NULL => Arc::new(NullSink),
            other => {
                let err = LogError::new(LogErrorKind::SinkUnavailable)
                    .with_op("storage_factory")
                    .with_message(format!("unknown storage driver '{}'", other));
                marlog_core::diagnostic!(
                    warn,
                    "storage_factory",
                    "unknown_storage_driver",
                    driver = other,
                    err_code = err.code(),
                    error = %err,
                );
                Arc::new(NullSink)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlog_core::logging_facility::TestCapture;
    use tempfile::TempDir;

    #[test]
    fn test_file_driver_writes_under_path() {
        let tmp = TempDir::new().unwrap();
        let options = StorageOptions {
            path: tmp.path().to_path_buf(),
            prefix: "shop".to_string(),
            ..StorageOptions::default()
        };

        let sink = StorageFactory::make(&options);
        sink.write("hello\n", "2024-01-01");
        assert!(tmp.path().join("shop-2024-01-01.log").exists());
    }

    #[test]
    fn test_null_driver_discards() {
        let tmp = TempDir::new().unwrap();
        let options = StorageOptions {
            path: tmp.path().to_path_buf(),
            ..StorageOptions::default()
        }
        .with_driver("NULL");

        StorageFactory::make(&options).write("gone\n", "2024-01-01");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_driver_falls_back_to_null() {
        let tmp = TempDir::new().unwrap();
        let options = StorageOptions {
            path: tmp.path().to_path_buf(),
            ..StorageOptions::default()
        }
        .with_driver("kafka");

        let capture = TestCapture::scoped(|| {
            StorageFactory::make(&options).write("gone\n", "2024-01-01");
        });

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        let events = capture.named("unknown_storage_driver");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fields["driver"], "kafka");
        assert_eq!(events[0].fields["err_code"], "ERR_SINK_UNAVAILABLE");
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings::from_pairs([
            ("app_name", "billing"),
            ("log_path", "/srv/logs"),
            ("max_log_bytes", "1k"),
        ]);
        let options = StorageOptions::from_settings(&settings);
        assert_eq!(options.prefix, "billing");
        assert_eq!(options.path, PathBuf::from("/srv/logs"));
        assert_eq!(options.max_bytes, 1024);
        assert_eq!(options.driver, "file");
    }
}

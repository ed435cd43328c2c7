//! Error facility for marlog
//!
//! Nothing in the logging path is allowed to raise into caller code, so
//! these types live on the *inside* of component boundaries: internal
//! helpers return `Result<T, LogError>` and the public entry points
//! degrade to a fallback value or a diagnostic event.
//!
//! - `LogErrorKind`: stable taxonomy with `ERR_*` codes
//! - `LogError`: structured error with operation/path context
//! - `ConfigError`: why a configuration value was rejected

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Canonical error kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorKind {
    /// Configuration value rejected (callers fall back to defaults)
    InvalidConfig,
    /// Filesystem failure while creating, sizing or appending
    Io,
    /// Rename of a full log file failed
    Rotation,
    /// Record could not be encoded
    Serialization,
    /// No usable sink for the configured driver; output is discarded
    SinkUnavailable,
}

impl LogErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            LogErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            LogErrorKind::Io => "ERR_IO",
            LogErrorKind::Rotation => "ERR_ROTATION",
            LogErrorKind::Serialization => "ERR_SERIALIZATION",
            LogErrorKind::SinkUnavailable => "ERR_SINK_UNAVAILABLE",
        }
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct LogError {
    kind: LogErrorKind,
    op: Option<String>,
    path: Option<PathBuf>,
    message: String,
}

impl LogError {
    /// Create a new error with the specified kind
    pub fn new(kind: LogErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the filesystem path involved
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> LogErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for LogError {}

/// Create an IO error
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> LogError {
    LogError::new(LogErrorKind::Io)
        .with_op(operation)
        .with_path(path)
        .with_message(err.to_string())
}

/// Create a rotation error
pub fn rotation_error(from: &Path, to: &Path, err: std::io::Error) -> LogError {
    LogError::new(LogErrorKind::Rotation)
        .with_op("rotate")
        .with_path(from)
        .with_message(format!("rename to {} failed: {}", to.display(), err))
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> LogError {
    LogError::new(LogErrorKind::Serialization)
        .with_op(operation)
        .with_message(err.to_string())
}

/// Reasons a configuration value was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid byte size: {value:?}")]
    InvalidByteSize { value: String },

    #[error("byte size must be positive: {value:?}")]
    NonPositiveByteSize { value: String },

    #[error("byte size overflows u64: {value:?}")]
    ByteSizeOverflow { value: String },

    #[error("not a boolean: {value:?}")]
    InvalidBool { value: String },

    #[error("unknown log level: {value:?}")]
    InvalidLevel { value: String },

    #[error("unknown log format: {value:?}")]
    UnknownFormat { value: String },

    #[error("option {key} has unsupported type {found}")]
    UnsupportedType { key: String, found: &'static str },
}

impl From<ConfigError> for LogError {
    fn from(err: ConfigError) -> Self {
        LogError::new(LogErrorKind::InvalidConfig)
            .with_op("settings")
            .with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(LogErrorKind::Io.code(), "ERR_IO");
        assert_eq!(LogErrorKind::Rotation.code(), "ERR_ROTATION");
        assert_eq!(LogErrorKind::Serialization.code(), "ERR_SERIALIZATION");
        assert_eq!(LogErrorKind::SinkUnavailable.code(), "ERR_SINK_UNAVAILABLE");
    }

    #[test]
    fn test_display_includes_context() {
        let err = LogError::new(LogErrorKind::Io)
            .with_op("append")
            .with_path("/var/log/app.log")
            .with_message("disk full");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_IO]"));
        assert!(text.contains("'append'"));
        assert!(text.contains("disk full"));
        assert!(text.contains("/var/log/app.log"));
    }

    #[test]
    fn test_io_error_helper() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = io_error("create_dir", Path::new("/root/logs"), io);
        assert_eq!(err.kind(), LogErrorKind::Io);
        assert_eq!(err.op(), Some("create_dir"));
        assert_eq!(err.path(), Some(Path::new("/root/logs")));
    }

    #[test]
    fn test_config_error_converts() {
        let err: LogError = ConfigError::InvalidByteSize {
            value: "ten".to_string(),
        }
        .into();
        assert_eq!(err.kind(), LogErrorKind::InvalidConfig);
        assert!(err.message().contains("ten"));
    }
}

//! Record formatters
//!
//! A formatter turns an assembled record into the exact bytes handed to
//! the sink. Formatting never fails: encoders fall back to a record they
//! can always encode.

mod human;
mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::record::LogRecord;
use marlog_errors::ConfigError;
use std::str::FromStr;

/// Turns a record into its on-disk representation
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// Output layout selected through configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One compact JSON object per line
    #[default]
    Json,
    /// Indented JSON, one object per entry
    JsonPretty,
    /// Multi-line text blocks separated by a blank line
    Human,
}

impl LogFormat {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            LogFormat::Json => Box::new(JsonFormatter::new()),
            LogFormat::JsonPretty => Box::new(JsonFormatter::pretty()),
            LogFormat::Human => Box::new(HumanFormatter::new()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" | "ndjson" => Ok(LogFormat::Json),
            "json_pretty" | "pretty" => Ok(LogFormat::JsonPretty),
            "human" | "text" => Ok(LogFormat::Human),
            _ => Err(ConfigError::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record() -> LogRecord {
    use crate::record::{runtime_extra, Frame};
    use chrono::{TimeZone, Utc};
    use marlog_core_types::{Level, RequestMeta};

    LogRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        level: Level::Error,
        channel: "app".to_string(),
        app: "shop".to_string(),
        env: "production".to_string(),
        pid: 4242,
        message: "checkout failed".to_string(),
        request_id: "req-1".to_string(),
        request: RequestMeta::new().with_method("POST").with_uri("/cart/checkout"),
        context: crate::ctx! { "cart_id" => 17, "note" => "ünïcode/path" },
        extra: runtime_extra(),
        file: Some("src/cart.rs".to_string()),
        line: Some(88),
        etype: Some("CartError".to_string()),
        ecode: Some(3),
        trace: (0..8).map(|i| Frame::new(format!("frame_{}", i)).at("src/cart.rs", i)).collect(),
    }
}

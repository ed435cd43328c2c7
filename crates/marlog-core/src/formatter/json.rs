//! JSON Lines formatter
//!
//! One JSON object per entry, UTF-8 as-is (no `\/` or `\uXXXX` escaping),
//! newline terminated. If the record cannot be encoded (an opaque value
//! slipped past the filter) a minimal `log_encode_failed` record is
//! emitted in its place.

use super::Formatter;
use crate::record::{format_ts, LogRecord};
use chrono::{DateTime, Utc};
use marlog_core_types::schema::{
    EVENT_LOG_ENCODE_FAILED, FIELD_CONTEXT, FIELD_LEVEL, FIELD_MESSAGE, FIELD_TS,
};
use marlog_errors::serialization_error;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output, handy in development
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    fn encode(&self, record: &LogRecord) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        }
    }

    fn fallback(&self, ts: &DateTime<Utc>, encoder_error: &str) -> String {
        let mut context = serde_json::Map::new();
        context.insert(
            "encoder_error".to_string(),
            serde_json::Value::String(encoder_error.to_string()),
        );

        let mut fallback = serde_json::Map::new();
        fallback.insert(FIELD_TS.to_string(), format_ts(ts).into());
        fallback.insert(FIELD_LEVEL.to_string(), "error".into());
        fallback.insert(FIELD_MESSAGE.to_string(), EVENT_LOG_ENCODE_FAILED.into());
        fallback.insert(FIELD_CONTEXT.to_string(), serde_json::Value::Object(context));

        // A map of strings always encodes.
        serde_json::to_string(&serde_json::Value::Object(fallback)).unwrap_or_default()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut line = match self.encode(record) {
            Ok(json) => json,
            Err(e) => {
                let err = serialization_error("format_json", e);
                crate::diagnostic!(
                    warn,
                    "format_json",
                    EVENT_LOG_ENCODE_FAILED,
                    err_code = err.code(),
                    error = %err,
                );
                self.fallback(&record.timestamp, err.message())
            }
        };
        line.push('\n');
        line
    }
}

//! Enriched log record
//!
//! A `LogRecord` is assembled by the logger once a call has passed every
//! gate. It is immutable after assembly and owned by the formatter call.

use crate::value::{Context, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use marlog_core_types::{Level, RequestMeta};
use serde::{Deserialize, Serialize, Serializer};

/// Traces attached to a record are cut to this many frames
pub const MAX_TRACE_FRAMES: usize = 20;

/// One stack frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl Frame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Method frame (`class`, `call_type` such as `::` or `->`)
    pub fn in_class(mut self, class: impl Into<String>, call_type: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self.call_type = Some(call_type.into());
        self
    }

    /// Encode as a context value (the `_trace` wire shape)
    pub fn to_value(&self) -> Value {
        let mut map = Context::new();
        if let Some(file) = &self.file {
            map.insert("file".to_string(), Value::from(file));
        }
        if let Some(line) = self.line {
            map.insert("line".to_string(), Value::from(line));
        }
        if let Some(class) = &self.class {
            map.insert("class".to_string(), Value::from(class));
        }
        if let Some(call_type) = &self.call_type {
            map.insert("type".to_string(), Value::from(call_type));
        }
        if let Some(function) = &self.function {
            map.insert("function".to_string(), Value::from(function));
        }
        Value::Map(map)
    }

    /// Decode a `_trace` element, keeping only the known frame keys
    ///
    /// Arguments, locals and anything else a caller stuffed into a frame
    /// are dropped. Returns `None` for non-map elements.
    pub fn from_value(value: &Value) -> Option<Frame> {
        let map = value.as_map()?;
        let text = |k: &str| map.get(k).and_then(Value::to_plain_string);
        Some(Frame {
            file: text("file"),
            line: map
                .get("line")
                .and_then(Value::as_i64)
                .and_then(|l| u32::try_from(l).ok()),
            class: text("class"),
            call_type: text("type"),
            function: text("function"),
        })
    }
}

/// Encode a frame list for the `_trace` meta-key
pub fn trace_value(frames: &[Frame]) -> Value {
    Value::List(frames.iter().map(Frame::to_value).collect())
}

/// Decode and cap a `_trace` meta value
pub fn sanitize_trace(value: &Value) -> Vec<Frame> {
    match value {
        Value::List(items) => items
            .iter()
            .filter_map(Frame::from_value)
            .take(MAX_TRACE_FRAMES)
            .collect(),
        _ => Vec::new(),
    }
}

/// Runtime/platform facts attached to every record as `extra`
pub fn runtime_extra() -> Context {
    let mut extra = Context::new();
    extra.insert("runtime".to_string(), Value::from("rust"));
    extra.insert(
        "marlog".to_string(),
        Value::from(env!("CARGO_PKG_VERSION")),
    );
    extra.insert("os".to_string(), Value::from(std::env::consts::OS));
    extra.insert("arch".to_string(), Value::from(std::env::consts::ARCH));
    extra
}

/// A fully enriched log record
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(rename = "ts", serialize_with = "serialize_ts")]
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub channel: String,
    pub app: String,
    pub env: String,
    pub pid: u32,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "RequestMeta::is_empty")]
    pub request: RequestMeta,
    pub context: Context,
    #[serde(skip_serializing_if = "Context::is_empty")]
    pub extra: Context,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecode: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<Frame>,
}

impl LogRecord {
    /// ISO-8601 UTC timestamp as written to the wire
    pub fn ts(&self) -> String {
        format_ts(&self.timestamp)
    }

    /// UTC calendar day used to select the active file
    pub fn date_key(&self) -> String {
        date_key(&self.timestamp)
    }
}

pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn date_key(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn serialize_ts<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_ts(ts))
}

//! Canonical schema constants for records, context markers and events
//!
//! These constants keep the record layout, the context meta-keys and the
//! event names consistent between the logger, the reporter and the tests.

// Context meta-keys (stripped before scrubbing)
pub const META_ORIGIN: &str = "_origin";
pub const META_TRACE: &str = "_trace";

// Origin tags
pub const ORIGIN_USER: &str = "user";
pub const ORIGIN_SYSTEM: &str = "system";

// Context keys with special meaning
pub const CTX_REQUEST_ID: &str = "request_id";
pub const CTX_TYPE: &str = "type";
pub const CTX_CODE: &str = "code";
pub const CTX_MESSAGE: &str = "message";
pub const CTX_FILE: &str = "file";
pub const CTX_LINE: &str = "line";

// Record field keys
pub const FIELD_TS: &str = "ts";
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_CONTEXT: &str = "context";

// Diagnostic field keys (crate-internal tracing)
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

// Markers
pub const REDACTED: &str = "[redacted]";
pub const TRUNCATED: &str = "... [truncated]";
pub const DEPTH_LIMIT: &str = "[depth limit]";

// Canonical event names
pub const EVENT_UNCAUGHT_EXCEPTION: &str = "uncaught_exception";
pub const EVENT_LOG_ENCODE_FAILED: &str = "log_encode_failed";
pub const EVENT_HANDLER_BOOTED: &str = "error_handler_booted";
pub const EVENT_SINK_WRITE_FAILED: &str = "sink_write_failed";
pub const EVENT_ROTATED: &str = "rotated";
pub const EVENT_DROPPED: &str = "dropped";

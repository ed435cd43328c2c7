#![allow(clippy::unwrap_used, clippy::expect_used)]

use marlog_core::logging_facility::TestCapture;
use marlog_core::record::runtime_extra;
use marlog_core::{Context, Formatter, JsonFormatter, LogRecord, Logger, Settings, Value};
use marlog_core_types::schema::{EVENT_DROPPED, EVENT_LOG_ENCODE_FAILED};
use marlog_core_types::{Level, RequestMeta};
use std::sync::Arc;

#[test]
fn test_dropped_call_emits_trace_diagnostic() {
    let logger = Logger::builder(Arc::new(Settings::from_pairs([("env", "production")]))).build();

    let capture = TestCapture::scoped(|| {
        logger.info("user click", Context::new());
    });

    let dropped = capture.named(EVENT_DROPPED);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].level, tracing::Level::TRACE);
    assert_eq!(dropped[0].fields["reason"], "user_origin");
    assert_eq!(dropped[0].fields["level"], "info");
}

#[test]
fn test_rejected_config_value_is_reported() {
    let capture = TestCapture::scoped(|| {
        let s = Settings::from_pairs([("max_log_bytes", "lots")]);
        assert_eq!(s.max_log_bytes(), 10 * 1024 * 1024);
    });

    let rejected = capture.named("config_value_rejected");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].fields["key"], "max_log_bytes");
    assert!(rejected[0].fields["error"].contains("lots"));
}

#[test]
fn test_encode_fallback_is_reported() {
    let record = LogRecord {
        timestamp: chrono::Utc::now(),
        level: Level::Error,
        channel: "app".to_string(),
        app: "app".to_string(),
        env: "dev".to_string(),
        pid: 1,
        message: "raw".to_string(),
        request_id: "r".to_string(),
        request: RequestMeta::default(),
        context: [("h".to_string(), Value::opaque(5u8))].into_iter().collect(),
        extra: runtime_extra(),
        file: None,
        line: None,
        etype: None,
        ecode: None,
        trace: Vec::new(),
    };

    let mut out = String::new();
    let capture = TestCapture::scoped(|| {
        out = JsonFormatter::new().format(&record);
    });

    assert!(out.contains(EVENT_LOG_ENCODE_FAILED));
    capture.assert_event_exists("format_json", EVENT_LOG_ENCODE_FAILED);
}

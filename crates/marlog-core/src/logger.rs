//! Policy-aware logger
//!
//! Every call runs the same pipeline:
//!
//! 1. gates: enabled, origin (production-like without user logs), level
//!    floor (production-like)
//! 2. record assembly: timestamp, request id, request metadata, runtime
//!    extras, meta-key stripping, scrubbing, error fields and trace
//! 3. format, then hand to the sink with the UTC date key
//!
//! Gates run before any scrubbing, formatting or IO. Nothing in this path
//! returns an error or panics; failures below the logger are absorbed by
//! the formatter and the sink.

use crate::filter::{ContextFilter, SensitiveDataFilter};
use crate::formatter::Formatter;
use crate::record::{runtime_extra, sanitize_trace, LogRecord};
use crate::settings::Settings;
use crate::sink::{NullSink, Sink};
use crate::value::{Context, Value};
use chrono::{DateTime, Utc};
use marlog_core_types::schema::{
    CTX_CODE, CTX_FILE, CTX_LINE, CTX_REQUEST_ID, CTX_TYPE, EVENT_DROPPED, META_ORIGIN,
    META_TRACE, ORIGIN_SYSTEM, ORIGIN_USER,
};
use marlog_core_types::{Level, RequestId, RequestMeta};
use std::sync::{Arc, PoisonError, RwLock};

/// Why a call was dropped before assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Disabled,
    UserOrigin,
    BelowMinLevel,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Disabled => "disabled",
            DropReason::UserOrigin => "user_origin",
            DropReason::BelowMinLevel => "below_min_level",
        }
    }
}

pub struct Logger {
    settings: Arc<Settings>,
    channel: String,
    sink: Arc<dyn Sink>,
    formatter: Box<dyn Formatter>,
    filter: Box<dyn ContextFilter>,
    enabled: bool,
    request_id: RwLock<Option<String>>,
    request: RwLock<Option<RequestMeta>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("app", &self.settings.app_name())
            .field("env", &self.settings.env())
            .field("channel", &self.channel)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Builder for `Logger`
///
/// Unset parts default from the settings: the formatter from
/// `log_format`, the filter from `sensitive_keys`, the channel from
/// `channel`. The sink defaults to a `NullSink`.
pub struct LoggerBuilder {
    settings: Arc<Settings>,
    channel: Option<String>,
    sink: Option<Arc<dyn Sink>>,
    formatter: Option<Box<dyn Formatter>>,
    filter: Option<Box<dyn ContextFilter>>,
    enabled: bool,
}

impl LoggerBuilder {
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn filter(mut self, filter: Box<dyn ContextFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build(self) -> Logger {
        let settings = self.settings;
        Logger {
            channel: self
                .channel
                .unwrap_or_else(|| settings.channel().to_string()),
            sink: self.sink.unwrap_or_else(|| Arc::new(NullSink)),
            formatter: self
                .formatter
                .unwrap_or_else(|| settings.log_format().formatter()),
            filter: self
                .filter
                .unwrap_or_else(|| Box::new(SensitiveDataFilter::new(settings.sensitive_keys()))),
            enabled: self.enabled,
            request_id: RwLock::new(None),
            request: RwLock::new(None),
            settings,
        }
    }
}

impl Logger {
    pub fn builder(settings: Arc<Settings>) -> LoggerBuilder {
        LoggerBuilder {
            settings,
            channel: None,
            sink: None,
            formatter: None,
            filter: None,
            enabled: true,
        }
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bind a request/correlation id to every later record
    ///
    /// `None` or an empty id clears the binding.
    pub fn set_request_id(&self, id: Option<&str>) {
        let id = id.filter(|id| !id.is_empty()).map(str::to_string);
        *self
            .request_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Bind the metadata of the request being served
    pub fn set_request(&self, meta: Option<RequestMeta>) {
        *self.request.write().unwrap_or_else(PoisonError::into_inner) = meta;
    }

    pub fn emergency(&self, message: &str, context: Context) {
        self.log(Level::Emergency, message, context);
    }

    pub fn alert(&self, message: &str, context: Context) {
        self.log(Level::Alert, message, context);
    }

    pub fn critical(&self, message: &str, context: Context) {
        self.log(Level::Critical, message, context);
    }

    pub fn error(&self, message: &str, context: Context) {
        self.log(Level::Error, message, context);
    }

    pub fn warning(&self, message: &str, context: Context) {
        self.log(Level::Warning, message, context);
    }

    pub fn notice(&self, message: &str, context: Context) {
        self.log(Level::Notice, message, context);
    }

    pub fn info(&self, message: &str, context: Context) {
        self.log(Level::Info, message, context);
    }

    pub fn debug(&self, message: &str, context: Context) {
        self.log(Level::Debug, message, context);
    }

    pub fn log(&self, level: Level, message: &str, context: Context) {
        if let Some(reason) = self.rejection(level, &context) {
            crate::diagnostic!(
                trace,
                "log",
                EVENT_DROPPED,
                level = level.as_str(),
                reason = reason.as_str(),
            );
            return;
        }

        let record = self.assemble(level, message, context, Utc::now());
        let formatted = self.formatter.format(&record);
        self.sink.write(&formatted, &record.date_key());
    }

    /// The gate that drops this call, if any
    pub fn rejection(&self, level: Level, context: &Context) -> Option<DropReason> {
        if !self.enabled {
            return Some(DropReason::Disabled);
        }
        if self.settings.is_production_like() {
            if !self.settings.accept_user_logs() && !is_system_origin(context) {
                return Some(DropReason::UserOrigin);
            }
            if !level.is_at_least(self.settings.min_production_level()) {
                return Some(DropReason::BelowMinLevel);
            }
        }
        None
    }

    /// Build the enriched record for a call that passed the gates
    pub fn assemble(
        &self,
        level: Level,
        message: &str,
        mut context: Context,
        now: DateTime<Utc>,
    ) -> LogRecord {
        let request = self
            .request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default();
        let request_id = self.resolve_request_id(&context, &request);

        context.remove(META_ORIGIN);
        let trace = context.remove(META_TRACE);
        let context = self.filter.scrub(&context);

        let mut record = LogRecord {
            timestamp: now,
            level,
            channel: self.channel.clone(),
            app: self.settings.app_name().to_string(),
            env: self.settings.env().to_string(),
            pid: std::process::id(),
            message: message.to_string(),
            request_id,
            request,
            context,
            extra: runtime_extra(),
            file: None,
            line: None,
            etype: None,
            ecode: None,
            trace: Vec::new(),
        };

        // Error fields are promoted only for records that carried a trace.
        if let Some(trace) = trace {
            let ctx = &record.context;
            record.file = ctx.get(CTX_FILE).and_then(Value::to_plain_string);
            record.line = ctx
                .get(CTX_LINE)
                .and_then(Value::as_i64)
                .and_then(|l| u32::try_from(l).ok());
            record.etype = ctx.get(CTX_TYPE).and_then(Value::to_plain_string);
            record.ecode = ctx.get(CTX_CODE).and_then(Value::as_i64);
            record.trace = sanitize_trace(&trace);
        }

        record
    }

    // context > bound id > inbound header > generated
    fn resolve_request_id(&self, context: &Context, request: &RequestMeta) -> String {
        let non_empty = |s: &String| !s.is_empty();
        context
            .get(CTX_REQUEST_ID)
            .and_then(Value::to_plain_string)
            .filter(non_empty)
            .or_else(|| {
                self.request_id
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .or_else(|| request.request_id_header.clone().filter(non_empty))
            .unwrap_or_else(|| RequestId::new().into_string())
    }
}

/// `_origin` is exactly `"system"`; absent or anything else counts as user
fn is_system_origin(context: &Context) -> bool {
    let origin = context
        .get(META_ORIGIN)
        .and_then(Value::as_str)
        .unwrap_or(ORIGIN_USER);
    origin == ORIGIN_SYSTEM
}

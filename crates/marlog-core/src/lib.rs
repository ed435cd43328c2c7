//! marlog core - the structured logging pipeline
//!
//! This crate provides everything between a log call and a sink:
//! - Context values and the `ctx!` macro
//! - Sensitive-data scrubbing with bounded recursion
//! - Enriched records and the JSON / human formatters
//! - Resolved settings with environment-aware defaults
//! - The policy-aware `Logger` (enabled, origin and level gates)
//! - The `ExceptionReporter` dispatch table
//! - Diagnostics for the pipeline itself (`logging_facility`)
//!
//! The rotating file sink lives in `marlog-store`; the panic hook and
//! bootstrap wiring live in `marlog-engine`.

pub mod filter;
pub mod formatter;
pub mod logger;
pub mod logging_facility;
pub mod macros;
pub mod record;
pub mod reporter;
pub mod settings;
pub mod sink;
pub mod value;

#[doc(hidden)]
pub use tracing as __tracing;

// Re-export commonly used types
pub use filter::{ContextFilter, SensitiveDataFilter};
pub use formatter::{Formatter, HumanFormatter, JsonFormatter, LogFormat};
pub use logger::{DropReason, Logger, LoggerBuilder};
pub use marlog_core_types::{Level, RequestId, RequestMeta};
pub use record::{Frame, LogRecord};
pub use reporter::{Exception, ExceptionReporter, SelfReportPolicy, SelfReporting, Thrown};
pub use settings::Settings;
pub use sink::{MemorySink, NullSink, Sink};
pub use value::{Context, Value};

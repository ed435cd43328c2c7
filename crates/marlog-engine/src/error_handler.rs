//! Error handler: bootstrap wiring and panic interception
//!
//! `ErrorHandler` owns the settings, logger and reporter of a process.
//! `register()` installs a panic hook that hands every panic straight to
//! `handle_uncaught`. In dev-like environments (`display_errors`) the
//! previous hook runs afterwards and prints the panic as usual; otherwise
//! that output is skipped. Either way the panic keeps unwinding the
//! thread. Wrap work in `guard` to carry on after a panic.

use crate::panic::thrown_from_panic;
use marlog_core::reporter::{Exception, ExceptionReporter, SelfReportPolicy};
use marlog_core::{ctx, Formatter, Logger, Settings, Sink};
use marlog_core_types::schema::EVENT_HANDLER_BOOTED;
use marlog_store::{StorageFactory, StorageOptions};
use serde_json::{Map, Value as JsonValue};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happens to an uncaught error after it was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Skip the previous panic hook; a panic still unwinds (see `guard`)
    Absorb,
    /// Run the previous panic hook as well
    Surface,
}

type ReporterSetup = Box<dyn FnOnce(&mut ExceptionReporter)>;

/// Builder for `ErrorHandler`
///
/// Anything not supplied is wired from the options: a file sink under
/// `log_path`, the formatter named by `log_format`, the default reporter.
pub struct ErrorHandlerBuilder {
    options: Map<String, JsonValue>,
    sink: Option<Arc<dyn Sink>>,
    formatter: Option<Box<dyn Formatter>>,
    logger: Option<Arc<Logger>>,
    policy: SelfReportPolicy,
    setup: Vec<ReporterSetup>,
}

impl ErrorHandlerBuilder {
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Use an existing logger instead of building one
    pub fn logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn policy(mut self, policy: SelfReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configure the reporter (ignore list, handlers, fallback)
    pub fn reporter<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut ExceptionReporter) + 'static,
    {
        self.setup.push(Box::new(setup));
        self
    }

    pub fn build(self) -> ErrorHandler {
        let settings = Arc::new(Settings::make(&self.options));

        let logger = match self.logger {
            Some(logger) => logger,
            None => {
                let sink = self.sink.unwrap_or_else(|| {
                    StorageFactory::make(&StorageOptions::from_settings(&settings))
                });
                let mut builder = Logger::builder(settings.clone()).sink(sink);
                if let Some(formatter) = self.formatter {
                    builder = builder.formatter(formatter);
                }
                Arc::new(builder.build())
            }
        };

        let mut reporter = ExceptionReporter::new(logger.clone()).with_policy(self.policy);
        for setup in self.setup {
            setup(&mut reporter);
        }

        ErrorHandler {
            settings,
            logger,
            reporter: Arc::new(reporter),
            registered: AtomicBool::new(false),
        }
    }
}

#[derive(Debug)]
pub struct ErrorHandler {
    settings: Arc<Settings>,
    logger: Arc<Logger>,
    reporter: Arc<ExceptionReporter>,
    registered: AtomicBool,
}

impl ErrorHandler {
    pub fn builder(options: Map<String, JsonValue>) -> ErrorHandlerBuilder {
        ErrorHandlerBuilder {
            options,
            sink: None,
            formatter: None,
            logger: None,
            policy: SelfReportPolicy::default(),
            setup: Vec::new(),
        }
    }

    /// Build from options and register in one call
    pub fn bootstrap(options: Map<String, JsonValue>) -> Self {
        let handler = Self::builder(options).build();
        handler.register();
        handler
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn reporter(&self) -> &Arc<ExceptionReporter> {
        &self.reporter
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Install the panic hook
    ///
    /// Returns `false` if this handler was already registered. The hook
    /// keeps the previously installed one and calls it for panics that
    /// surface.
    pub fn register(&self) -> bool {
        if self.registered.swap(true, Ordering::SeqCst) {
            return false;
        }

        let reporter = self.reporter.clone();
        let display_errors = self.settings.display_errors();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let thrown = thrown_from_panic(info.payload(), info.location());
            if disposition_after(&reporter, &thrown, display_errors) == Disposition::Surface {
                previous(info);
            }
        }));

        marlog_core::diagnostic!(
            debug,
            "register",
            EVENT_HANDLER_BOOTED,
            app = self.settings.app_name(),
            env = self.settings.env(),
        );
        self.logger.info(
            EVENT_HANDLER_BOOTED,
            ctx! {
                "_origin" => "system",
                "runtime" => "rust",
                "marlog" => env!("CARGO_PKG_VERSION"),
            },
        );
        true
    }

    /// Report an error that reached the process boundary
    pub fn handle_uncaught(&self, e: &dyn Exception) -> Disposition {
        disposition_after(&self.reporter, e, self.settings.display_errors())
    }

    /// Report a caught error through the dispatch table
    pub fn report(&self, e: &dyn Exception) -> bool {
        self.reporter.report(e)
    }

    /// Run `f`, turning a panic into `None`
    ///
    /// With the hook registered the panic has already been reported by the
    /// time this returns.
    pub fn guard<T, F: FnOnce() -> T>(&self, f: F) -> Option<T> {
        catch_unwind(AssertUnwindSafe(f)).ok()
    }
}

fn disposition_after(
    reporter: &ExceptionReporter,
    e: &dyn Exception,
    display_errors: bool,
) -> Disposition {
    reporter.report_uncaught(e);
    if display_errors {
        Disposition::Surface
    } else {
        Disposition::Absorb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marlog_core::{MemorySink, Thrown};
    use serde_json::json;

    fn options(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    fn records(sink: &MemorySink) -> Vec<JsonValue> {
        sink.lines()
            .iter()
            .map(|l| serde_json::from_str(l.trim_end()).unwrap())
            .collect()
    }

    #[test]
    fn test_dev_surfaces_uncaught() {
        let sink = Arc::new(MemorySink::new());
        let handler = ErrorHandler::builder(options(json!({ "env": "development" })))
            .sink(sink.clone())
            .build();

        let d = handler.handle_uncaught(&Thrown::new("LogicError", "bad state"));
        assert_eq!(d, Disposition::Surface);

        let recs = records(&sink);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0]["message"], "uncaught_exception");
        assert_eq!(recs[0]["level"], "error");
    }

    #[test]
    fn test_production_absorbs_uncaught() {
        let sink = Arc::new(MemorySink::new());
        let handler = ErrorHandler::builder(options(json!({ "env": "production" })))
            .sink(sink.clone())
            .build();

        let d = handler.handle_uncaught(&Thrown::new("LogicError", "bad state"));
        assert_eq!(d, Disposition::Absorb);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_display_errors_option_wins() {
        let handler = ErrorHandler::builder(options(json!({ "env": "production", "display_errors": "1" })))
            .sink(Arc::new(MemorySink::new()))
            .build();
        assert_eq!(
            handler.handle_uncaught(&Thrown::new("X", "x")),
            Disposition::Surface
        );
    }

    #[test]
    fn test_reporter_setup_applies() {
        let sink = Arc::new(MemorySink::new());
        let handler = ErrorHandler::builder(options(json!({ "env": "dev" })))
            .sink(sink.clone())
            .reporter(|r| {
                r.dont_report(["InvalidArgument"]);
            })
            .reporter(|r| {
                r.reportable("RuntimeError", |e, logger| {
                    logger.critical("handled", ctx! { "message" => e.to_string() });
                });
            })
            .build();

        assert!(handler.report(&Thrown::new("InvalidArgument", "bad")));
        assert!(handler.report(&Thrown::new("Overflow", "too big").extends("RuntimeError")));
        assert_eq!(
            handler.handle_uncaught(&Thrown::new("Overflow", "again").extends("RuntimeError")),
            Disposition::Surface
        );

        let recs = records(&sink);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r["message"] == "handled"));
    }

    #[test]
    fn test_supplied_logger_is_used() {
        let sink = Arc::new(MemorySink::new());
        let settings = Arc::new(Settings::from_pairs([("env", "dev")]));
        let logger = Arc::new(Logger::builder(settings).sink(sink.clone()).channel("jobs").build());

        let handler = ErrorHandler::builder(Map::new()).logger(logger).build();
        handler.report(&Thrown::new("X", "x"));

        let recs = records(&sink);
        assert_eq!(recs[0]["channel"], "jobs");
    }

    #[test]
    fn test_guard_absorbs_panics_without_hook() {
        let handler = ErrorHandler::builder(Map::new())
            .sink(Arc::new(MemorySink::new()))
            .build();
        assert_eq!(handler.guard(|| 5), Some(5));
        assert!(!handler.is_registered());
    }
}

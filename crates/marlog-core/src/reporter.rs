//! Exception reporter
//!
//! Routes a reported error through a dispatch table:
//!
//! 1. ignore list: any identifier in the error's type chain → handled,
//!    nothing logged
//! 2. custom handlers, first match in registration order → handled
//! 3. self-reporting capability (see `SelfReportPolicy`); `true` from its
//!    `report` → handled, no default entry
//! 4. default `uncaught_exception` entry, then the fallback → not handled
//!
//! Type matching is a linear scan over `Exception::type_chain()`, which
//! lists the error's own identifier first and its "supertypes" after it.

use crate::logger::Logger;
use crate::record::{trace_value, Frame};
use crate::value::{Context, Value};
use marlog_core_types::schema::{
    CTX_CODE, CTX_FILE, CTX_LINE, CTX_MESSAGE, CTX_TYPE, EVENT_UNCAUGHT_EXCEPTION, META_ORIGIN,
    META_TRACE, ORIGIN_SYSTEM,
};
use marlog_core_types::Level;
use std::fmt;
use std::sync::Arc;

/// A reportable error
pub trait Exception: fmt::Display + fmt::Debug + Send + Sync {
    /// Type identifiers, most specific first
    fn type_chain(&self) -> Vec<&str>;

    fn code(&self) -> i64 {
        0
    }

    fn file(&self) -> Option<&str> {
        None
    }

    fn line(&self) -> Option<u32> {
        None
    }

    fn frames(&self) -> Vec<Frame> {
        Vec::new()
    }

    /// The error's own reporting hooks, if it has any
    fn self_reporting(&self) -> Option<&dyn SelfReporting> {
        None
    }

    fn type_name(&self) -> &str {
        self.type_chain().first().copied().unwrap_or("unknown")
    }

    fn is_a(&self, ident: &str) -> bool {
        self.type_chain().contains(&ident)
    }
}

/// Errors that know how to report themselves
pub trait SelfReporting: Send + Sync {
    /// Log the error; `true` suppresses the default entry
    fn report(&self, logger: &Logger) -> bool;

    /// Extra context merged into the default entry
    fn context(&self) -> Context {
        Context::new()
    }

    /// Severity override for the default entry
    fn level(&self) -> Option<Level> {
        None
    }
}

/// Where the self-reporting capability is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfReportPolicy {
    /// Only on the uncaught path (`report_uncaught`)
    #[default]
    UncaughtHandler,
    /// On every `report` call as well
    Dispatch,
}

pub type Handler = Box<dyn Fn(&dyn Exception, &Logger) + Send + Sync>;

/// A plain error value with an explicit type chain
///
/// # Example
///
/// ```
/// use marlog_core::reporter::{Exception, Thrown};
///
/// let err = Thrown::new("PaymentDeclined", "card refused")
///     .extends("RuntimeError")
///     .with_code(402);
/// assert!(err.is_a("RuntimeError"));
/// assert_eq!(err.type_name(), "PaymentDeclined");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    chain: Vec<String>,
    message: String,
    code: i64,
    file: Option<String>,
    line: Option<u32>,
    frames: Vec<Frame>,
}

impl Thrown {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            chain: vec![type_name.into()],
            message: message.into(),
            code: 0,
            file: None,
            line: None,
            frames: Vec::new(),
        }
    }

    /// Wrap any std error; its Rust type name becomes the identifier
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        Self::new(std::any::type_name::<E>(), err.to_string()).extends("std::error::Error")
    }

    /// Append a supertype identifier
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.chain.push(parent.into());
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Thrown {}

impl Exception for Thrown {
    fn type_chain(&self) -> Vec<&str> {
        self.chain.iter().map(String::as_str).collect()
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    fn line(&self) -> Option<u32> {
        self.line
    }

    fn frames(&self) -> Vec<Frame> {
        self.frames.clone()
    }
}

pub struct ExceptionReporter {
    logger: Arc<Logger>,
    ignore: Vec<String>,
    handlers: Vec<(String, Handler)>,
    fallback: Option<Handler>,
    policy: SelfReportPolicy,
}

impl fmt::Debug for ExceptionReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionReporter")
            .field("ignore", &self.ignore)
            .field(
                "handlers",
                &self.handlers.iter().map(|(t, _)| t).collect::<Vec<_>>(),
            )
            .field("fallback", &self.fallback.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ExceptionReporter {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            ignore: Vec::new(),
            handlers: Vec::new(),
            fallback: None,
            policy: SelfReportPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelfReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn policy(&self) -> SelfReportPolicy {
        self.policy
    }

    /// Never report errors of these types (or their subtypes)
    pub fn dont_report<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in types {
            let t = t.into();
            if !self.ignore.contains(&t) {
                self.ignore.push(t);
            }
        }
        self
    }

    /// Route errors of `type_id` (or its subtypes) to `handler`
    ///
    /// Registering the same identifier again replaces the handler and
    /// keeps its original position.
    ///
    /// Handlers also run inside the panic hook; a handler that panics
    /// there aborts the process.
    pub fn reportable<F>(&mut self, type_id: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&dyn Exception, &Logger) + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        let handler: Handler = Box::new(handler);
        match self.handlers.iter_mut().find(|(t, _)| *t == type_id) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((type_id, handler)),
        }
        self
    }

    /// Called after the default entry for anything not handled
    ///
    /// Like `reportable` handlers, a fallback that panics inside the panic
    /// hook aborts the process.
    pub fn fallback<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&dyn Exception, &Logger) + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(handler));
        self
    }

    pub fn is_ignored(&self, e: &dyn Exception) -> bool {
        self.ignore.iter().any(|t| e.is_a(t))
    }

    /// Report an error; `true` means it was handled without the default entry
    pub fn report(&self, e: &dyn Exception) -> bool {
        self.dispatch(e, self.policy == SelfReportPolicy::Dispatch)
    }

    /// Report an error that escaped to the process boundary
    ///
    /// The self-reporting capability is always consulted here, and its
    /// level and context shape the default entry.
    pub fn report_uncaught(&self, e: &dyn Exception) -> bool {
        self.dispatch(e, true)
    }

    /// Context merged into the default entry
    pub fn extra_context(&self, e: &dyn Exception) -> Context {
        e.self_reporting()
            .map(|capability| capability.context())
            .unwrap_or_default()
    }

    /// Level of the default entry
    pub fn level(&self, e: &dyn Exception) -> Level {
        e.self_reporting()
            .and_then(|capability| capability.level())
            .unwrap_or(Level::Error)
    }

    fn dispatch(&self, e: &dyn Exception, consult_capability: bool) -> bool {
        if self.is_ignored(e) {
            return true;
        }

        if let Some((_, handler)) = self.handlers.iter().find(|(t, _)| e.is_a(t)) {
            handler(e, &self.logger);
            return true;
        }

        if consult_capability {
            if let Some(capability) = e.self_reporting() {
                if capability.report(&self.logger) {
                    return true;
                }
            }
        }

        let (level, extra) = if consult_capability {
            (self.level(e), self.extra_context(e))
        } else {
            (Level::Error, Context::new())
        };

        let mut context = default_context(e);
        for (k, v) in extra {
            if k != META_ORIGIN && k != META_TRACE {
                context.insert(k, v);
            }
        }
        self.logger.log(level, EVENT_UNCAUGHT_EXCEPTION, context);

        if let Some(fallback) = &self.fallback {
            fallback(e, &self.logger);
        }
        false
    }
}

/// The context of a default `uncaught_exception` entry
pub fn default_context(e: &dyn Exception) -> Context {
    let mut context = Context::new();
    context.insert(META_ORIGIN.to_string(), Value::from(ORIGIN_SYSTEM));
    context.insert(CTX_TYPE.to_string(), Value::from(e.type_name()));
    context.insert(CTX_CODE.to_string(), Value::Int(e.code()));
    context.insert(CTX_MESSAGE.to_string(), Value::from(e.to_string()));
    context.insert(CTX_FILE.to_string(), Value::from(e.file()));
    context.insert(CTX_LINE.to_string(), Value::from(e.line()));
    context.insert(META_TRACE.to_string(), trace_value(&e.frames()));
    context
}

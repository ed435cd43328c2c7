//! marlog engine - process wiring
//!
//! Connects the core pipeline to the process:
//! - `ErrorHandler`: settings, logger and reporter built in one place,
//!   plus the panic hook that routes panics into the reporter
//! - `LoggerBoot`: environment-aware quick start for a file logger
//! - `panic`: turning panic payloads and backtraces into reportable errors

pub mod boot;
pub mod error_handler;
pub mod panic;

pub use boot::LoggerBoot;
pub use error_handler::{Disposition, ErrorHandler, ErrorHandlerBuilder};

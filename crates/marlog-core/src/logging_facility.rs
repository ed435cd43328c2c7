//! Diagnostics for the logging pipeline itself
//!
//! The pipeline never reports its own failures through the records it
//! writes. Sink errors, encode fallbacks, rejected configuration values,
//! dropped calls and hook registration are emitted as `tracing` events
//! with `component`, `op` and `event` fields (see `diagnostic!`).
//!
//! - `init(profile)` installs a subscriber once per process
//! - `init_test_capture()` records events in memory for assertions
//!
//! # Usage
//!
//! ```rust
//! use marlog_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};

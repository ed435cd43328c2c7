//! Core types shared across marlog crates
//!
//! This crate provides the foundational vocabulary used by the error
//! facility, the logging pipeline and the storage layer:
//!
//! - **Severity levels**: `Level`, ordered most to least severe
//! - **Correlation types**: RequestId, RequestMeta
//! - **Schema constants**: Canonical field keys, markers and event names

pub mod correlation;
pub mod level;
pub mod schema;

pub use correlation::{RequestId, RequestMeta};
pub use level::{Level, ParseLevelError};

//! marlog store - on-disk persistence for formatted records
//!
//! Provides:
//! - `FileSink`: date-keyed files with size-triggered rotation
//! - `StorageFactory`: sink selection by driver name (`file`, `null`)

pub mod factory;
pub mod file_sink;

pub use factory::{StorageFactory, StorageOptions};
pub use file_sink::FileSink;
pub use marlog_errors::Result;

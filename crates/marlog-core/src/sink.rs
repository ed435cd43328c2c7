//! Sink abstraction
//!
//! A sink persists one formatted record. Writes are best-effort: a sink
//! must attempt the write and must never panic or hand an error back to
//! the logger. The file sink lives in `marlog-store`; alternate backends
//! implement this trait without touching the logger.

use std::sync::{Mutex, PoisonError};

/// Persists formatted records
pub trait Sink: Send + Sync {
    /// Persist `formatted` under the given UTC date key (`YYYY-MM-DD`)
    fn write(&self, formatted: &str, date_key: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn write(&self, _formatted: &str, _date_key: &str) {}
}

/// One write received by a `MemorySink`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkEntry {
    pub formatted: String,
    pub date_key: String,
}

/// Records every write in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SinkEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Formatted payloads only
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.formatted).collect()
    }

    pub fn count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, formatted: &str, date_key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkEntry {
                formatted: formatted.to_string(),
                date_key: date_key.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_sink_records_writes() {
        let sink = MemorySink::new();
        sink.write("one\n", "2024-01-01");
        sink.write("two\n", "2024-01-02");

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.entries()[1].date_key, "2024-01-02");
        assert_eq!(sink.lines(), vec!["one\n".to_string(), "two\n".to_string()]);

        sink.clear();
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_sinks_are_object_safe() {
        let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(NullSink), Arc::new(MemorySink::new())];
        for sink in &sinks {
            sink.write("x\n", "2024-01-01");
        }
    }
}

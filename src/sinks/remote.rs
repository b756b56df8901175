//! Remote sink trait and an in-process implementation

use crate::core::{LogEntry, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Destination for structured entries
///
/// A sink is shared by a root facade and every facade derived from it, so it
/// takes `&self` and synchronizes internally. `submit` never fails the
/// caller; delivery problems surface through `flush`.
pub trait RemoteSink: Send + Sync {
    fn submit(&self, entry: LogEntry);
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}

/// Sink that keeps every entry in memory
///
/// Useful for local development and for asserting on what a facade emits.
///
/// # Example
///
/// ```
/// use gcplog::prelude::*;
/// use std::sync::Arc;
///
/// let sink = Arc::new(RecordingSink::new());
/// let logger = CloudLogger::builder()
///     .remote_sink(sink.clone())
///     .build();
///
/// logger.info("stored", Fields::new().with("id", 7));
/// assert_eq!(sink.entries().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
    flushes: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries submitted so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl RemoteSink for RecordingSink {
    fn submit(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

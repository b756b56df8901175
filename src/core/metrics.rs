//! Remote sink metrics
//!
//! Counters for monitoring delivery to the remote sink: entries accepted,
//! shipped, failed, dropped (full queue or stopped shipper), and blocking
//! submissions.

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for a remote sink
///
/// # Example
///
/// ```
/// use gcplog::SinkMetrics;
///
/// let metrics = SinkMetrics::new();
/// metrics.record_submitted();
/// metrics.record_delivered(1);
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct SinkMetrics {
    /// Entries accepted onto the queue
    submitted: AtomicU64,

    /// Entries acknowledged by the transport
    delivered: AtomicU64,

    /// Entries in batches the transport rejected
    failed: AtomicU64,

    /// Entries dropped because the queue was full or the shipper had stopped
    dropped: AtomicU64,

    /// Submissions that had to wait for queue space
    blocked: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self, count: u64) -> u64 {
        self.delivered.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self, count: u64) -> u64 {
        self.failed.fetch_add(count, Ordering::Relaxed)
    }

    /// Record a dropped entry, returning the previous drop count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_blocked(&self) -> u64 {
        self.blocked.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of accepted-or-dropped entries that were dropped (0.0 - 100.0)
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped() as f64;
        let total = self.submitted() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for SinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = SinkMetrics::new();
        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.delivered(), 0);
        assert_eq!(metrics.failed(), 0);
        assert_eq!(metrics.dropped(), 0);
        assert_eq!(metrics.blocked(), 0);
    }

    #[test]
    fn test_record_dropped_returns_previous() {
        let metrics = SinkMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped(), 2);
    }

    #[test]
    fn test_batch_counters() {
        let metrics = SinkMetrics::new();
        metrics.record_delivered(50);
        metrics.record_delivered(7);
        metrics.record_failed(3);
        assert_eq!(metrics.delivered(), 57);
        assert_eq!(metrics.failed(), 3);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = SinkMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..100 {
            metrics.record_submitted();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }
        let rate = metrics.drop_rate();
        assert!(rate > 9.0 && rate < 10.0, "Drop rate was {}", rate);
    }
}

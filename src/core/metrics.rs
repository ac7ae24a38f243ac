//! Logger metrics for observability
//!
//! Counters for monitoring logger health: records dispatched, writes that
//! failed at a sink, messages truncated by the size cap, and filter matches
//! that fell back to full redaction.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use sentinel_log::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_logged();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the level gate and were dispatched
    total_logged: AtomicU64,

    /// Individual writer calls that returned an error
    write_failures: AtomicU64,

    /// Individual writer calls that panicked
    writer_panics: AtomicU64,

    /// Messages cut down to the configured size cap
    truncated: AtomicU64,

    /// Pattern matches replaced wholesale after a timeout or fault
    filter_fallbacks: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            writer_panics: AtomicU64::new(0),
            truncated: AtomicU64::new(0),
            filter_fallbacks: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writer_panics(&self) -> u64 {
        self.writer_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn truncated(&self) -> u64 {
        self.truncated.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filter_fallbacks(&self) -> u64 {
        self.filter_fallbacks.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_writer_panic(&self) -> u64 {
        self.writer_panics.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_truncated(&self) -> u64 {
        self.truncated.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn add_filter_fallbacks(&self, count: u64) {
        if count > 0 {
            self.filter_fallbacks.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.writer_panics.store(0, Ordering::Relaxed);
        self.truncated.store(0, Ordering::Relaxed);
        self.filter_fallbacks.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            write_failures: AtomicU64::new(self.write_failures()),
            writer_panics: AtomicU64::new(self.writer_panics()),
            truncated: AtomicU64::new(self.truncated()),
            filter_fallbacks: AtomicU64::new(self.filter_fallbacks()),
        }
    }
}

//! Per-logger counters for observability
//!
//! Tracks how many records were written, how many were filtered out by the
//! level threshold, and how many the sink failed to accept.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_kv_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.written_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records handed to the sink successfully
    written: AtomicU64,

    /// Calls below the level threshold
    filtered: AtomicU64,

    /// Records the sink rejected
    write_errors: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_error_count(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Record a written entry, returning the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_error(&self) -> u64 {
        self.write_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of records the sink rejected, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written yet.
    pub fn error_rate(&self) -> f64 {
        let errors = self.write_error_count() as f64;
        let total = self.written_count() as f64 + errors;
        if total == 0.0 {
            0.0
        } else {
            (errors / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.written.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
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
            written: AtomicU64::new(self.written_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            write_errors: AtomicU64::new(self.write_error_count()),
        }
    }
}

// Batch metrics module
//
// Lightweight counters describing what the rename/copy engine did

use crate::services::file_ops::FileOpStatus;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Batch performance metrics
///
/// Uses atomic operations so the background worker can record while the
/// coordinator reads. Counters accumulate across batches for the lifetime of
/// the engine that owns them.
#[derive(Debug)]
pub struct Metrics {
    /// Files renamed in place
    pub files_moved: AtomicUsize,

    /// Files duplicated under the new name
    pub files_copied: AtomicUsize,

    /// Files whose name did not contain the search pattern
    pub files_unchanged: AtomicUsize,

    /// Files whose operation failed
    pub files_failed: AtomicUsize,

    /// Failed files passed over after a Continue decision
    pub files_skipped: AtomicUsize,

    /// Total time spent in successful filesystem operations, in milliseconds
    pub total_operation_time_ms: AtomicU64,

    pub batches_started: AtomicU64,
    pub batches_completed: AtomicU64,
    pub batches_cancelled: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            files_moved: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
            files_unchanged: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            total_operation_time_ms: AtomicU64::new(0),
            batches_started: AtomicU64::new(0),
            batches_completed: AtomicU64::new(0),
            batches_cancelled: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful file operation
    pub fn record_file_status(&self, status: FileOpStatus) {
        let counter = match status {
            FileOpStatus::Moved => &self.files_moved,
            FileOpStatus::Copied => &self.files_copied,
            FileOpStatus::Unchanged => &self.files_unchanged,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_operation_time(&self, duration: Duration) {
        self.total_operation_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_batch_started(&self) {
        self.batches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_completed(&self) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_cancelled(&self) {
        self.batches_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Files whose operation succeeded (moved, copied or unchanged)
    pub fn files_succeeded(&self) -> usize {
        self.files_moved.load(Ordering::Relaxed)
            + self.files_copied.load(Ordering::Relaxed)
            + self.files_unchanged.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time per successful operation in milliseconds
    pub fn avg_operation_time_ms(&self) -> f64 {
        let total = self.total_operation_time_ms.load(Ordering::Relaxed);
        let count = self.files_succeeded();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Batch Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Files: {} moved, {} copied, {} unchanged, {} failed ({} skipped)",
            self.files_moved.load(Ordering::Relaxed),
            self.files_copied.load(Ordering::Relaxed),
            self.files_unchanged.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed),
            self.files_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total operation time: {:.2}s (avg: {:.2}ms per file)",
            self.total_operation_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_operation_time_ms()
        );
        tracing::info!(
            "Batches: {} started, {} completed, {} cancelled",
            self.batches_started.load(Ordering::Relaxed),
            self.batches_completed.load(Ordering::Relaxed),
            self.batches_cancelled.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

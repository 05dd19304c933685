use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::CacheStats;

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    searches_run: AtomicU64,
    documents_summarized: AtomicU64,
    documents_failed: AtomicU64,
    batches_cancelled: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keyword search reaching the document store.
    pub fn record_search(&self) {
        self.searches_run.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the per-document tally of a finished batch or single-document request.
    pub fn record_documents(&self, summarized: u64, failed: u64) {
        self.documents_summarized
            .fetch_add(summarized, Ordering::Relaxed);
        self.documents_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a batch cut short by cancellation or its deadline.
    pub fn record_cancelled(&self) {
        self.batches_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters alongside cache statistics.
    pub fn snapshot(&self, caches: CacheStats) -> MetricsSnapshot {
        MetricsSnapshot {
            searches_run: self.searches_run.load(Ordering::Relaxed),
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            batches_cancelled: self.batches_cancelled.load(Ordering::Relaxed),
            caches,
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Keyword searches that reached the document store since startup.
    pub searches_run: u64,
    /// Documents summarized successfully.
    pub documents_summarized: u64,
    /// Documents dropped because extraction or summarization failed.
    pub documents_failed: u64,
    /// Batches that returned early because of cancellation or timeout.
    pub batches_cancelled: u64,
    /// Cache sizes and hit rates for the current generation.
    pub caches: CacheStats,
}

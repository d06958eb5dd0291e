use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion and query activity.
#[derive(Default)]
pub struct DocumentMetrics {
    documents_indexed: AtomicU64,
    chunks_indexed: AtomicU64,
    queries_answered: AtomicU64,
    low_confidence_answers: AtomicU64,
    summaries_generated: AtomicU64,
    summary_cache_hits: AtomicU64,
}

impl DocumentMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a registered document and the number of chunks produced for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_answer(&self, low_confidence: bool) {
        self.queries_answered.fetch_add(1, Ordering::Relaxed);
        if low_confidence {
            self.low_confidence_answers.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a summary request, distinguishing fresh computations from cache hits.
    pub fn record_summary(&self, cache_hit: bool) {
        if cache_hit {
            self.summary_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.summaries_generated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
            low_confidence_answers: self.low_confidence_answers.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summary_cache_hits: self.summary_cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents registered since startup.
    pub documents_indexed: u64,
    /// Total chunk count produced across all registered documents.
    pub chunks_indexed: u64,
    /// Questions that produced an answer.
    pub queries_answered: u64,
    /// Answers whose confidence fell below the configured minimum.
    pub low_confidence_answers: u64,
    /// Summaries computed through the summarization capability.
    pub summaries_generated: u64,
    /// Summary requests served from the per-document cache.
    pub summary_cache_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = DocumentMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 2);
        assert_eq!(snapshot.chunks_indexed, 5);
    }

    #[test]
    fn separates_low_confidence_answers_and_cache_hits() {
        let metrics = DocumentMetrics::new();
        metrics.record_answer(false);
        metrics.record_answer(true);
        metrics.record_summary(false);
        metrics.record_summary(true);
        metrics.record_summary(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queries_answered, 2);
        assert_eq!(snapshot.low_confidence_answers, 1);
        assert_eq!(snapshot.summaries_generated, 1);
        assert_eq!(snapshot.summary_cache_hits, 2);
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(DocumentMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}

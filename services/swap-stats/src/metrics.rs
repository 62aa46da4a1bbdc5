//! Service counters
//!
//! Atomic counters for logged batches, rejections, bucket churn and
//! resets, plus an ingest latency tracker. `export` flattens them for
//! Prometheus-style exposition.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::engine::LogOutcome;

pub struct ServiceMetrics {
    // Ingestion
    pub batches_logged: AtomicU64,
    pub swaps_processed: AtomicU64,
    pub ingest_latency_ns: Mutex<LatencyTracker>,

    // Rejections
    pub rejected_unauthorized: AtomicU64,
    pub rejected_invalid: AtomicU64,

    // Buckets
    pub fine_buckets_created: AtomicU64,
    pub coarse_buckets_created: AtomicU64,
    pub fine_buckets_pruned: AtomicU64,
    pub coarse_buckets_pruned: AtomicU64,

    // Operator
    pub resets: AtomicU64,
    pub rows_reset: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            batches_logged: AtomicU64::new(0),
            swaps_processed: AtomicU64::new(0),
            ingest_latency_ns: Mutex::new(LatencyTracker::new(1000)),
            rejected_unauthorized: AtomicU64::new(0),
            rejected_invalid: AtomicU64::new(0),
            fine_buckets_created: AtomicU64::new(0),
            coarse_buckets_created: AtomicU64::new(0),
            fine_buckets_pruned: AtomicU64::new(0),
            coarse_buckets_pruned: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            rows_reset: AtomicU64::new(0),
        }
    }

    /// Record a committed batch.
    pub fn record_logged(&self, outcome: &LogOutcome, latency_ns: u64) {
        self.batches_logged.fetch_add(1, Ordering::Relaxed);
        self.swaps_processed.fetch_add(outcome.swaps as u64, Ordering::Relaxed);
        self.fine_buckets_created
            .fetch_add(u64::from(outcome.fine_created), Ordering::Relaxed);
        self.coarse_buckets_created
            .fetch_add(u64::from(outcome.coarse_created), Ordering::Relaxed);
        self.fine_buckets_pruned
            .fetch_add(outcome.fine_pruned as u64, Ordering::Relaxed);
        self.coarse_buckets_pruned
            .fetch_add(outcome.coarse_pruned as u64, Ordering::Relaxed);
        if let Ok(mut tracker) = self.ingest_latency_ns.lock() {
            tracker.record(latency_ns);
        }
    }

    pub fn record_unauthorized(&self) {
        self.rejected_unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.rejected_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self, rows: usize) {
        self.resets.fetch_add(1, Ordering::Relaxed);
        self.rows_reset.fetch_add(rows as u64, Ordering::Relaxed);
    }

    /// p99 ingest latency in nanoseconds, if any batch was logged.
    pub fn ingest_p99_ns(&self) -> Option<u64> {
        self.ingest_latency_ns
            .lock()
            .ok()
            .and_then(|tracker| tracker.percentile(99))
    }

    pub fn export(&self) -> BTreeMap<String, u64> {
        let counters = [
            ("batches_logged", &self.batches_logged),
            ("swaps_processed", &self.swaps_processed),
            ("rejected_unauthorized", &self.rejected_unauthorized),
            ("rejected_invalid", &self.rejected_invalid),
            ("fine_buckets_created", &self.fine_buckets_created),
            ("coarse_buckets_created", &self.coarse_buckets_created),
            ("fine_buckets_pruned", &self.fine_buckets_pruned),
            ("coarse_buckets_pruned", &self.coarse_buckets_pruned),
            ("resets", &self.resets),
            ("rows_reset", &self.rows_reset),
        ];
        let mut m: BTreeMap<String, u64> = counters
            .iter()
            .map(|(name, counter)| (name.to_string(), counter.load(Ordering::Relaxed)))
            .collect();
        if let Some(p99) = self.ingest_p99_ns() {
            m.insert("ingest_latency_p99_ns".to_string(), p99);
        }
        m
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded window of latency samples for percentile calculation.
pub struct LatencyTracker {
    samples: VecDeque<u64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Get a percentile value (0-100).
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (p as f64 / 100.0 * (sorted.len() - 1) as f64) as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn average(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as u64)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

//! Target metrics for observability

use observability::{RunningStats, StatsSummary};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Metrics for a single target, accumulated across runs
#[derive(Debug, Default)]
pub struct TargetMetrics {
    /// Total invocations
    invocation_count: AtomicU64,
    /// Invocations that returned a document
    success_count: AtomicU64,
    /// Invocations that failed
    failure_count: AtomicU64,
    /// Result writes that failed
    persist_failure_count: AtomicU64,
    /// Invocation latency (ms)
    latency: Mutex<RunningStats>,
}

impl TargetMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation
    pub fn record_invocation(&self, success: bool, latency_ms: f64) {
        self.invocation_count.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(latency_ms);
    }

    /// Record a failed result write
    /// Count a failed invocation that produced no latency sample
    pub fn record_aborted(&self) {
        self.invocation_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_persist_failure_count(&self) {
        self.persist_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn persist_failure_count(&self) -> u64 {
        self.persist_failure_count.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = StatsSummary::from(&*self.latency.lock().unwrap_or_else(PoisonError::into_inner));
        MetricsSnapshot {
            invocation_count: self.invocation_count(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            persist_failure_count: self.persist_failure_count(),
            latency_ms: latency,
        }
    }
}

/// Snapshot of target metrics (for reporting)
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub invocation_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub persist_failure_count: u64,
    pub latency_ms: StatsSummary,
}

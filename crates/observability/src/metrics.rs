//! Dispatch metric recorders
//!
//! Thin wrappers over the `metrics` facade plus an online statistics helper
//! for per-target latency summaries.

use metrics::{counter, gauge, histogram};

/// Record one target invocation and how it ended
pub fn record_target_invocation(target: &str, success: bool, latency_ms: f64) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "classify_dispatch_invocations_total",
        "target" => target.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "classify_dispatch_invoke_latency_ms",
        "target" => target.to_string()
    )
    .record(latency_ms);
}

/// Record a failed result write for a target
pub fn record_persist_failure(target: &str) {
    counter!(
        "classify_dispatch_persist_failures_total",
        "target" => target.to_string()
    )
    .increment(1);
}

/// Record a completed run
pub fn record_run_completed(successes: usize, failures: usize) {
    counter!("classify_dispatch_runs_total").increment(1);
    gauge!("classify_dispatch_last_run_failures").set(failures as f64);
    if failures > 0 && successes == 0 {
        counter!("classify_dispatch_runs_all_failed_total").increment(1);
    }
}

/// Record a run that never started because the artifact could not be read
pub fn record_fetch_failure() {
    counter!("classify_dispatch_fetch_failures_total").increment(1);
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

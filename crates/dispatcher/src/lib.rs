//! # Dispatcher
//!
//! Fan-out of one artifact to a fixed set of inference targets.
//!
//! Responsibilities:
//! - Invoke every registered target with the artifact bytes
//! - Isolate failures: one target's error never affects another's outcome
//! - Persist one JSON document per target
//! - Aggregate outcomes into a `RunResult` and the platform response

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod metrics;
mod step;

pub use contracts::{Outcome, RunResult, Target, TargetRegistry};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handler::Handler;
pub use metrics::{MetricsSnapshot, TargetMetrics};

//! Per-target step: invoke, persist, report
//!
//! A step never returns an error. Invocation and persistence failures are
//! both folded into the returned [`Outcome`], and every outcome is written.

use bytes::Bytes;
use contracts::{
    output_key, ContractError, InferenceEndpoint, ObjectStore, Outcome, Target, CONTENT_TYPE_JSON,
};
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::metrics::TargetMetrics;

/// Run-wide inputs shared by every step
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepContext<'a> {
    /// Bucket results are written to
    pub bucket: &'a str,
    /// Key prefix for result documents
    pub output_prefix: &'a str,
    /// Base name of the artifact
    pub artifact_name: &'a str,
}

/// Invoke one target and persist its outcome
#[instrument(
    name = "dispatch_target",
    skip(store, endpoint, target, artifact, ctx, metrics),
    fields(target = %target.short_name, model = %target.endpoint_reference)
)]
pub(crate) async fn dispatch_target<S, E>(
    store: &S,
    endpoint: &E,
    target: &Target,
    artifact: Bytes,
    ctx: StepContext<'_>,
    metrics: &TargetMetrics,
) -> Outcome
where
    S: ObjectStore + Sync,
    E: InferenceEndpoint + Sync,
{
    let outcome = invoke_target(endpoint, target, artifact, metrics).await;
    settle_outcome(store, &target.short_name, outcome, ctx, metrics).await
}

/// Persist `outcome` for `target_name`, downgrading a failed write
///
/// A failed write keeps any earlier failure reason in the message.
pub(crate) async fn settle_outcome<S>(
    store: &S,
    target_name: &str,
    outcome: Outcome,
    ctx: StepContext<'_>,
    metrics: &TargetMetrics,
) -> Outcome
where
    S: ObjectStore + Sync,
{
    let key = output_key(ctx.output_prefix, target_name, ctx.artifact_name);

    match persist_outcome(store, ctx.bucket, &key, &outcome).await {
        Ok(()) => {
            debug!(key = %key, success = outcome.is_success(), "Outcome persisted");
            outcome
        }
        Err(e) => {
            metrics.inc_persist_failure_count();
            observability::record_persist_failure(target_name);
            error!(key = %key, error = %e, "Failed to persist outcome");
            let persist_error = format!("failed to persist result to {key}: {e}");
            match outcome.error_message() {
                Some(original) => Outcome::failure(format!("{original}; {persist_error}")),
                None => Outcome::failure(persist_error),
            }
        }
    }
}

async fn invoke_target<E>(
    endpoint: &E,
    target: &Target,
    artifact: Bytes,
    metrics: &TargetMetrics,
) -> Outcome
where
    E: InferenceEndpoint + Sync,
{
    let started = Instant::now();
    let result = endpoint.invoke(&target.endpoint_reference, artifact).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let outcome = match result {
        Ok(payload) => Outcome::Success(payload),
        Err(e) => {
            warn!(error = %e, latency_ms, "Target invocation failed");
            Outcome::failure(e.to_string())
        }
    };

    metrics.record_invocation(outcome.is_success(), latency_ms);
    observability::record_target_invocation(&target.short_name, outcome.is_success(), latency_ms);
    outcome
}

async fn persist_outcome<S>(
    store: &S,
    bucket: &str,
    key: &str,
    outcome: &Outcome,
) -> Result<(), ContractError>
where
    S: ObjectStore + Sync,
{
    let body = outcome.to_document_bytes()?;
    store
        .put(bucket, key, Bytes::from(body), CONTENT_TYPE_JSON)
        .await
}

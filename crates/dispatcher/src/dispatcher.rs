//! Dispatcher - fan-out of one artifact to every registered target

use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use contracts::{
    DispatchMode, DispatchSettings, InferenceEndpoint, ObjectStore, Outcome, RunResult, Target,
    TargetRegistry, DEFAULT_OUTPUT_PREFIX,
};

use crate::metrics::{MetricsSnapshot, TargetMetrics};
use crate::step::{dispatch_target, settle_outcome, StepContext};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Targets every artifact is sent to
    pub registry: TargetRegistry,
    /// Key prefix for result documents
    pub output_prefix: String,
    /// Sequential or concurrent fan-out
    pub mode: DispatchMode,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            registry: TargetRegistry::reference(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            mode: DispatchMode::Sequential,
        }
    }
}

impl DispatcherConfig {
    /// Reference registry with storage and dispatch options from settings
    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self {
            registry: TargetRegistry::reference(),
            output_prefix: settings.storage.output_prefix.clone(),
            mode: settings.dispatch.mode,
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<S, E> {
    config: DispatcherConfig,
    store: Arc<S>,
    endpoint: Arc<E>,
}

impl<S, E> DispatcherBuilder<S, E>
where
    S: ObjectStore + Sync + 'static,
    E: InferenceEndpoint + Sync + 'static,
{
    /// Create a builder with the default configuration
    pub fn new(store: Arc<S>, endpoint: Arc<E>) -> Self {
        Self {
            config: DispatcherConfig::default(),
            store,
            endpoint,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: TargetRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.output_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Dispatcher<S, E> {
        Dispatcher::new(self.config, self.store, self.endpoint)
    }
}

/// Fans one artifact out to every target in the registry
///
/// Holds no per-run state; one instance serves any number of events.
pub struct Dispatcher<S, E> {
    config: DispatcherConfig,
    store: Arc<S>,
    endpoint: Arc<E>,
    /// Aligned with `config.registry`
    metrics: Vec<Arc<TargetMetrics>>,
}

impl<S, E> Dispatcher<S, E>
where
    S: ObjectStore + Sync + 'static,
    E: InferenceEndpoint + Sync + 'static,
{
    pub fn new(config: DispatcherConfig, store: Arc<S>, endpoint: Arc<E>) -> Self {
        let metrics = config
            .registry
            .iter()
            .map(|_| Arc::new(TargetMetrics::new()))
            .collect();
        Self {
            config,
            store,
            endpoint,
            metrics,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.config.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get metrics for all targets, in registry order
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.config
            .registry
            .iter()
            .zip(&self.metrics)
            .map(|(t, m)| (t.short_name.to_string(), m.snapshot()))
            .collect()
    }

    /// Send `artifact` to every target and persist each outcome into `bucket`
    ///
    /// Always yields one outcome per registered target, in registry order.
    #[instrument(
        name = "dispatcher_run",
        skip(self, artifact),
        fields(targets = self.config.registry.len(), mode = ?self.config.mode, bytes = artifact.len())
    )]
    pub async fn run(&self, bucket: &str, artifact: Bytes, artifact_name: &str) -> RunResult {
        info!("Dispatch started");

        let result = match self.config.mode {
            DispatchMode::Sequential => self.run_sequential(bucket, artifact, artifact_name).await,
            DispatchMode::Concurrent => self.run_concurrent(bucket, artifact, artifact_name).await,
        };

        let (successes, failures) = (result.success_count(), result.failure_count());
        observability::record_run_completed(successes, failures);
        info!(successes, failures, "Dispatch finished");

        result
    }

    /// One target at a time, in registry order
    async fn run_sequential(&self, bucket: &str, artifact: Bytes, artifact_name: &str) -> RunResult {
        let mut result = RunResult::new(artifact_name);
        for (target, metrics) in self.config.registry.iter().zip(&self.metrics) {
            let handle = self.spawn_target(target, metrics, bucket, artifact.clone(), artifact_name);
            let outcome = self
                .join_target(target, metrics, handle, bucket, artifact_name)
                .await;
            result.record(target.short_name.clone(), outcome);
        }
        result
    }

    /// All targets at once; outcomes still collected in registry order
    async fn run_concurrent(&self, bucket: &str, artifact: Bytes, artifact_name: &str) -> RunResult {
        let handles: Vec<_> = self
            .config
            .registry
            .iter()
            .zip(&self.metrics)
            .map(|(target, metrics)| {
                self.spawn_target(target, metrics, bucket, artifact.clone(), artifact_name)
            })
            .collect();

        let mut result = RunResult::new(artifact_name);
        for ((target, metrics), handle) in self.config.registry.iter().zip(&self.metrics).zip(handles) {
            let outcome = self
                .join_target(target, metrics, handle, bucket, artifact_name)
                .await;
            result.record(target.short_name.clone(), outcome);
        }
        result
    }

    /// Run one target's step on its own task
    fn spawn_target(
        &self,
        target: &Target,
        metrics: &Arc<TargetMetrics>,
        bucket: &str,
        artifact: Bytes,
        artifact_name: &str,
    ) -> JoinHandle<Outcome> {
        let store = Arc::clone(&self.store);
        let endpoint = Arc::clone(&self.endpoint);
        let metrics = Arc::clone(metrics);
        let target = target.clone();
        let bucket = bucket.to_string();
        let prefix = self.config.output_prefix.clone();
        let name = artifact_name.to_string();

        tokio::spawn(async move {
            let ctx = StepContext {
                bucket: &bucket,
                output_prefix: &prefix,
                artifact_name: &name,
            };
            dispatch_target(&*store, &*endpoint, &target, artifact, ctx, &metrics).await
        })
    }

    /// Await a target task; a task that died is still reported and persisted
    async fn join_target(
        &self,
        target: &Target,
        metrics: &TargetMetrics,
        handle: JoinHandle<Outcome>,
        bucket: &str,
        artifact_name: &str,
    ) -> Outcome {
        let error = match handle.await {
            Ok(outcome) => return outcome,
            Err(e) => e,
        };

        error!(target = %target.short_name, error = %error, "Target task aborted");
        metrics.record_aborted();

        let ctx = StepContext {
            bucket,
            output_prefix: &self.config.output_prefix,
            artifact_name,
        };
        settle_outcome(
            &*self.store,
            &target.short_name,
            Outcome::failure(format!("target task aborted: {error}")),
            ctx,
            metrics,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ERROR_FIELD;
    use inference::{MockInferenceEndpoint, MockResponse};
    use serde_json::{json, Value};
    use std::time::Duration;
    use storage::{MemoryObjectStore, MemoryStoreConfig};

    fn dispatcher(
        store: MemoryObjectStore,
        endpoint: MockInferenceEndpoint,
        mode: DispatchMode,
    ) -> Dispatcher<MemoryObjectStore, MockInferenceEndpoint> {
        DispatcherBuilder::new(Arc::new(store), Arc::new(endpoint))
            .mode(mode)
            .build()
    }

    fn stored_json(store: &MemoryObjectStore, key: &str) -> Value {
        let object = store.object("photos", key).expect("object written");
        assert_eq!(object.content_type, "application/json");
        serde_json::from_slice(&object.body).unwrap()
    }

    #[tokio::test]
    async fn test_every_target_gets_an_outcome() {
        let d = dispatcher(
            MemoryObjectStore::new(),
            MockInferenceEndpoint::new(),
            DispatchMode::Sequential,
        );

        let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

        assert_eq!(result.len(), 4);
        assert_eq!(result.artifact_name, "cat");
        let names: Vec<&str> = result.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["mobilenet", "resnet", "mitb0", "yolos"]);
        assert_eq!(result.success_count(), 4);
    }

    #[tokio::test]
    async fn test_sequential_invokes_in_registry_order() {
        let endpoint = Arc::new(MockInferenceEndpoint::new());
        let d = DispatcherBuilder::new(Arc::new(MemoryObjectStore::new()), Arc::clone(&endpoint)).build();

        d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

        assert_eq!(
            endpoint.calls(),
            vec![
                "google/mobilenet_v1_0.75_192".to_string(),
                "microsoft/resnet-50".to_string(),
                "nvidia/mit-b0".to_string(),
                "hustvl/yolos-tiny".to_string(),
            ]
        );
        assert_eq!(endpoint.body_sizes(), vec![3, 3, 3, 3]);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_persisted() {
        let endpoint = MockInferenceEndpoint::new()
            .with_response("microsoft/resnet-50", MockResponse::Json(json!({"label": "cat"})))
            .with_response(
                "nvidia/mit-b0",
                MockResponse::Status(503, "Model is currently loading".into()),
            );
        let store = Arc::new(MemoryObjectStore::new());
        let d = DispatcherBuilder::new(Arc::clone(&store), Arc::new(endpoint)).build();

        let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

        assert_eq!(result.len(), 4);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.get("resnet"), Some(&Outcome::Success(json!({"label": "cat"}))));

        let failure = stored_json(&store, "json/mitb0_cat.json");
        let message = failure[ERROR_FIELD].as_str().unwrap();
        assert!(message.contains("503"));
        assert!(message.contains("Model is currently loading"));

        assert_eq!(stored_json(&store, "json/resnet_cat.json"), json!({"label": "cat"}));
        assert_eq!(store.put_count(), 4);
    }

    #[tokio::test]
    async fn test_persist_failure_downgrades_only_that_target() {
        let store = Arc::new(MemoryObjectStore::with_config(MemoryStoreConfig {
            fail_put_keys: vec!["json/resnet_cat.json".to_string()],
            ..Default::default()
        }));
        let d = DispatcherBuilder::new(Arc::clone(&store), Arc::new(MockInferenceEndpoint::new())).build();

        let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

        assert_eq!(result.len(), 4);
        let resnet = result.get("resnet").unwrap();
        assert!(!resnet.is_success());
        assert!(resnet.error_message().unwrap().contains("failed to persist result"));
        assert_eq!(result.success_count(), 3);
        assert_eq!(store.put_count(), 3);

        let metrics = d.metrics();
        let (_, resnet_metrics) = metrics.iter().find(|(n, _)| n == "resnet").unwrap();
        assert_eq!(resnet_metrics.persist_failure_count, 1);
        assert_eq!(resnet_metrics.success_count, 1);
    }

    #[tokio::test]
    async fn test_store_unavailable_still_reports_all_targets() {
        let store = MemoryObjectStore::with_config(MemoryStoreConfig {
            fail_all_puts: true,
            ..Default::default()
        });
        let d = dispatcher(store, MockInferenceEndpoint::new(), DispatchMode::Sequential);

        let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;
        assert_eq!(result.len(), 4);
        assert_eq!(result.failure_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential_outcomes() {
        let script = || {
            MockInferenceEndpoint::new()
                .with_response("hustvl/yolos-tiny", MockResponse::TransportError("connection reset".into()))
                .with_delay("google/mobilenet_v1_0.75_192", Duration::from_millis(30))
        };

        let seq = dispatcher(MemoryObjectStore::new(), script(), DispatchMode::Sequential)
            .run("photos", Bytes::from_static(b"PNG"), "cat")
            .await;
        let conc = dispatcher(MemoryObjectStore::new(), script(), DispatchMode::Concurrent)
            .run("photos", Bytes::from_static(b"PNG"), "cat")
            .await;

        assert_eq!(seq, conc);
        let names: Vec<&str> = conc.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["mobilenet", "resnet", "mitb0", "yolos"]);
    }

    #[tokio::test]
    async fn test_custom_registry_and_prefix() {
        let registry = TargetRegistry::new(vec![Target::new("vit", "google/vit-base-patch16-224")]).unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        let d = DispatcherBuilder::new(Arc::clone(&store), Arc::new(MockInferenceEndpoint::new()))
            .registry(registry)
            .output_prefix("results/")
            .build();

        let result = d.run("photos", Bytes::from_static(b"PNG"), "dog").await;

        assert_eq!(result.len(), 1);
        assert_eq!(store.keys("photos"), vec!["results/vit_dog.json".to_string()]);
    }

    #[tokio::test]
    async fn test_metrics_accumulate_across_runs() {
        let d = dispatcher(
            MemoryObjectStore::new(),
            MockInferenceEndpoint::new(),
            DispatchMode::Sequential,
        );
        d.run("photos", Bytes::from_static(b"PNG"), "cat").await;
        d.run("photos", Bytes::from_static(b"PNG"), "dog").await;

        for (_, snapshot) in d.metrics() {
            assert_eq!(snapshot.invocation_count, 2);
            assert_eq!(snapshot.latency_ms.count, 2);
        }
    }

    #[tokio::test]
    async fn test_panicking_target_is_reported_and_persisted() {
        for mode in [DispatchMode::Sequential, DispatchMode::Concurrent] {
            let endpoint = MockInferenceEndpoint::new()
                .with_response("hustvl/yolos-tiny", MockResponse::Panic("model crashed".into()));
            let store = Arc::new(MemoryObjectStore::new());
            let d = DispatcherBuilder::new(Arc::clone(&store), Arc::new(endpoint))
                .mode(mode)
                .build();

            let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

            assert_eq!(result.len(), 4, "{mode:?}");
            assert_eq!(result.success_count(), 3, "{mode:?}");
            let message = result.get("yolos").unwrap().error_message().unwrap();
            assert!(message.starts_with("target task aborted"), "{message}");

            assert_eq!(
                store.keys("photos"),
                vec![
                    "json/mitb0_cat.json".to_string(),
                    "json/mobilenet_cat.json".to_string(),
                    "json/resnet_cat.json".to_string(),
                    "json/yolos_cat.json".to_string(),
                ],
                "{mode:?}"
            );
            let stored = stored_json(&store, "json/yolos_cat.json");
            assert_eq!(stored[ERROR_FIELD].as_str(), Some(message));

            let metrics = d.metrics();
            let (_, yolos) = metrics.iter().find(|(n, _)| n == "yolos").unwrap();
            assert_eq!(yolos.invocation_count, 1);
            assert_eq!(yolos.failure_count, 1);
        }
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_invocation_error() {
        let store = Arc::new(MemoryObjectStore::with_config(MemoryStoreConfig {
            fail_put_keys: vec!["json/resnet_cat.json".to_string()],
            ..Default::default()
        }));
        let endpoint = MockInferenceEndpoint::new()
            .with_response("microsoft/resnet-50", MockResponse::Status(503, "Model is loading".into()));
        let d = DispatcherBuilder::new(Arc::clone(&store), Arc::new(endpoint)).build();

        let result = d.run("photos", Bytes::from_static(b"PNG"), "cat").await;

        let message = result.get("resnet").unwrap().error_message().unwrap();
        assert!(message.contains("HTTP 503"), "{message}");
        assert!(message.contains("Model is loading"), "{message}");
        assert!(
            message.contains("; failed to persist result to json/resnet_cat.json"),
            "{message}"
        );
    }
}

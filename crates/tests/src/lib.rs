//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Handler scenarios over the in-memory store and mock endpoint
//! - The full flow over the filesystem store
//! - Isolation and determinism properties

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_reference_registry_compiles_in() {
        let registry = contracts::TargetRegistry::reference();
        assert_eq!(registry.len(), 4);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{
        output_key, DispatchMode, HandlerResponse, Outcome, TargetRegistry, TriggerEvent,
        RESPONSE_MESSAGE,
    };
    use dispatcher::{DispatcherBuilder, DispatcherError, Handler};
    use inference::{MockInferenceEndpoint, MockResponse};
    use serde_json::{json, Value};
    use storage::{FsObjectStore, MemoryObjectStore, MemoryStoreConfig};

    const BUCKET: &str = "photos";
    const CAT_KEY: &str = "images/cat.png";
    const CAT_KEYS: [&str; 4] = [
        "json/mobilenet_cat.json",
        "json/resnet_cat.json",
        "json/mitb0_cat.json",
        "json/yolos_cat.json",
    ];

    fn seeded_store(config: MemoryStoreConfig) -> Arc<MemoryObjectStore> {
        let store = MemoryObjectStore::with_config(config);
        store.insert(BUCKET, CAT_KEY, Bytes::from_static(b"\x89PNG-cat"), "image/png");
        Arc::new(store)
    }

    /// Every reference model answers with its own label
    fn labelled_endpoint() -> MockInferenceEndpoint {
        TargetRegistry::reference()
            .iter()
            .fold(MockInferenceEndpoint::new(), |endpoint, target| {
                endpoint.with_response(
                    target.endpoint_reference.clone(),
                    MockResponse::Json(json!({ "label": "cat", "model": target.short_name.as_str() })),
                )
            })
    }

    fn handler(
        store: Arc<MemoryObjectStore>,
        endpoint: MockInferenceEndpoint,
        mode: DispatchMode,
    ) -> Handler<MemoryObjectStore, MockInferenceEndpoint> {
        Handler::new(
            DispatcherBuilder::new(store, Arc::new(endpoint))
                .mode(mode)
                .build(),
        )
    }

    fn body(response: &HandlerResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    fn stored_json(store: &MemoryObjectStore, key: &str) -> Value {
        let object = store
            .object(BUCKET, key)
            .unwrap_or_else(|| panic!("{key} was not written"));
        assert_eq!(object.content_type, "application/json");
        serde_json::from_slice(&object.body).unwrap()
    }

    /// All four targets succeed
    #[tokio::test]
    async fn test_scenario_all_targets_succeed() {
        let store = seeded_store(MemoryStoreConfig::default());
        let response = handler(Arc::clone(&store), labelled_endpoint(), DispatchMode::Sequential)
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        let body = body(&response);
        assert_eq!(body["message"], RESPONSE_MESSAGE);

        let results = body["results"].as_object().unwrap();
        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(names, ["mobilenet", "resnet", "mitb0", "yolos"]);
        for (name, outcome) in results {
            assert_eq!(outcome["label"], "cat", "{name}");
            assert!(outcome.get("error").is_none(), "{name}");
        }

        assert_eq!(store.put_count(), 4);
        for key in CAT_KEYS {
            assert_eq!(stored_json(&store, key)["label"], "cat");
        }
    }

    /// One target fails in transport, the other three succeed
    #[tokio::test]
    async fn test_scenario_one_target_transport_error() {
        let store = seeded_store(MemoryStoreConfig::default());
        let endpoint = labelled_endpoint().with_response(
            "hustvl/yolos-tiny",
            MockResponse::TransportError("connection reset by peer".to_string()),
        );

        let response = handler(Arc::clone(&store), endpoint, DispatchMode::Sequential)
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        let results = body(&response)["results"].clone();
        assert_eq!(results["mobilenet"]["label"], "cat");
        assert_eq!(results["resnet"]["label"], "cat");
        assert_eq!(results["mitb0"]["label"], "cat");

        let error = results["yolos"]["error"].as_str().unwrap();
        assert!(error.contains("connection reset by peer"), "{error}");

        assert_eq!(store.put_count(), 4);
        for key in CAT_KEYS {
            assert!(store.object(BUCKET, key).is_some(), "{key} missing");
        }
        assert_eq!(
            stored_json(&store, "json/yolos_cat.json")["error"].as_str(),
            Some(error)
        );
    }

    /// Source fetch fails: no writes and no result
    #[tokio::test]
    async fn test_scenario_missing_artifact() {
        let store = Arc::new(MemoryObjectStore::new());
        let endpoint = labelled_endpoint();

        let handler = handler(Arc::clone(&store), endpoint, DispatchMode::Sequential);
        let err = handler
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatcherError::Fetch { .. }));
        assert!(err.is_not_found());
        assert_eq!(store.put_count(), 0);
        assert!(store.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_fails_without_invocations() {
        let store = seeded_store(MemoryStoreConfig {
            fail_all_gets: true,
            ..Default::default()
        });
        let endpoint = Arc::new(MockInferenceEndpoint::new());
        let handler = Handler::new(DispatcherBuilder::new(Arc::clone(&store), Arc::clone(&endpoint)).build());

        let err = handler
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap_err();

        assert!(!err.is_not_found());
        assert!(endpoint.calls().is_empty());
        assert_eq!(store.put_count(), 0);
    }

    /// Every target ends up in the result, whatever the mix of failures
    #[tokio::test]
    async fn test_every_target_reported_in_both_modes() {
        for mode in [DispatchMode::Sequential, DispatchMode::Concurrent] {
            let store = seeded_store(MemoryStoreConfig {
                fail_put_keys: vec!["json/resnet_cat.json".to_string()],
                ..Default::default()
            });
            let endpoint = MockInferenceEndpoint::new()
                .with_response("google/mobilenet_v1_0.75_192", MockResponse::Status(503, "loading".into()))
                .with_response("nvidia/mit-b0", MockResponse::TransportError("timed out".into()))
                .with_delay("hustvl/yolos-tiny", Duration::from_millis(50));

            let result = handler(Arc::clone(&store), endpoint, mode)
                .handle_location(&contracts::ObjectLocation::new(BUCKET, CAT_KEY))
                .await
                .unwrap();

            assert_eq!(result.len(), 4, "{mode:?}");
            assert_eq!(result.success_count(), 1, "{mode:?}");
            assert_eq!(result.failure_count(), 3, "{mode:?}");

            let names: Vec<&str> = result.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, ["mobilenet", "resnet", "mitb0", "yolos"], "{mode:?}");

            assert!(result.get("yolos").unwrap().is_success());
            let persist_error = result.get("resnet").unwrap().error_message().unwrap();
            assert!(
                persist_error.starts_with("failed to persist result to json/resnet_cat.json"),
                "{persist_error}"
            );
            // The failed write is the only one missing
            assert_eq!(store.put_count(), 3, "{mode:?}");
        }
    }

    /// A failing target leaves the others' outcomes untouched
    #[tokio::test]
    async fn test_failure_does_not_alter_other_outcomes() {
        let baseline_store = seeded_store(MemoryStoreConfig::default());
        let baseline = handler(Arc::clone(&baseline_store), labelled_endpoint(), DispatchMode::Concurrent)
            .handle_location(&contracts::ObjectLocation::new(BUCKET, CAT_KEY))
            .await
            .unwrap();

        let store = seeded_store(MemoryStoreConfig::default());
        let endpoint = labelled_endpoint()
            .with_response("microsoft/resnet-50", MockResponse::Status(500, "boom".into()));
        let degraded = handler(Arc::clone(&store), endpoint, DispatchMode::Concurrent)
            .handle_location(&contracts::ObjectLocation::new(BUCKET, CAT_KEY))
            .await
            .unwrap();

        for name in ["mobilenet", "mitb0", "yolos"] {
            assert_eq!(baseline.get(name), degraded.get(name), "{name}");
        }
        assert!(!degraded.get("resnet").unwrap().is_success());
    }

    /// Persisted success documents are exactly the remote payload
    #[tokio::test]
    async fn test_persisted_success_matches_payload() {
        let payload = json!([
            { "label": "tabby, tabby cat", "score": 0.81 },
            { "label": "Egyptian cat", "score": 0.12 }
        ]);
        let store = seeded_store(MemoryStoreConfig::default());
        let endpoint = MockInferenceEndpoint::new()
            .with_response("microsoft/resnet-50", MockResponse::Json(payload.clone()));

        let result = handler(Arc::clone(&store), endpoint, DispatchMode::Sequential)
            .handle_location(&contracts::ObjectLocation::new(BUCKET, CAT_KEY))
            .await
            .unwrap();

        assert_eq!(result.get("resnet"), Some(&Outcome::Success(payload.clone())));
        assert_eq!(stored_json(&store, "json/resnet_cat.json"), payload);
    }

    /// Persisted failure documents always carry a non-empty error
    #[tokio::test]
    async fn test_persisted_failure_has_error_field() {
        let store = seeded_store(MemoryStoreConfig::default());
        let endpoint = MockInferenceEndpoint::new()
            .with_response("nvidia/mit-b0", MockResponse::TransportError(String::new()))
            .with_response("hustvl/yolos-tiny", MockResponse::Status(429, "rate limited".into()));

        handler(Arc::clone(&store), endpoint, DispatchMode::Sequential)
            .handle_location(&contracts::ObjectLocation::new(BUCKET, CAT_KEY))
            .await
            .unwrap();

        for key in ["json/mitb0_cat.json", "json/yolos_cat.json"] {
            let document = stored_json(&store, key);
            let object = document.as_object().unwrap();
            assert_eq!(object.len(), 1, "{key}");
            let error = object["error"].as_str().unwrap();
            assert!(!error.trim().is_empty(), "{key}");
        }
    }

    /// Same artifact twice: same keys, and a rerun overwrites
    #[tokio::test]
    async fn test_rerun_writes_same_keys() {
        let store = seeded_store(MemoryStoreConfig::default());
        let handler = handler(Arc::clone(&store), labelled_endpoint(), DispatchMode::Sequential);
        let event = TriggerEvent::for_object(BUCKET, CAT_KEY);

        handler.handle(&event).await.unwrap();
        let first = store.keys(BUCKET);
        handler.handle(&event).await.unwrap();
        let second = store.keys(BUCKET);

        assert_eq!(first, second);
        assert_eq!(store.put_count(), 8);
        for target in TargetRegistry::reference().iter() {
            let key = output_key("json", &target.short_name, "cat");
            assert!(second.contains(&key), "{key}");
        }
    }

    #[tokio::test]
    async fn test_artifact_bytes_reach_every_target() {
        let store = seeded_store(MemoryStoreConfig::default());
        let endpoint = Arc::new(MockInferenceEndpoint::new());
        let handler = Handler::new(DispatcherBuilder::new(Arc::clone(&store), Arc::clone(&endpoint)).build());

        handler
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap();

        assert_eq!(
            endpoint.calls(),
            [
                "google/mobilenet_v1_0.75_192",
                "microsoft/resnet-50",
                "nvidia/mit-b0",
                "hustvl/yolos-tiny"
            ]
        );
        assert_eq!(endpoint.body_sizes(), [8, 8, 8, 8]);
    }

    /// Full flow over the filesystem store
    #[tokio::test]
    async fn test_filesystem_store_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join(BUCKET).join("uploads");
        std::fs::create_dir_all(&image_dir).unwrap();
        std::fs::write(image_dir.join("dog.v2.jpeg"), b"JPEG").unwrap();

        let store = Arc::new(FsObjectStore::new(dir.path()));
        let endpoint = Arc::new(
            MockInferenceEndpoint::new()
                .with_response("hustvl/yolos-tiny", MockResponse::TransportError("refused".into())),
        );
        let handler = Handler::new(
            DispatcherBuilder::new(Arc::clone(&store), endpoint)
                .mode(DispatchMode::Concurrent)
                .build(),
        );

        let response = handler
            .handle(&TriggerEvent::for_object(BUCKET, "uploads/dog.v2.jpeg"))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);

        let json_dir = dir.path().join(BUCKET).join("json");
        for name in ["mobilenet", "resnet", "mitb0", "yolos"] {
            let path = json_dir.join(format!("{name}_dog.json"));
            let document: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            if name == "yolos" {
                assert!(document["error"].as_str().unwrap().contains("refused"));
            } else {
                assert_eq!(document[0]["score"], 1.0);
            }
        }

        assert_eq!(
            store
                .content_type(BUCKET, "json/resnet_dog.json")
                .await
                .unwrap()
                .as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_filesystem_missing_artifact_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsObjectStore::new(dir.path()));
        let handler = Handler::new(
            DispatcherBuilder::new(store, Arc::new(MockInferenceEndpoint::new())).build(),
        );

        let err = handler
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!dir.path().join(BUCKET).join("json").exists());
    }

    /// Settings file drives the dispatcher configuration
    #[tokio::test]
    async fn test_settings_drive_dispatcher() {
        let settings = config_loader::ConfigLoader::load_from_str(
            "[storage]\noutput_prefix = \"results/\"\n\n[dispatch]\nmode = \"concurrent\"\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let store = seeded_store(MemoryStoreConfig::default());
        let dispatcher = DispatcherBuilder::new(Arc::clone(&store), Arc::new(MockInferenceEndpoint::new()))
            .config(dispatcher::DispatcherConfig::from_settings(&settings))
            .build();
        assert_eq!(dispatcher.config().mode, DispatchMode::Concurrent);

        Handler::new(dispatcher)
            .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
            .await
            .unwrap();

        assert!(store.object(BUCKET, "results/mobilenet_cat.json").is_some());
        assert!(store.object(BUCKET, "json/mobilenet_cat.json").is_none());
    }

    /// A target that panics still gets its document, in both modes
    #[tokio::test]
    async fn test_panicking_target_still_written() {
        for mode in [DispatchMode::Sequential, DispatchMode::Concurrent] {
            let store = seeded_store(MemoryStoreConfig::default());
            let endpoint = labelled_endpoint()
                .with_response("hustvl/yolos-tiny", MockResponse::Panic("provider bug".into()));

            let response = handler(Arc::clone(&store), endpoint, mode)
                .handle(&TriggerEvent::for_object(BUCKET, CAT_KEY))
                .await
                .unwrap();

            let results = body(&response)["results"].clone();
            assert_eq!(results.as_object().unwrap().len(), 4, "{mode:?}");
            assert!(results["yolos"]["error"].as_str().unwrap().starts_with("target task aborted"));
            for key in CAT_KEYS {
                assert!(store.object(BUCKET, key).is_some(), "{mode:?}: {key} missing");
            }
        }
    }
}

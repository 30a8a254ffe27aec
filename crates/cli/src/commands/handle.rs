//! `handle` command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use config_loader::ConfigLoader;
use contracts::{DispatchMode, DispatchSettings, TriggerEvent};
use dispatcher::{DispatcherBuilder, DispatcherConfig, Handler};
use inference::HttpInferenceEndpoint;
use storage::FsObjectStore;

use crate::cli::{EventSource, HandleArgs};
use crate::error::{self, CliError};

/// Execute the `handle` command
///
/// Prints the response envelope on stdout. Fails when the artifact cannot be
/// fetched; individual target failures do not fail the command.
pub async fn run_handle(args: &HandleArgs) -> Result<()> {
    let settings = build_settings(args)?;
    let credentials = ConfigLoader::credentials_from_env(&settings).map_err(CliError::from)?;

    let event = load_event(&args.source).await?;

    info!(
        store_root = %settings.storage.root.display(),
        base_url = %settings.inference.base_url,
        mode = ?settings.dispatch.mode,
        "Settings loaded"
    );

    let store = Arc::new(FsObjectStore::new(settings.storage.root.clone()));
    let endpoint = Arc::new(
        HttpInferenceEndpoint::from_settings(&settings.inference, &credentials)
            .map_err(CliError::from)?,
    );

    let dispatcher = DispatcherBuilder::new(store, endpoint)
        .config(DispatcherConfig::from_settings(&settings))
        .build();
    let handler = Handler::new(dispatcher);

    let response = handler.handle(&event).await.map_err(CliError::from)?;

    for (target, snapshot) in handler.dispatcher().metrics() {
        debug!(
            target = %target,
            successes = snapshot.success_count,
            failures = snapshot.failure_count,
            persist_failures = snapshot.persist_failure_count,
            mean_latency_ms = snapshot.latency_ms.mean,
            "Target summary"
        );
    }

    let json =
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?;
    println!("{json}");

    Ok(())
}

/// Settings from file (or defaults) with CLI overrides applied, then validated
fn build_settings(args: &HandleArgs) -> Result<DispatchSettings> {
    let mut settings = ConfigLoader::load_or_default(args.config.as_deref()).with_context(|| {
        match &args.config {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Default settings are invalid".to_string(),
        }
    })?;

    if let Some(ref root) = args.store_root {
        info!(root = %root.display(), "Overriding store root from CLI");
        settings.storage.root = root.clone();
    }
    if let Some(ref base_url) = args.base_url {
        info!(base_url = %base_url, "Overriding inference base URL from CLI");
        settings.inference.base_url = base_url.clone();
    }
    if args.concurrent {
        settings.dispatch.mode = DispatchMode::Concurrent;
    }

    ConfigLoader::validate(&settings).context("Settings invalid after CLI overrides")?;
    Ok(settings)
}

/// Build the trigger event from a file, stdin, or a bucket/key pair
async fn load_event(source: &EventSource) -> error::Result<TriggerEvent> {
    if let (Some(bucket), Some(key)) = (&source.bucket, &source.key) {
        return Ok(TriggerEvent::for_object(bucket.clone(), key.clone()));
    }

    let path = source
        .event
        .as_ref()
        .ok_or_else(|| CliError::event_input("either --event or --bucket/--key is required"))?;

    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        if !path.exists() {
            return Err(CliError::event_not_found(path.display().to_string()));
        }
        tokio::fs::read_to_string(path).await?
    };

    let event = TriggerEvent::from_json(&text).map_err(|e| CliError::event_input(e.to_string()))?;
    // Surface a missing location here rather than after client set-up
    event
        .source_location()
        .map_err(|e| CliError::event_input(e.to_string()))?;
    Ok(event)
}

//! HttpInferenceEndpoint - hosted inference API over HTTPS

use bytes::Bytes;
use contracts::{ContractError, Credentials, InferenceEndpoint, InferenceSettings};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::InferenceError;

/// Longest error body echoed into a failure message
const MAX_ERROR_BODY: usize = 512;

/// Configuration for HttpInferenceEndpoint
#[derive(Debug, Clone)]
pub struct HttpEndpointConfig {
    /// Base URL, without the `/models/...` suffix
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl From<&InferenceSettings> for HttpEndpointConfig {
    fn from(settings: &InferenceSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Endpoint that POSTs the artifact bytes to one model per call
///
/// The client and its bearer header are built once and shared by every call.
#[derive(Debug, Clone)]
pub struct HttpInferenceEndpoint {
    name: String,
    config: HttpEndpointConfig,
    client: reqwest::Client,
}

impl HttpInferenceEndpoint {
    /// Create a new endpoint
    ///
    /// # Errors
    /// `Setup` if the token is not a valid header value or the client cannot be built
    pub fn new(
        config: HttpEndpointConfig,
        credentials: &Credentials,
    ) -> Result<Self, InferenceError> {
        let mut auth = HeaderValue::from_str(&credentials.bearer_header())
            .map_err(|e| InferenceError::Setup(format!("invalid bearer token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::Setup(e.to_string()))?;

        debug!(base_url = %config.base_url, timeout = ?config.timeout, "HTTP inference endpoint ready");

        Ok(Self {
            name: "http".to_string(),
            config,
            client,
        })
    }

    /// Create from settings (for the CLI)
    pub fn from_settings(
        settings: &InferenceSettings,
        credentials: &Credentials,
    ) -> Result<Self, ContractError> {
        Self::new(HttpEndpointConfig::from(settings), credentials)
            .map_err(|e| ContractError::config_validation("inference", e.to_string()))
    }

    /// URL a model is addressed at
    pub fn model_url(&self, model_id: &str) -> String {
        format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            model_id
        )
    }

    async fn post(&self, model_id: &str, body: Bytes) -> Result<Value, InferenceError> {
        let response = self.client.post(self.model_url(model_id)).body(body).send().await?;

        let status = response.status();
        let payload = response.bytes().await?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&payload);
            let body = truncate(text.trim(), MAX_ERROR_BODY);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice(&payload)?)
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl InferenceEndpoint for HttpInferenceEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_endpoint_invoke",
        skip(self, body),
        fields(endpoint = %self.name, bytes = body.len())
    )]
    async fn invoke(&self, model_id: &str, body: Bytes) -> Result<Value, ContractError> {
        match self.post(model_id, body).await {
            Ok(value) => {
                debug!(model = model_id, "Inference succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(model = model_id, error = %e, "Inference failed");
                Err(e.for_model(model_id))
            }
        }
    }
}

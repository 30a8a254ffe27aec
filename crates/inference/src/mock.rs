//! Mock inference endpoint
//!
//! Scripted per-model responses with optional latency, for tests.

use bytes::Bytes;
use contracts::{ContractError, InferenceEndpoint};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::instrument;

use crate::error::InferenceError;

/// Scripted reply for one model
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this document
    Json(Value),
    /// Fail as if the connection broke
    TransportError(String),
    /// Fail as if the remote answered with this status
    Status(u16, String),
    /// Panic inside the call, like a provider with a bug
    Panic(String),
}

/// Mock endpoint
///
/// Models without a scripted reply answer `[{"label": <model_id>, "score": 1.0}]`.
#[derive(Debug, Default)]
pub struct MockInferenceEndpoint {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockInferenceEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for `model_id`
    pub fn with_response(mut self, model_id: impl Into<String>, response: MockResponse) -> Self {
        self.responses.insert(model_id.into(), response);
        self
    }

    /// Delay every reply for `model_id`
    pub fn with_delay(mut self, model_id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(model_id.into(), delay);
        self
    }

    fn calls_guard(&self) -> MutexGuard<'_, Vec<(String, usize)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Model ids invoked so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls_guard().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Body sizes received so far, in call order
    pub fn body_sizes(&self) -> Vec<usize> {
        self.calls_guard().iter().map(|(_, n)| *n).collect()
    }

    fn reply(&self, model_id: &str) -> Result<Value, InferenceError> {
        match self.responses.get(model_id) {
            Some(MockResponse::Json(value)) => Ok(value.clone()),
            Some(MockResponse::TransportError(message)) => {
                Err(InferenceError::Transport(message.clone()))
            }
            Some(MockResponse::Status(status, body)) => Err(InferenceError::Status {
                status: *status,
                body: body.clone(),
            }),
            Some(MockResponse::Panic(message)) => panic!("{message}"),
            None => Ok(json!([{ "label": model_id, "score": 1.0 }])),
        }
    }
}

impl InferenceEndpoint for MockInferenceEndpoint {
    fn name(&self) -> &str {
        "mock"
    }

    #[instrument(name = "mock_endpoint_invoke", skip(self, body))]
    async fn invoke(&self, model_id: &str, body: Bytes) -> Result<Value, ContractError> {
        self.calls_guard().push((model_id.to_string(), body.len()));

        if let Some(delay) = self.delays.get(model_id) {
            tokio::time::sleep(*delay).await;
        }

        self.reply(model_id).map_err(|e| e.for_model(model_id))
    }
}

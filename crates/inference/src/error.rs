//! Inference error types

use contracts::ContractError;
use thiserror::Error;

/// Inference-specific errors
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Request could not be sent or the response could not be read
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote answered with a non-success status
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body is not a JSON document
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// HTTP client could not be built
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl InferenceError {
    /// Attach the model id, producing the shared error type
    pub fn for_model(self, model_id: &str) -> ContractError {
        ContractError::inference(model_id, self.to_string())
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

//! InferenceEndpoint trait - remote model invocation
//!
//! Defines the abstract interface for inference providers.

use bytes::Bytes;
use serde_json::Value;

use crate::ContractError;

/// Inference provider trait
///
/// One call submits the raw artifact bytes to one model.
#[trait_variant::make(InferenceEndpoint: Send)]
pub trait LocalInferenceEndpoint {
    /// Provider name (used for logging)
    fn name(&self) -> &str;

    /// Submit `body` to the model identified by `model_id`
    ///
    /// # Errors
    /// `Inference` for transport failures, non-success status, or a
    /// response body that is not JSON
    async fn invoke(&self, model_id: &str, body: Bytes) -> Result<Value, ContractError>;
}

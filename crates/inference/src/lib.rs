//! # Inference
//!
//! Inference endpoint implementations.
//!
//! - [`HttpInferenceEndpoint`]: bearer-authenticated POST of the raw image to
//!   `{base_url}/models/{model_id}`
//! - [`MockInferenceEndpoint`]: scripted per-model responses for tests

pub mod error;
mod http;
mod mock;

pub use contracts::InferenceEndpoint;
pub use error::InferenceError;
pub use http::{HttpEndpointConfig, HttpInferenceEndpoint};
pub use mock::{MockInferenceEndpoint, MockResponse};

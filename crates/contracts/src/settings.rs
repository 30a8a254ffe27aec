//! DispatchSettings - Config Loader output
//!
//! Runtime settings for the collaborators around the dispatcher. The target
//! registry itself is compiled in and is not part of these settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::DEFAULT_OUTPUT_PREFIX;

/// Complete runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Inference provider settings
    #[serde(default)]
    pub inference: InferenceSettings,

    /// Object store settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Fan-out behaviour
    #[serde(default)]
    pub dispatch: DispatchOptions,
}

/// Inference provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    /// Base URL; models are addressed as `{base_url}/models/{model_id}`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_token_env() -> String {
    "HF_API_TOKEN".to_string()
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

/// Object store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory of the filesystem store; each bucket is a subdirectory
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Key prefix for per-target documents
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./buckets")
}

fn default_output_prefix() -> String {
    DEFAULT_OUTPUT_PREFIX.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            output_prefix: default_output_prefix(),
        }
    }
}

/// Fan-out behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOptions {
    #[serde(default)]
    pub mode: DispatchMode,
}

/// How targets of one run are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One target invoked and persisted fully before the next
    #[default]
    Sequential,
    /// All targets in flight at once; results still reported in registry order
    Concurrent,
}

/// Bearer token for the inference provider
///
/// `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `Authorization` header value
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

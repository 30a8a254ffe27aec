//! Outcome - per-target result of one dispatch
//!
//! Serialized form:
//! - `Success` is the raw payload returned by the endpoint
//! - `Failure` is `{"error": "<message>"}`

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Field carrying the failure description in a persisted document
pub const ERROR_FIELD: &str = "error";

/// Tagged per-target result
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Endpoint returned a JSON document
    Success(Value),
    /// Invocation or persistence failed; human-readable description
    Failure(String),
}

impl Outcome {
    /// Build a failure outcome; an empty description is replaced so the
    /// persisted error field is never blank.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Failure("unknown error".to_string())
        } else {
            Self::Failure(message)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure description, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(message) => Some(message),
        }
    }

    /// JSON document persisted and reported for this outcome
    pub fn to_document(&self) -> Value {
        match self {
            Self::Success(payload) => payload.clone(),
            Self::Failure(message) => json!({ ERROR_FIELD: message }),
        }
    }

    /// Pretty-printed document bytes (2-space indentation)
    pub fn to_document_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Success(payload) => serde_json::to_vec_pretty(payload),
            Self::Failure(_) => serde_json::to_vec_pretty(&self.to_document()),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Success(payload) => payload.serialize(serializer),
            Self::Failure(message) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ERROR_FIELD, message)?;
                map.end()
            }
        }
    }
}

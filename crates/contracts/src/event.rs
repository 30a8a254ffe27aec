//! Trigger event and object addressing
//!
//! The trigger is a storage notification in the S3 record layout:
//! `{"Records":[{"s3":{"bucket":{"name":..},"object":{"key":..}}}]}`.
//! Only the first record is dispatched.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Key prefix under which per-target documents are written
pub const DEFAULT_OUTPUT_PREFIX: &str = "json";

/// Content type tag for persisted documents
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Storage notification delivered by the hosting platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
}

impl TriggerEvent {
    /// Build a single-record event (used by the CLI and tests)
    pub fn for_object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            records: vec![EventRecord {
                s3: S3Entity {
                    bucket: BucketEntity { name: bucket.into() },
                    object: ObjectEntity { key: key.into() },
                },
            }],
        }
    }

    /// Parse an event from its JSON text
    pub fn from_json(text: &str) -> Result<Self, ContractError> {
        serde_json::from_str(text)
            .map_err(|e| ContractError::invalid_event(format!("malformed event JSON: {e}")))
    }

    /// Location of the source artifact named by the first record
    ///
    /// # Errors
    /// `InvalidEvent` when there are no records or bucket/key is empty.
    pub fn source_location(&self) -> Result<ObjectLocation, ContractError> {
        let record = self
            .records
            .first()
            .ok_or_else(|| ContractError::invalid_event("event contains no records"))?;

        let bucket = &record.s3.bucket.name;
        let key = &record.s3.object.key;
        if bucket.is_empty() {
            return Err(ContractError::invalid_event("record has an empty bucket name"));
        }
        if key.is_empty() {
            return Err(ContractError::invalid_event("record has an empty object key"));
        }

        Ok(ObjectLocation::new(bucket.clone(), key.clone()))
    }
}

/// A (bucket, key) pair in the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Base name of the object, see [`artifact_base_name`]
    pub fn artifact_base_name(&self) -> &str {
        artifact_base_name(&self.key)
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Final path segment of `key`, cut before its first `.`
///
/// `images/cat.png` -> `cat`, `a/b.tar.gz` -> `b`, `noext` -> `noext`.
pub fn artifact_base_name(key: &str) -> &str {
    let segment = key.rsplit_once('/').map_or(key, |(_, last)| last);
    segment.split_once('.').map_or(segment, |(base, _)| base)
}

/// Output key for one target's document: `{prefix}/{short_name}_{base}.json`
pub fn output_key(prefix: &str, short_name: &str, artifact_base_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    format!("{prefix}/{short_name}_{artifact_base_name}.json")
}

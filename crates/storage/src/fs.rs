//! FsObjectStore - buckets as directories on local disk
//!
//! Layout under `root`:
//! - `{bucket}/{key}`: object body
//! - `.metadata/{bucket}/{key}.json`: content type and size

use bytes::Bytes;
use contracts::{ContractError, ObjectStore};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::check_key;

const METADATA_DIR: &str = ".metadata";

/// Sidecar record written next to every object
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectMetadata {
    content_type: String,
    size: usize,
}

/// Filesystem-backed object store
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    name: String,
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`; the directory is created lazily on write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            name: "fs".to_string(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root
            .join(METADATA_DIR)
            .join(bucket)
            .join(format!("{key}.json"))
    }

    /// Content type recorded for an object, if it was written by this store
    pub async fn content_type(&self, bucket: &str, key: &str) -> Result<Option<String>, ContractError> {
        check_key(bucket, key)?;
        match tokio::fs::read(self.metadata_path(bucket, key)).await {
            Ok(raw) => {
                let meta: ObjectMetadata = serde_json::from_slice(&raw)?;
                Ok(Some(meta.content_type))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ContractError::storage(bucket, key, e.to_string())),
        }
    }

    async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data).await
    }
}

impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "fs_store_get", skip(self), fields(store = %self.name))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError> {
        check_key(bucket, key)?;
        let path = self.object_path(bucket, key);

        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "Object read");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ContractError::not_found(bucket, key)),
            Err(e) => Err(ContractError::storage(bucket, key, e.to_string())),
        }
    }

    #[instrument(
        name = "fs_store_put",
        skip(self, body),
        fields(store = %self.name, bytes = body.len())
    )]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ContractError> {
        check_key(bucket, key)?;
        let path = self.object_path(bucket, key);

        Self::write_file(&path, &body)
            .await
            .map_err(|e| ContractError::storage(bucket, key, e.to_string()))?;

        let meta = serde_json::to_vec(&ObjectMetadata {
            content_type: content_type.to_string(),
            size: body.len(),
        })?;
        Self::write_file(&self.metadata_path(bucket, key), &meta)
            .await
            .map_err(|e| ContractError::storage(bucket, key, e.to_string()))?;

        debug!(path = %path.display(), "Object written");
        Ok(())
    }
}

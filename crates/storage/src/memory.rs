//! In-memory object store
//!
//! Used by unit and end-to-end tests; supports injecting read and write failures.

use bytes::Bytes;
use contracts::{ContractError, ObjectStore};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

use crate::check_key;

/// Failure injection settings
#[derive(Debug, Default, Clone)]
pub struct MemoryStoreConfig {
    /// Keys whose `put` fails with a storage error
    pub fail_put_keys: Vec<String>,
    /// Every `put` fails (store unavailable)
    pub fail_all_puts: bool,
    /// Every `get` fails with a storage error rather than not-found
    pub fail_all_gets: bool,
}

/// Stored body plus its content type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

type ObjectKey = (String, String);

/// Mutex-guarded map of `(bucket, key) -> object`
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    config: MemoryStoreConfig,
    objects: Mutex<BTreeMap<ObjectKey, StoredObject>>,
    put_count: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<ObjectKey, StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an object directly, bypassing failure injection
    pub fn insert(
        &self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) {
        self.objects().insert(
            (bucket.into(), key.into()),
            StoredObject {
                body: body.into(),
                content_type: content_type.into(),
            },
        );
    }

    /// Snapshot of one object
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys currently held in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Number of successful `put` calls
    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::Relaxed)
    }

    fn should_fail_put(&self, key: &str) -> bool {
        self.config.fail_all_puts || self.config.fail_put_keys.iter().any(|k| k == key)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(name = "memory_store_get", skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError> {
        check_key(bucket, key)?;
        if self.config.fail_all_gets {
            return Err(ContractError::storage(bucket, key, "injected read failure"));
        }
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| ContractError::not_found(bucket, key))
    }

    #[instrument(name = "memory_store_put", skip(self, body), fields(bytes = body.len()))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ContractError> {
        check_key(bucket, key)?;
        if self.should_fail_put(key) {
            return Err(ContractError::storage(bucket, key, "injected write failure"));
        }
        self.insert(bucket, key, body, content_type);
        self.put_count.fetch_add(1, Ordering::Relaxed);
        debug!(bucket, key, "Object stored");
        Ok(())
    }
}

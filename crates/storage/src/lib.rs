//! # Storage
//!
//! Storage backends for source artifacts and per-target documents.
//!
//! - [`FsObjectStore`]: buckets as directories under a root path
//! - [`MemoryObjectStore`]: in-process store with failure injection, for tests

mod fs;
mod memory;

pub use contracts::{ContractError, ObjectStore};
pub use fs::FsObjectStore;
pub use memory::{MemoryObjectStore, MemoryStoreConfig, StoredObject};

/// Reject keys that would escape their bucket directory
pub(crate) fn check_key(bucket: &str, key: &str) -> Result<(), ContractError> {
    let bad_bucket = bucket.is_empty() || bucket.contains('/') || bucket.starts_with('.');
    if bad_bucket {
        return Err(ContractError::storage(bucket, key, "invalid bucket name"));
    }
    let bad_key = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part == ".." || part == ".");
    if bad_key {
        return Err(ContractError::storage(bucket, key, "invalid object key"));
    }
    Ok(())
}

//! ObjectStore trait - artifact source and result destination
//!
//! Defines the abstract interface for object storage backends.

use bytes::Bytes;

use crate::ContractError;

/// Object storage trait
///
/// All storage backends must implement this trait.
#[trait_variant::make(ObjectStore: Send)]
pub trait LocalObjectStore {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// Read an object's full body
    ///
    /// # Errors
    /// `ObjectNotFound` when the key is absent, `Storage` for any other failure
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ContractError>;

    /// Write an object, replacing any existing body under the same key
    ///
    /// # Errors
    /// `Storage` when the backend rejects or cannot complete the write
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), ContractError>;
}

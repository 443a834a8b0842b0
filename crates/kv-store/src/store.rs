use std::sync::Arc;

use async_trait::async_trait;

use crate::{Result, StoreError};

/// Core trait for durable key-value store implementations.
///
/// Values are opaque byte blobs. A completed `put` replaces the whole value
/// for its key; a subsequent `get` returns either the previous value or the
/// new one, never a mix. The store provides no transactions across keys.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns None if the key has never been written or was deleted.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replaces the value stored under `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Extension trait providing convenience methods for key-value stores.
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Checks if a value exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

// Blanket implementation for all KeyValueStore implementations
impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

/// Maximum key length accepted by every backend.
pub const MAX_KEY_LEN: usize = 255;

/// Validates a key before it reaches a backend.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty",
        });
    }

    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key is longer than 255 bytes",
        });
    }

    if key.chars().any(char::is_control) {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not contain control characters",
        });
    }

    Ok(())
}

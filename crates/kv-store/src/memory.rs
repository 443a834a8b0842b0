use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{KeyValueStore, Result, StoreError, store::validate_key};

#[derive(Debug, Default)]
struct FailurePlan {
    fail_on_put: bool,
    fail_next_puts: usize,
}

/// In-memory key-value store for testing.
///
/// Clones share the same underlying map, so a test can keep one handle for
/// inspection and failure injection while the ledger owns another.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failures: Arc<RwLock<FailurePlan>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clears all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Makes every `put` fail until switched off again.
    pub async fn set_fail_on_put(&self, fail: bool) {
        self.failures.write().await.fail_on_put = fail;
    }

    /// Makes the next `count` calls to `put` fail.
    pub async fn fail_next_puts(&self, count: usize) {
        self.failures.write().await.fail_next_puts = count;
    }

    async fn take_put_failure(&self) -> bool {
        let mut plan = self.failures.write().await;
        if plan.fail_on_put {
            return true;
        }
        if plan.fail_next_puts > 0 {
            plan.fail_next_puts -= 1;
            return true;
        }
        false
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;

        if self.take_put_failure().await {
            return Err(StoreError::Unavailable(format!(
                "injected failure writing {key}"
            )));
        }

        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

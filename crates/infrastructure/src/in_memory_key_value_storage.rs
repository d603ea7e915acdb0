use std::collections::HashMap;

use async_trait::async_trait;
use projecttracker_application::KeyValueStorage;
use projecttracker_core::AppResult;
use tokio::sync::RwLock;

/// In-memory storage adapter; contents live as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStorage {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryKeyValueStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

//! In-memory `KeyValueStore` for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DatabaseError;
use crate::store::traits::{KeyValueStore, StateWrite};

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all scopes.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn entry_key(scope: &str, key: &str) -> (String, String) {
    (scope.to_string(), key.to_string())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        Ok(self.entries.read().await.get(&entry_key(scope, key)).cloned())
    }

    async fn set(
        &self,
        scope: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        self.entries
            .write()
            .await
            .insert(entry_key(scope, key), value.clone());
        Ok(())
    }

    async fn delete(&self, scope: &str, key: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .entries
            .write()
            .await
            .remove(&entry_key(scope, key))
            .is_some())
    }

    async fn commit(&self, writes: &[StateWrite]) -> Result<(), DatabaseError> {
        // One write guard for the whole batch: readers never see half a turn.
        let mut entries = self.entries.write().await;
        for write in writes {
            match write {
                StateWrite::Set { scope, key, value } => {
                    entries.insert(entry_key(scope, key), value.clone());
                }
                StateWrite::Delete { scope, key } => {
                    entries.remove(&entry_key(scope, key));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        store
            .set("user", "u1", &serde_json::json!({"name": "Ken"}))
            .await
            .unwrap();

        let fetched = store.get("user", "u1").await.unwrap().unwrap();
        assert_eq!(fetched["name"], "Ken");

        assert!(store.delete("user", "u1").await.unwrap());
        assert!(store.get("user", "u1").await.unwrap().is_none());
        assert!(!store.delete("user", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = MemoryStore::new();
        store.set("user", "same", &serde_json::json!(1)).await.unwrap();
        store
            .set("conversation", "same", &serde_json::json!(2))
            .await
            .unwrap();

        assert_eq!(store.get("user", "same").await.unwrap().unwrap(), 1);
        assert_eq!(store.get("conversation", "same").await.unwrap().unwrap(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn commit_applies_writes_in_order() {
        let store = MemoryStore::new();
        store.set("user", "u1", &serde_json::json!("old")).await.unwrap();

        store
            .commit(&[
                StateWrite::set("user", "u1", serde_json::json!("new")),
                StateWrite::delete("user", "u1"),
                StateWrite::set("conversation", "c1", serde_json::json!({"dialog_stack": []})),
            ])
            .await
            .unwrap();

        assert!(store.get("user", "u1").await.unwrap().is_none());
        assert!(store.get("conversation", "c1").await.unwrap().is_some());
    }
}

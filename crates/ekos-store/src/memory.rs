//! In-process document store for development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{DocumentStore, StoredDocument};
use crate::error::{StoreError, StoreResult};

type Collection = BTreeMap<String, StoredDocument>;

/// Document store backed by a map behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists(path(collection, id)));
        }
        let doc = StoredDocument {
            id: id.to_string(),
            version: 1,
            data,
            update_time: Utc::now(),
        };
        docs.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> StoreResult<StoredDocument> {
        let mut guard = self.collections.write().await;
        let current = guard
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(path(collection, id)))?;

        if current.version != expected_version {
            return Err(StoreError::PreconditionFailed(format!(
                "{} is at version {}, expected {}",
                path(collection, id),
                current.version,
                expected_version
            )));
        }

        current.version += 1;
        current.data = data;
        current.update_time = Utc::now();
        Ok(current.clone())
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        let version = docs.get(id).map(|d| d.version + 1).unwrap_or(1);
        let doc = StoredDocument {
            id: id.to_string(),
            version,
            data,
            update_time: Utc::now(),
        };
        docs.insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(collection)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_replace_bumps_version() {
        let store = MemoryStore::new();
        let doc = store.create("tasks", "t1", json!({"a": 1})).await.unwrap();
        assert_eq!(doc.version, 1);

        let doc = store
            .replace("tasks", "t1", json!({"a": 2}), 1)
            .await
            .unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.data["a"], 2);
    }

    #[tokio::test]
    async fn test_stale_replace_is_rejected() {
        let store = MemoryStore::new();
        store.create("tasks", "t1", json!({"a": 1})).await.unwrap();
        store.replace("tasks", "t1", json!({"a": 2}), 1).await.unwrap();

        let err = store
            .replace("tasks", "t1", json!({"a": 3}), 1)
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        let current = store.get("tasks", "t1").await.unwrap().unwrap();
        assert_eq!(current.data["a"], 2);
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let store = MemoryStore::new();
        store.create("c", "x", json!({})).await.unwrap();
        assert!(matches!(
            store.create("c", "x", json!({})).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.replace("c", "nope", json!({}), 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_delete_list() {
        let store = MemoryStore::new();
        store.put("c", "a", json!(1)).await.unwrap();
        assert_eq!(store.put("c", "a", json!(2)).await.unwrap().version, 2);
        store.put("c", "b", json!(3)).await.unwrap();
        assert_eq!(store.list("c").await.unwrap().len(), 2);

        assert!(store.delete("c", "a").await.unwrap());
        assert!(!store.delete("c", "a").await.unwrap());
        assert!(store.list("empty").await.unwrap().is_empty());
    }
}

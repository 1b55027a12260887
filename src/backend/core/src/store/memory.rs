//! In-memory document store for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use super::{Collection, DocumentStore, Filter};
use crate::error::{MeridianError, Result};

/// Thread-safe in-memory store. Documents are keyed by `(collection, id)`;
/// queries scan the collection, which is fine at development scale.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: DashMap<(Collection, String), Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .get(&(collection, id.to_string()))
            .map(|doc| doc.clone()))
    }

    async fn query(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>> {
        let results: Vec<Value> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection && filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        debug!(
            collection = %collection,
            matched = results.len(),
            "In-memory query"
        );
        Ok(results)
    }

    async fn set(&self, collection: Collection, id: &str, patch: Value) -> Result<()> {
        if !patch.is_object() {
            return Err(MeridianError::store(format!(
                "document patch for {}/{} must be a JSON object",
                collection, id
            )));
        }

        let key = (collection, id.to_string());
        match self.documents.get_mut(&key) {
            Some(mut existing) => {
                // Shallow merge; explicit nulls overwrite.
                if let (Some(target), Some(fields)) = (existing.as_object_mut(), patch.as_object())
                {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
            None => {
                self.documents.insert(key, patch);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        Ok(self
            .documents
            .remove(&(collection, id.to_string()))
            .is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = InMemoryStore::new();

        store
            .set(Collection::Users, "u1", json!({"id": "u1", "role": "normal"}))
            .await
            .unwrap();

        let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(doc["role"], "normal");

        assert!(store.delete(Collection::Users, "u1").await.unwrap());
        assert!(!store.delete(Collection::Users, "u1").await.unwrap());
        assert!(store.get(Collection::Users, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_merges_and_nulls_overwrite() {
        let store = InMemoryStore::new();

        store
            .set(
                Collection::Users,
                "u1",
                json!({"id": "u1", "partner_id": "p1", "email": "arun@example.com"}),
            )
            .await
            .unwrap();

        // Patch a single field to null; the rest of the document survives.
        store
            .set(Collection::Users, "u1", json!({"partner_id": null}))
            .await
            .unwrap();

        let doc = store.get(Collection::Users, "u1").await.unwrap().unwrap();
        assert!(doc["partner_id"].is_null());
        assert_eq!(doc["email"], "arun@example.com");
    }

    #[tokio::test]
    async fn test_query_scoped_to_collection() {
        let store = InMemoryStore::new();
        store
            .set(Collection::Users, "u1", json!({"partner_id": "p1"}))
            .await
            .unwrap();
        store
            .set(Collection::Partners, "p1", json!({"partner_id": "p1"}))
            .await
            .unwrap();

        let hits = store
            .query(Collection::Users, &Filter::eq("partner_id", "p1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_query_all_returns_whole_collection() {
        let store = InMemoryStore::new();
        store
            .set(Collection::Users, "u1", json!({"partner_id": "p1"}))
            .await
            .unwrap();
        store
            .set(Collection::Users, "u2", json!({"partner_id": null}))
            .await
            .unwrap();
        store
            .set(Collection::Partners, "p1", json!({"approved": true}))
            .await
            .unwrap();

        let all = store.query(Collection::Users, &Filter::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_non_object_patch_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .set(Collection::Users, "u1", json!("not-an-object"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::StoreError);
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{DocumentStore, Filter, StoreError};

/// In-memory document store. Backs the test suites and local development;
/// documents are kept in insertion order per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn document_id(document: &Value) -> Option<Uuid> {
    document
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn merge(document: &mut Value, patch: &Value) {
    if let (Some(target), Some(fields)) = (document.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| {
                documents
                    .iter()
                    .find(|document| document_id(document) == Some(id))
            })
            .cloned())
    }

    async fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        if document_id(&document).is_none() {
            return Err(StoreError::Decode(
                "document is missing a string uuid `id` field".to_string(),
            ));
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<Value, StoreError> {
        let mut collections = self.collections.write().await;
        let documents = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
            })?;

        let document = documents
            .iter_mut()
            .find(|document| document_id(document) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
            })?;

        merge(document, &patch);
        Ok(document.clone())
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let mut updated = 0;
        if let Some(documents) = collections.get_mut(collection) {
            for document in documents.iter_mut() {
                if filter.matches(document) {
                    merge(document, &patch);
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(documents) = collections.get_mut(collection) {
            let before = documents.len();
            documents.retain(|document| document_id(document) != Some(id));
            return Ok(documents.len() < before);
        }
        Ok(false)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let mut deleted = 0;
        if let Some(documents) = collections.get_mut(collection) {
            let before = documents.len();
            documents.retain(|document| !filter.matches(document));
            deleted = (before - documents.len()) as u64;
        }
        Ok(deleted)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let documents = self.list(collection, filter).await?;
        Ok(documents.len() as u64)
    }
}

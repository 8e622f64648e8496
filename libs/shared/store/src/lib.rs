// libs/shared/store/src/lib.rs
//
// Document-style storage boundary. Every cell talks to a `DocumentStore`
// of named collections holding JSON documents keyed by an `id` field.
// Two backends: a PostgREST-style HTTP backend for deployments and an
// in-memory backend for tests and local development.

pub mod filter;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use rest::RestDocumentStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found in {collection}")]
    NotFound { collection: String },

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Failed to decode document: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn list(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Insert a document. The document must carry a string `id` field.
    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    /// Shallow-merge `patch` into the document with the given id and return
    /// the updated document.
    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<Value, StoreError>;

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, StoreError>;

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}

/// Collection names used across the cells.
pub mod collections {
    pub const DOCTORS: &str = "doctors";
    pub const PATIENTS: &str = "patients";
    pub const APPOINTMENTS: &str = "appointments";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const REVIEWS: &str = "reviews";
}

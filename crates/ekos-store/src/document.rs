//! Document store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

/// A stored JSON document with its write version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    /// Starts at 1 and increases by one on every write
    pub version: u64,
    pub data: Value,
    pub update_time: DateTime<Utc>,
}

/// A collection-scoped key/value store of JSON documents with
/// compare-and-swap on the document version.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Insert a new document. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument>;

    /// Overwrite a document only if its current version equals
    /// `expected_version`. Fails with `PreconditionFailed` otherwise.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> StoreResult<StoredDocument>;

    /// Unconditional write, creating the document if missing.
    async fn put(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument>;

    /// Returns true if a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Every document in a collection, unordered.
    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>>;

    /// Check connectivity.
    async fn ping(&self) -> StoreResult<()>;
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreError;
use crate::query::SearchRequest;

/// A single search hit: document id plus its stored source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

/// Store acknowledgement for a write, without the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteAck {
    pub id: String,
    pub result: String,
    pub version: Option<i64>,
}

/// Narrow client interface over a search-engine document store.
///
/// Implementations are shared process-wide behind an `Arc` and must tolerate
/// concurrent calls; no ordering is imposed between operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Create `index` with the given mappings. Returns `false` when it already existed.
    async fn create_index(&self, index: &str, mappings: &Value) -> Result<bool, StoreError>;

    /// Create-only write; an existing id yields `StoreError::Conflict`.
    async fn index_document(&self, index: &str, id: &str, doc: &Value) -> Result<WriteAck, StoreError>;

    /// Partial-document merge; a missing id yields `StoreError::NotFound`.
    async fn update_document(&self, index: &str, id: &str, patch: &Value) -> Result<WriteAck, StoreError>;

    /// Delete by id. Returns whether the document existed.
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, StoreError>;

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, StoreError>;
}

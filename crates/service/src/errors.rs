use search::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store write failed: {0}")]
    StoreWrite(String),
    #[error("store query failed: {0}")]
    StoreQuery(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {} not found", entity, id))
    }

    /// Map a failed index/update/delete call.
    pub fn from_write(entity: &str, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::not_found(entity, id),
            other => Self::StoreWrite(other.to_string()),
        }
    }

    /// Map a failed search call.
    pub fn from_query(e: StoreError) -> Self {
        Self::StoreQuery(e.to_string())
    }
}

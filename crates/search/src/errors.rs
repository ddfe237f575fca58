use thiserror::Error;

/// Failures surfaced by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store rejected request ({status}): {reason}")]
    Rejected { status: u16, reason: String },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("document already exists: {0}")]
    Conflict(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

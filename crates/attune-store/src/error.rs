use attune_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Every StateStore I/O failure maps to the single `StoreUnavailable` kind
/// (§7); callers degrade to in-memory state rather than failing the request.
impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

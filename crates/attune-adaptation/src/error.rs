use attune_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptationError {
    #[error("store error: {0}")]
    Store(#[from] attune_store::StoreError),

    #[error("signal '{0}' has no rule-table entry")]
    UnknownSignal(String),
}

impl From<AdaptationError> for CoreError {
    fn from(e: AdaptationError) -> Self {
        match e {
            AdaptationError::Store(s) => s.into(),
            AdaptationError::UnknownSignal(s) => CoreError::Internal(s),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdaptationError>;

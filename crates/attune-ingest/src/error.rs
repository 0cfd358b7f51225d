use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store error: {0}")]
    Store(#[from] attune_store::StoreError),

    #[error("safety filter error: {0}")]
    Safety(#[from] attune_safety::SafetyError),

    #[error("adaptation error: {0}")]
    Adaptation(#[from] attune_adaptation::AdaptationError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

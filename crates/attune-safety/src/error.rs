use attune_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("store error: {0}")]
    Store(#[from] attune_store::StoreError),
}

/// Per §7, a detector failure is fail-open — no violation, never auto-punish
/// on an error path.
impl From<SafetyError> for CoreError {
    fn from(e: SafetyError) -> Self {
        match e {
            SafetyError::Store(s) => s.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SafetyError>;

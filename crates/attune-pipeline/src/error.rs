use attune_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] attune_store::StoreError),

    #[error("router error: {0}")]
    Router(#[from] attune_providers::RouterError),
}

/// Per §4.8's error-recovery rule, nothing here is meant to reach the
/// user directly — `ResponsePipeline` catches every `PipelineError` and
/// substitutes a fallback message instead.
impl From<PipelineError> for CoreError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Store(s) => s.into(),
            PipelineError::Router(r) => r.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

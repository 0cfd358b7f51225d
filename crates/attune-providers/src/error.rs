use attune_core::CoreError;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// §4.7 step 5: every provider failed. Carries a deterministic
    /// fallback phrase; the caller decides what the user sees.
    #[error("all providers failed; fallback: {fallback_phrase}")]
    AllProvidersFailed { fallback_phrase: String },
}

impl From<RouterError> for CoreError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Provider { provider, source } if source.is_retryable() => {
                CoreError::ProviderTransient {
                    provider,
                    reason: source.to_string(),
                }
            }
            RouterError::Provider { provider, source } => CoreError::ProviderPermanent {
                provider,
                reason: source.to_string(),
            },
            RouterError::AllProvidersFailed { fallback_phrase } => CoreError::ProviderTransient {
                provider: "*".to_string(),
                reason: fallback_phrase,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

use async_trait::async_trait;

/// A single message in the conversation sent to a provider.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub tokens_used: Option<u32>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageOutcome {
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// §7: network/5xx/timeout/rate-limit → try the next provider.
    /// Auth/bad-request/policy → fail fast, no alternates.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Http(_) | ProviderError::RateLimited | ProviderError::Unavailable(_)
        ) || matches!(self, ProviderError::Api { status, .. } if *status >= 500)
    }
}

/// The capability every AI backend offers (§4.7). Image generation is
/// optional — providers that don't support it return `Unavailable`.
#[async_trait]
pub trait AIProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model_default(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }

    async fn chat_completion(
        &self,
        messages: &[ProviderMessage],
        model: &str,
        opts: &ChatOptions,
    ) -> Result<ChatOutcome, ProviderError>;

    fn is_available(&self) -> bool {
        true
    }

    async fn generate_image(
        &self,
        _prompt: &str,
    ) -> Result<ImageOutcome, ProviderError> {
        Err(ProviderError::Unavailable(
            "this provider does not support image generation".to_string(),
        ))
    }
}

//! The ImageSubsystem (§4.9): permission gating, per-user hourly rate
//! limits, prompt validation, retrying provider dispatch, and the
//! `image_generations` audit log. Kept entirely separate from the text
//! pipeline — it never touches `ConversationWindow` or the cache's
//! response-key space.

use std::sync::Arc;
use std::time::Duration;

use attune_cache::Cache;
use attune_core::{ChannelId, TtlClass, UserId};
use attune_providers::{AIProvider, ProviderError};
use attune_store::types::ImageGenerationRecord;
use attune_store::StateStore;
use tracing::warn;

const MIN_PROMPT_LEN: usize = 3;
const MAX_PROMPT_LEN: usize = 500;
const RETRY_BACKOFFS_SECS: &[u64] = &[2, 4, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Regular,
    Moderator,
    Admin,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub permission: PermissionLevel,
    pub prompt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageRejection {
    #[error("image generation isn't enabled in this channel")]
    ChannelNotAllowed,
    #[error("hourly image generation limit reached, try again later")]
    RateLimited,
    #[error("prompt is too short")]
    PromptTooShort,
    #[error("prompt contains a blocked term")]
    PromptBlocked,
    #[error("image service is misconfigured")]
    ProviderMisconfigured,
    #[error("image generation failed: {0}")]
    ProviderFailed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ImageLimits {
    pub hourly_rate_user: u32,
    pub hourly_rate_moderator: u32,
    pub hourly_rate_admin: u32,
    pub default_channel_id: Option<u64>,
}

pub struct ImageSubsystem {
    cache: Arc<Cache>,
    store: Arc<StateStore>,
    provider: Arc<dyn AIProvider>,
    limits: ImageLimits,
    blocklist: Vec<String>,
}

impl ImageSubsystem {
    pub fn new(
        cache: Arc<Cache>,
        store: Arc<StateStore>,
        provider: Arc<dyn AIProvider>,
        limits: ImageLimits,
        blocklist: Vec<String>,
    ) -> Self {
        Self {
            cache,
            store,
            provider,
            limits,
            blocklist,
        }
    }

    pub async fn generate(
        &self,
        request: ImageRequest,
        now_unix: f64,
        now_iso: &str,
    ) -> Result<String, ImageRejection> {
        self.check_permission(&request)?;
        self.check_rate_limit(&request, now_unix).await?;
        let prompt = self.validate_prompt(&request.prompt)?;

        let outcome = self.dispatch_with_retry(&prompt).await;
        self.log_attempt(&request, &prompt, &outcome, now_iso);
        outcome
    }

    fn check_permission(&self, request: &ImageRequest) -> Result<(), ImageRejection> {
        if request.permission != PermissionLevel::Regular {
            return Ok(());
        }
        match self.limits.default_channel_id {
            Some(allowed) if allowed == request.channel_id.get() => Ok(()),
            _ => Err(ImageRejection::ChannelNotAllowed),
        }
    }

    async fn check_rate_limit(
        &self,
        request: &ImageRequest,
        now_unix: f64,
    ) -> Result<(), ImageRejection> {
        let limit = match request.permission {
            PermissionLevel::Regular => self.limits.hourly_rate_user,
            PermissionLevel::Moderator => self.limits.hourly_rate_moderator,
            PermissionLevel::Admin => self.limits.hourly_rate_admin,
        };

        let key = format!("image_rate:{}", request.user_id.get());
        let (window_start, count) = match self.cache.get(&key, now_unix).await {
            Some(bytes) => parse_window(&bytes).unwrap_or((now_unix, 0)),
            None => (now_unix, 0),
        };

        let (window_start, count) = if now_unix - window_start >= 3600.0 {
            (now_unix, 0)
        } else {
            (window_start, count)
        };

        if count >= limit {
            return Err(ImageRejection::RateLimited);
        }

        let updated = format!("{window_start}:{}", count + 1);
        self.cache
            .set(&key, updated.into_bytes(), TtlClass::Long, now_unix)
            .await;
        Ok(())
    }

    fn validate_prompt(&self, prompt: &str) -> Result<String, ImageRejection> {
        let trimmed = prompt.trim();
        if trimmed.len() < MIN_PROMPT_LEN {
            return Err(ImageRejection::PromptTooShort);
        }
        let truncated: String = trimmed.chars().take(MAX_PROMPT_LEN).collect();
        let lower = truncated.to_lowercase();
        if self.blocklist.iter().any(|term| lower.contains(term.as_str())) {
            return Err(ImageRejection::PromptBlocked);
        }
        Ok(truncated)
    }

    async fn dispatch_with_retry(&self, prompt: &str) -> Result<String, ImageRejection> {
        let mut last_error = None;
        for attempt in 0..=RETRY_BACKOFFS_SECS.len() {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(RETRY_BACKOFFS_SECS[attempt - 1])).await;
            }
            match self.provider.generate_image(prompt).await {
                Ok(outcome) => return Ok(outcome.url),
                Err(ProviderError::Auth(reason)) => {
                    warn!(reason, "image provider auth failure, not retrying");
                    return Err(ImageRejection::ProviderMisconfigured);
                }
                Err(e) => {
                    last_error = Some(e.to_string());
                    if attempt == RETRY_BACKOFFS_SECS.len() {
                        break;
                    }
                }
            }
        }
        Err(ImageRejection::ProviderFailed(
            last_error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }

    fn log_attempt(
        &self,
        request: &ImageRequest,
        prompt: &str,
        outcome: &Result<String, ImageRejection>,
        now_iso: &str,
    ) {
        let record = ImageGenerationRecord {
            id: None,
            user_id: request.user_id,
            channel_id: request.channel_id,
            prompt: prompt.to_string(),
            provider: self.provider.name().to_string(),
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            image_url: outcome.as_ref().ok().cloned(),
            created_at: now_iso.to_string(),
        };
        if let Err(e) = self.store.record_image_generation(&record) {
            warn!(error = %e, "failed to record image generation audit row");
        }
    }
}

fn parse_window(bytes: &[u8]) -> Option<(f64, u32)> {
    let text = std::str::from_utf8(bytes).ok()?;
    let (start, count) = text.split_once(':')?;
    Some((start.parse().ok()?, count.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attune_providers::{ChatOptions, ChatOutcome, ImageOutcome, ProviderMessage};

    struct StubProvider {
        fail_times: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl AIProvider for StubProvider {
        fn name(&self) -> &str {
            "stub-image"
        }
        fn model_default(&self) -> &str {
            "stub/image"
        }
        async fn chat_completion(
            &self,
            _messages: &[ProviderMessage],
            _model: &str,
            _opts: &ChatOptions,
        ) -> Result<ChatOutcome, ProviderError> {
            unimplemented!("image subsystem never calls chat_completion")
        }
        async fn generate_image(&self, _prompt: &str) -> Result<ImageOutcome, ProviderError> {
            use std::sync::atomic::Ordering;
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(ProviderError::Unavailable("flaky".to_string()));
            }
            Ok(ImageOutcome {
                url: "https://example.invalid/image.png".to_string(),
            })
        }
    }

    fn limits() -> ImageLimits {
        ImageLimits {
            hourly_rate_user: 2,
            hourly_rate_moderator: 20,
            hourly_rate_admin: 50,
            default_channel_id: Some(42),
        }
    }

    fn subsystem(fail_times: u32) -> ImageSubsystem {
        ImageSubsystem::new(
            Arc::new(Cache::new(100, None)),
            Arc::new(StateStore::open_in_memory().unwrap()),
            Arc::new(StubProvider {
                fail_times: std::sync::atomic::AtomicU32::new(fail_times),
            }),
            limits(),
            vec!["blocked".to_string()],
        )
    }

    fn req() -> ImageRequest {
        ImageRequest {
            user_id: UserId::new(1),
            channel_id: ChannelId::new(42),
            permission: PermissionLevel::Regular,
            prompt: "a friendly robot".to_string(),
        }
    }

    #[tokio::test]
    async fn regular_user_outside_configured_channel_is_denied() {
        let sub = subsystem(0);
        let mut r = req();
        r.channel_id = ChannelId::new(99);
        let err = sub.generate(r, 0.0, "t0").await.unwrap_err();
        assert!(matches!(err, ImageRejection::ChannelNotAllowed));
    }

    #[tokio::test]
    async fn short_prompt_rejected() {
        let sub = subsystem(0);
        let mut r = req();
        r.prompt = "hi".to_string();
        let err = sub.generate(r, 0.0, "t0").await.unwrap_err();
        assert!(matches!(err, ImageRejection::PromptTooShort));
    }

    #[tokio::test]
    async fn blocklisted_term_rejected() {
        let sub = subsystem(0);
        let mut r = req();
        r.prompt = "something blocked here".to_string();
        let err = sub.generate(r, 0.0, "t0").await.unwrap_err();
        assert!(matches!(err, ImageRejection::PromptBlocked));
    }

    #[tokio::test]
    async fn rate_limit_trips_after_configured_count() {
        let sub = subsystem(0);
        sub.generate(req(), 0.0, "t0").await.unwrap();
        sub.generate(req(), 1.0, "t0").await.unwrap();
        let err = sub.generate(req(), 2.0, "t0").await.unwrap_err();
        assert!(matches!(err, ImageRejection::RateLimited));
    }

    #[tokio::test]
    async fn transient_failure_retries_then_succeeds() {
        let sub = subsystem(1);
        let url = sub.generate(req(), 0.0, "t0").await.unwrap();
        assert!(url.starts_with("https://"));
    }
}

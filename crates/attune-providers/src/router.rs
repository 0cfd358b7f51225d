use std::sync::Arc;
use std::time::{Duration, Instant};

use attune_core::{GuildId, TtlClass, UserId};
use tracing::{info, warn};

use crate::error::{Result, RouterError};
use crate::health::{HealthTracker, ProviderStatus};
use crate::model_map;
use crate::provider::{AIProvider, ChatOptions, ChatOutcome, ProviderMessage};
use crate::ratelimit::TokenBucket;

const FALLBACK_PHRASES: &[&str] = &[
    "I'm having trouble reaching my backend right now — try again in a moment.",
    "Something went sideways on my end. Give it another shot shortly.",
    "I can't get a response together at the moment, sorry about that.",
];

pub struct RouteRequest {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub messages: Vec<ProviderMessage>,
    pub model: String,
    pub options: ChatOptions,
}

#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub content: String,
    pub model_canonical: String,
    pub attempted_providers: Vec<String>,
    pub from_cache: bool,
}

struct Slot {
    provider: Box<dyn AIProvider>,
    bucket: TokenBucket,
}

pub struct ProviderRouter {
    slots: Vec<Slot>,
    cache: Arc<attune_cache::Cache>,
    fallback_model: String,
    health: Arc<HealthTracker>,
}

impl ProviderRouter {
    pub fn new(
        providers: Vec<(Box<dyn AIProvider>, u32)>,
        cache: Arc<attune_cache::Cache>,
        fallback_model: String,
    ) -> Self {
        let slots = providers
            .into_iter()
            .map(|(provider, rate_per_min)| Slot {
                provider,
                bucket: TokenBucket::new(rate_per_min),
            })
            .collect();
        Self {
            slots,
            cache,
            fallback_model,
            health: HealthTracker::new(),
        }
    }

    pub async fn route(&self, request: RouteRequest, now: f64) -> Result<RouteResponse> {
        let model_canonical = model_map::normalize(&request.model, &self.fallback_model);
        let joined = request
            .messages
            .iter()
            .map(|m| format!("{}:{}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let cache_key = attune_cache::request_key(
            request.guild_id,
            request.user_id,
            &joined,
            &model_canonical,
            request.options.temperature,
            request.options.max_tokens,
        );

        if let Some(cached) = self.cache.get(&cache_key, now).await {
            if let Ok(content) = String::from_utf8(cached) {
                return Ok(RouteResponse {
                    content,
                    model_canonical,
                    attempted_providers: Vec::new(),
                    from_cache: true,
                });
            }
        }

        let mut attempted = Vec::new();
        let mut last_err: Option<RouterError> = None;
        let mut failed_fast = false;

        for slot in &self.slots {
            let name = slot.provider.name().to_string();

            if !slot.provider.is_available() {
                continue;
            }
            if matches!(
                self.health.status_for(&name),
                ProviderStatus::Down | ProviderStatus::RateLimited | ProviderStatus::AuthExpired
            ) {
                info!(provider = %name, "provider unhealthy, skipping");
                continue;
            }
            if !slot.bucket.try_acquire() {
                info!(provider = %name, "provider rate-limit bucket empty, skipping");
                continue;
            }

            attempted.push(name.clone());
            let call = slot
                .provider
                .chat_completion(&request.messages, &model_canonical, &request.options);
            let timeout = Duration::from_secs(request.options.timeout_secs);
            let started = Instant::now();

            let outcome: Result<ChatOutcome> = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => Err(RouterError::Provider {
                    provider: name.clone(),
                    source: e,
                }),
                Err(_) => Err(RouterError::Provider {
                    provider: name.clone(),
                    source: crate::provider::ProviderError::Unavailable("timed out".to_string()),
                }),
            };

            match outcome {
                Ok(outcome) => {
                    self.health
                        .record_success(&name, started.elapsed().as_millis() as u64);
                    self.cache
                        .set(
                            &cache_key,
                            outcome.content.clone().into_bytes(),
                            TtlClass::Short,
                            now,
                        )
                        .await;
                    return Ok(RouteResponse {
                        content: outcome.content,
                        model_canonical,
                        attempted_providers: attempted,
                        from_cache: false,
                    });
                }
                Err(e) => {
                    let retryable = matches!(&e, RouterError::Provider { source, .. } if source.is_retryable());
                    if let RouterError::Provider { source, .. } = &e {
                        self.health.record_error(&name, source);
                    }
                    warn!(provider = %name, error = %e, retryable, "provider attempt failed");
                    last_err = Some(e);
                    if !retryable {
                        failed_fast = true;
                        break;
                    }
                }
            }
        }

        if failed_fast {
            return Err(last_err.expect("failed_fast is only set alongside last_err"));
        }

        Err(RouterError::AllProvidersFailed {
            fallback_phrase: fallback_phrase(now),
        })
    }
}

/// A deterministic-enough pick from the fixed fallback list (§4.7 step 5).
fn fallback_phrase(now: f64) -> String {
    let idx = (now as u64 as usize) % FALLBACK_PHRASES.len();
    FALLBACK_PHRASES[idx].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::provider::ProviderError;

    struct AlwaysOk;

    #[async_trait]
    impl AIProvider for AlwaysOk {
        fn name(&self) -> &str {
            "always-ok"
        }
        fn model_default(&self) -> &str {
            "anthropic/claude-3-haiku"
        }
        async fn chat_completion(
            &self,
            _messages: &[ProviderMessage],
            _model: &str,
            _opts: &ChatOptions,
        ) -> std::result::Result<ChatOutcome, ProviderError> {
            Ok(ChatOutcome {
                content: "hello".to_string(),
                tokens_used: Some(10),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    struct AlwaysFail;

    #[async_trait]
    impl AIProvider for AlwaysFail {
        fn name(&self) -> &str {
            "always-fail"
        }
        fn model_default(&self) -> &str {
            "anthropic/claude-3-haiku"
        }
        async fn chat_completion(
            &self,
            _messages: &[ProviderMessage],
            _model: &str,
            _opts: &ChatOptions,
        ) -> std::result::Result<ChatOutcome, ProviderError> {
            Err(ProviderError::Unavailable("down".to_string()))
        }
    }

    fn req() -> RouteRequest {
        RouteRequest {
            guild_id: GuildId::new(1),
            user_id: UserId::new(2),
            messages: vec![ProviderMessage {
                role: "user",
                content: "hi".to_string(),
            }],
            model: "Claude 3 Haiku".to_string(),
            options: ChatOptions::default(),
        }
    }

    #[tokio::test]
    async fn falls_back_to_next_provider_on_retryable_error() {
        let cache = Arc::new(attune_cache::Cache::new(10, None));
        let router = ProviderRouter::new(
            vec![
                (Box::new(AlwaysFail), 30),
                (Box::new(AlwaysOk), 30),
            ],
            cache,
            "anthropic/claude-3-haiku".to_string(),
        );
        let resp = router.route(req(), 0.0).await.unwrap();
        assert_eq!(resp.content, "hello");
        assert_eq!(resp.attempted_providers.len(), 2);
    }

    #[tokio::test]
    async fn second_call_hits_cache() {
        let cache = Arc::new(attune_cache::Cache::new(10, None));
        let router = ProviderRouter::new(vec![(Box::new(AlwaysOk), 30)], cache, "anthropic/claude-3-haiku".to_string());
        router.route(req(), 0.0).await.unwrap();
        let second = router.route(req(), 1.0).await.unwrap();
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn all_providers_failing_returns_fallback() {
        let cache = Arc::new(attune_cache::Cache::new(10, None));
        let router = ProviderRouter::new(vec![(Box::new(AlwaysFail), 30)], cache, "anthropic/claude-3-haiku".to_string());
        let err = router.route(req(), 0.0).await.unwrap_err();
        match err {
            RouterError::AllProvidersFailed { .. } => {}
            other => panic!("unexpected error variant: {other}"),
        }
    }
}

//! Turns the `[[ai.providers]]` config table into the boxed `AIProvider`
//! list `ProviderRouter` wants, plus the single image-generation provider
//! `ImageSubsystem` dispatches through.

use std::sync::Arc;

use attune_core::config::{ProviderEntry, ProviderKind};
use attune_providers::{AIProvider, AnthropicProvider, ChatOptions, OpenAiProvider, ProviderError, ProviderMessage};
use async_trait::async_trait;
use tracing::warn;

/// Stands in for image generation when no `image-gen` provider entry is
/// configured — `ImageSubsystem` always has a provider to dispatch to,
/// it just fails closed with a clear reason.
struct NoImageProvider;

#[async_trait]
impl AIProvider for NoImageProvider {
    fn name(&self) -> &str {
        "none"
    }

    fn model_default(&self) -> &str {
        "none"
    }

    async fn chat_completion(
        &self,
        _messages: &[ProviderMessage],
        _model: &str,
        _opts: &ChatOptions,
    ) -> Result<attune_providers::ChatOutcome, ProviderError> {
        Err(ProviderError::Unavailable("no image provider configured".to_string()))
    }

    async fn generate_image(&self, _prompt: &str) -> Result<attune_providers::ImageOutcome, ProviderError> {
        Err(ProviderError::Unavailable("no image provider configured".to_string()))
    }
}

/// Build the ordered chat-provider list `ProviderRouter` fails over
/// across, plus the provider `ImageSubsystem` uses for text-to-image.
pub fn build(entries: &[ProviderEntry], default_model: &str) -> (Vec<(Box<dyn AIProvider>, u32)>, Arc<dyn AIProvider>) {
    let mut chat = Vec::new();
    let mut image: Option<Arc<dyn AIProvider>> = None;

    for entry in entries {
        let model = entry.model.clone().unwrap_or_else(|| default_model.to_string());
        let api_key = entry.api_key.clone().unwrap_or_default();
        match entry.kind {
            ProviderKind::Anthropic => {
                chat.push((
                    Box::new(AnthropicProvider::new(api_key, entry.base_url.clone(), model)) as Box<dyn AIProvider>,
                    entry.rate_per_min,
                ));
            }
            ProviderKind::OpenAi => {
                chat.push((
                    Box::new(OpenAiProvider::new(api_key, entry.base_url.clone(), model)) as Box<dyn AIProvider>,
                    entry.rate_per_min,
                ));
            }
            ProviderKind::ImageGen => {
                image = Some(Arc::new(OpenAiProvider::new(api_key, entry.base_url.clone(), model)));
            }
            ProviderKind::Ollama => {
                warn!(provider = %entry.id, "ollama provider configured but not wired in this build, skipping");
            }
        }
    }

    (chat, image.unwrap_or_else(|| Arc::new(NoImageProvider)))
}

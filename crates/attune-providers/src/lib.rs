//! `attune-providers` — the ProviderRouter (§4.7): model-ID normalization,
//! ordered provider fallback, token-bucket rate limiting, and response
//! caching.

mod anthropic;
mod error;
mod health;
mod model_map;
mod openai;
mod provider;
mod ratelimit;
mod router;

pub use anthropic::AnthropicProvider;
pub use error::{Result, RouterError};
pub use health::{HealthTracker, ProviderHealthEntry, ProviderStatus};
pub use model_map::{display_name, normalize};
pub use openai::OpenAiProvider;
pub use provider::{AIProvider, ChatOptions, ChatOutcome, ImageOutcome, ProviderError, ProviderMessage};
pub use router::{ProviderRouter, RouteRequest, RouteResponse};

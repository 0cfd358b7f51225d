//! The composition root (§10.5): wires StateStore, Cache, ProviderRouter,
//! SafetyFilter, AdaptationEngine, ResponsePipeline, ImageSubsystem and
//! EventIngest together from a single loaded `Config`, owns the
//! background task set of §5, and shuts all of it down on one signal.
//!
//! Nothing in this crate reaches for a global. Every dependency is
//! constructed once here and handed down through constructor arguments —
//! the pattern every other crate in the workspace already follows.

mod providers;

use std::sync::Arc;
use std::time::Duration;

use attune_adaptation::AdaptationEngine;
use attune_cache::Cache;
use attune_core::platform::{PlatformActions, PlatformEvents};
use attune_core::{Config, CoreError, UserId};
use attune_ingest::{EventIngest, EventIngestConfig, WelcomeDmQueue};
use attune_pipeline::{ImageLimits, ImageSubsystem, ResponsePipeline};
use attune_providers::ProviderRouter;
use attune_safety::SafetyFilter;
use attune_store::StateStore;
use chrono::Duration as ChronoDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);
const RETENTION_PURGE_INTERVAL: Duration = Duration::from_secs(24 * 3600);
const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Every long-lived resource the core owns, plus the handles needed to
/// join its background tasks at shutdown. Cloning the `Arc` fields out
/// is how a future command-handler layer (out of scope here) would
/// reach the same `ImageSubsystem`/`ProviderRouter` the message path uses.
pub struct RuntimeHandle {
    pub store: Arc<StateStore>,
    pub cache: Arc<Cache>,
    pub router: Arc<ProviderRouter>,
    pub safety: Arc<SafetyFilter>,
    pub adaptation: Arc<AdaptationEngine>,
    pub pipeline: Arc<ResponsePipeline>,
    pub image: Arc<ImageSubsystem>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Load schema, construct every component, and spawn the background
/// task set of §5. `events`/`actions` are the platform boundary (§1 non-goal —
/// a Discord/Telegram adapter supplies these; this crate never assumes a
/// transport).
pub async fn start(
    config: Config,
    events: Box<dyn PlatformEvents>,
    actions: Arc<dyn PlatformActions>,
) -> Result<RuntimeHandle, CoreError> {
    let store = Arc::new(
        StateStore::open(&config.store.path)
            .map_err(|e| CoreError::StoreUnavailable(e.to_string()))?,
    );

    if config.cache.tier2_url.is_some() {
        warn!("cache.tier2_url is set but no tier-2 KV client is wired in this build, running tier-1-only");
    }
    let cache = Arc::new(Cache::new(config.cache.capacity, None));

    let (provider_slots, image_provider) = providers::build(&config.ai.providers, &config.ai.default_model);
    if provider_slots.is_empty() {
        warn!("no chat providers configured, ResponsePipeline will fall back on every request");
    }
    let router = Arc::new(ProviderRouter::new(
        provider_slots,
        Arc::clone(&cache),
        config.ai.fallback_model.clone(),
    ));

    let safety = Arc::new(SafetyFilter::new(Arc::clone(&store), &config));
    let adaptation = Arc::new(AdaptationEngine::new(
        Arc::clone(&store),
        config.adaptation.cooldown_secs,
        config.adaptation.event_ttl_secs,
    ));

    let pipeline = Arc::new(ResponsePipeline::new(
        Arc::clone(&store),
        Arc::clone(&router),
        Arc::clone(&actions),
        UserId::new(config.bot.user_id),
        config.bot.wake_words.clone(),
        config.ai.default_model.clone(),
        config.ai.temperature,
        config.ai.max_tokens,
        PROVIDER_TIMEOUT_SECS,
    ));

    let image = Arc::new(ImageSubsystem::new(
        Arc::clone(&cache),
        Arc::clone(&store),
        image_provider,
        ImageLimits {
            hourly_rate_user: config.image.hourly_rate_user,
            hourly_rate_moderator: config.image.hourly_rate_moderator,
            hourly_rate_admin: config.image.hourly_rate_admin,
            default_channel_id: config.image.default_channel_id,
        },
        config.image.prompt_blocklist.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (welcome, welcome_task) = WelcomeDmQueue::spawn(
        Arc::clone(&actions),
        Duration::from_millis(config.welcome_dm.rate_ms),
        shutdown_rx.clone(),
    );

    let ingest = Arc::new(EventIngest::new(
        Arc::clone(&store),
        Arc::clone(&safety),
        Arc::clone(&adaptation),
        Arc::clone(&pipeline),
        Arc::clone(&actions),
        welcome,
        EventIngestConfig {
            welcome_dm_enabled: config.welcome_dm.enabled,
            welcome_dm_message: default_welcome_message(),
            quiet_hours_start: config.adaptation.quiet_hours_start,
            quiet_hours_end: config.adaptation.quiet_hours_end,
            low_engagement_floor_per_min: config.adaptation.low_engagement_floor_per_min,
        },
    ));

    let mut tasks = vec![welcome_task];

    tasks.push(tokio::spawn(cache_sweep(Arc::clone(&cache), shutdown_tx.subscribe())));
    tasks.push(tokio::spawn(adaptation_sweep(Arc::clone(&adaptation), shutdown_tx.subscribe())));
    tasks.push(tokio::spawn(retention_sweep(
        Arc::clone(&store),
        config.store.conversation_retention_days,
        config.store.resolved_appeal_retention_days,
        shutdown_tx.subscribe(),
    )));
    tasks.push(tokio::spawn({
        let ingest = Arc::clone(&ingest);
        let shutdown_rx = shutdown_rx.clone();
        async move { ingest.run(events, shutdown_rx).await }
    }));

    info!("runtime composition root started");

    Ok(RuntimeHandle {
        store,
        cache,
        router,
        safety,
        adaptation,
        pipeline,
        image,
        shutdown_tx,
        tasks,
    })
}

/// Signal shutdown and join every background task — no task is ever
/// abandoned (§10.5).
pub async fn shutdown(mut handle: RuntimeHandle) {
    let _ = handle.shutdown_tx.send(true);
    for task in handle.tasks.drain(..) {
        if let Err(e) = task.await {
            warn!(error = %e, "background task panicked during shutdown");
        }
    }
    handle.pipeline.join_pending_saves().await;
    info!("runtime composition root shut down");
}

async fn cache_sweep(cache: Arc<Cache>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(CACHE_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cache.evict_expired(attune_core::time::now_unix());
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn adaptation_sweep(adaptation: Arc<AdaptationEngine>, shutdown: watch::Receiver<bool>) {
    adaptation.run(shutdown).await;
}

async fn retention_sweep(
    store: Arc<StateStore>,
    conversation_retention_days: u32,
    resolved_appeal_retention_days: u32,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(RETENTION_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = attune_core::time::now();
                let session_cutoff = (now - ChronoDuration::days(conversation_retention_days as i64)).to_rfc3339();
                let violation_cutoff = (now - ChronoDuration::days(resolved_appeal_retention_days as i64)).to_rfc3339();
                match store.purge_retention(&session_cutoff, &violation_cutoff) {
                    Ok((sessions, violations)) => {
                        info!(sessions, violations, "retention purge completed");
                    }
                    Err(e) => warn!(error = %e, "retention purge failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

fn default_welcome_message() -> String {
    "Welcome! Glad to have you here — let me know if you need anything.".to_string()
}

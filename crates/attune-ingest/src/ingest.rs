//! `EventIngest` (§4.10): the top-level loop. Consumes platform events,
//! runs SafetyFilter ahead of `ResponsePipeline`, maintains the rolling
//! per-guild counters that feed `AdaptationEngine`, and owns the
//! welcome-DM queue for `memberJoin`.

use std::sync::Arc;

use attune_core::platform::{MemberJoinEvent, PlatformEvent, PlatformEvents};
use attune_core::{time, GuildId, PlatformActions};
use attune_adaptation::AdaptationEngine;
use attune_pipeline::ResponsePipeline;
use attune_safety::SafetyFilter;
use attune_store::StateStore;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::counters::{is_quiet_hours, GuildCounters};
use crate::engagement::{score as engagement_score, EngagementCooldown};
use crate::safety_bridge;
use crate::welcome::WelcomeDmQueue;

const QUEUE_CAPACITY: usize = 10_000;
const WORKER_COUNT: usize = 8;

#[derive(Debug, Clone)]
pub struct EventIngestConfig {
    pub welcome_dm_enabled: bool,
    pub welcome_dm_message: String,
    pub quiet_hours_start: u32,
    pub quiet_hours_end: u32,
    pub low_engagement_floor_per_min: f64,
}

pub struct EventIngest {
    store: Arc<StateStore>,
    safety: Arc<SafetyFilter>,
    adaptation: Arc<AdaptationEngine>,
    pipeline: Arc<ResponsePipeline>,
    actions: Arc<dyn PlatformActions>,
    welcome: WelcomeDmQueue,
    counters: GuildCounters,
    engagement_cooldown: EngagementCooldown,
    config: EventIngestConfig,
}

impl EventIngest {
    pub fn new(
        store: Arc<StateStore>,
        safety: Arc<SafetyFilter>,
        adaptation: Arc<AdaptationEngine>,
        pipeline: Arc<ResponsePipeline>,
        actions: Arc<dyn PlatformActions>,
        welcome: WelcomeDmQueue,
        config: EventIngestConfig,
    ) -> Self {
        Self {
            store,
            safety,
            adaptation,
            pipeline,
            actions,
            welcome,
            counters: GuildCounters::new(),
            engagement_cooldown: EngagementCooldown::new(),
            config,
        }
    }

    /// Drain `events` into a bounded queue worked by a small pool of
    /// tasks, until the source closes or `shutdown` fires (§5).
    pub async fn run(
        self: Arc<Self>,
        mut events: Box<dyn PlatformEvents>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::channel::<PlatformEvent>(QUEUE_CAPACITY);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut workers = Vec::with_capacity(WORKER_COUNT);
        for _ in 0..WORKER_COUNT {
            let ingest = Arc::clone(&self);
            let rx = Arc::clone(&rx);
            let mut worker_shutdown = shutdown.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    let next = {
                        let mut guard = rx.lock().await;
                        tokio::select! {
                            event = guard.recv() => event,
                            _ = worker_shutdown.changed() => {
                                if *worker_shutdown.borrow() {
                                    None
                                } else {
                                    continue;
                                }
                            }
                        }
                    };
                    match next {
                        Some(event) => ingest.dispatch(event, false).await,
                        None => break,
                    }
                }
            }));
        }

        loop {
            tokio::select! {
                maybe_event = events.next_event() => {
                    match maybe_event {
                        Some(event) => {
                            if let Err(err) = tx.try_send(event) {
                                match err {
                                    tokio::sync::mpsc::error::TrySendError::Full(dropped) => {
                                        warn!("ingest queue full, dropping event");
                                        self.dispatch(dropped, true).await;
                                    }
                                    tokio::sync::mpsc::error::TrySendError::Closed(_) => break,
                                }
                            }
                        }
                        None => break,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
    }

    /// `queue_overflowed` marks an event that bypassed the bounded queue
    /// under backpressure (§5) — safety still runs, but the response
    /// pipeline (which is allowed to be lossy under load) does not.
    async fn dispatch(&self, event: PlatformEvent, queue_overflowed: bool) {
        match event {
            PlatformEvent::MessageCreate(msg) => self.handle_message(msg, queue_overflowed).await,
            PlatformEvent::MemberJoin(ev) => self.handle_member_join(ev).await,
            PlatformEvent::ReactionAdd(_) => {}
            PlatformEvent::ConnectionUp | PlatformEvent::ConnectionDown => {}
        }
    }

    async fn handle_message(&self, msg: attune_core::IncomingMessage, safety_only: bool) {
        if msg.author_is_bot {
            return;
        }

        let now_unix = time::now_unix();
        let now_iso = time::now().to_rfc3339();
        let guild_id = msg.guild_id.unwrap_or(GuildId::new(0));

        self.update_guild_signals(guild_id, &msg.content, now_unix);

        if let Some(guild_id) = msg.guild_id {
            match self.safety.check_message(
                msg.author_id,
                guild_id,
                msg.channel_id,
                msg.message_id.map(|m| m.get()),
                &msg.content,
                msg.mentions.len(),
                now_unix,
                &now_iso,
            ) {
                Ok(Some(outcome)) => {
                    let suppressed =
                        safety_bridge::apply_outcome(&*self.actions, &self.store, guild_id, &outcome).await;
                    if suppressed {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "safety filter failed, proceeding fail-open"),
            }
        }

        if safety_only {
            return;
        }

        let total_interactions = msg
            .guild_id
            .and_then(|g| self.store.get_user_profile(msg.author_id, g).ok().flatten())
            .map(|p| p.total_interactions)
            .unwrap_or(0);

        let mut proactive = false;
        if msg.guild_id.is_some()
            && !self.engagement_cooldown.is_on_cooldown(msg.channel_id, now_unix)
        {
            proactive = engagement_score(&msg.content, total_interactions) >= 0.4;
            if proactive {
                self.engagement_cooldown.set_cooldown(msg.channel_id, now_unix);
            }
        }

        let user_uses_emoji = total_interactions > 0;
        self.pipeline
            .handle_message(msg, proactive, user_uses_emoji, now_unix, &now_iso)
            .await;
    }

    async fn handle_member_join(&self, ev: MemberJoinEvent) {
        let now_unix = time::now_unix();
        if self.counters.record_join(ev.guild_id, now_unix) {
            if let Err(e) = self.adaptation.adapt(
                ev.guild_id,
                "raid_detected",
                serde_json::json!({"account_created_at": ev.account_created_at}),
                Some("join-rate threshold crossed".to_string()),
            ) {
                warn!(error = %e, "failed to apply raid_detected adaptation");
            }
        }

        if self.config.welcome_dm_enabled {
            self.welcome
                .enqueue_after_join(ev.user_id, self.config.welcome_dm_message.clone());
        } else {
            debug!(user = %ev.user_id, "welcome dm disabled, skipping join");
        }
    }

    fn update_guild_signals(&self, guild_id: GuildId, content: &str, now_unix: f64) {
        if self.counters.record_message(guild_id, now_unix) {
            self.try_adapt(guild_id, "spam_spike", "message-rate threshold crossed");
        }
        if looks_like_link(content) && self.counters.record_link(guild_id, now_unix) {
            self.try_adapt(guild_id, "link_spike", "link-rate threshold crossed");
        }

        let hour = time::now().format("%H").to_string().parse::<u32>().unwrap_or(0);
        if is_quiet_hours(hour, self.config.quiet_hours_start, self.config.quiet_hours_end) {
            self.try_adapt(guild_id, "quiet_hours", "quiet hours window");
        }
        if self.counters.messages_per_minute(guild_id, now_unix) < self.config.low_engagement_floor_per_min {
            self.try_adapt(guild_id, "low_engagement", "message rate below floor");
        }
    }

    fn try_adapt(&self, guild_id: GuildId, signal: &str, reason: &str) {
        match self.adaptation.adapt(guild_id, signal, serde_json::json!({}), Some(reason.to_string())) {
            Ok(_) => {}
            Err(e) => warn!(error = %e, signal, "failed to apply adaptation signal"),
        }
    }
}

fn looks_like_link(content: &str) -> bool {
    content.contains("http://") || content.contains("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_detection_is_simple_substring_match() {
        assert!(looks_like_link("check this out https://example.com"));
        assert!(!looks_like_link("no links here"));
    }
}

//! `ResponsePipeline` (§4.8): the per-message orchestrator EventIngest
//! hands admitted messages to.

use std::sync::{Arc, Mutex};

use attune_core::{ChannelId, GuildId, IncomingMessage, MessageId, PlatformActions, SessionKey, UserId};
use attune_providers::{ChatOptions, ProviderMessage, ProviderRouter, RouteRequest};
use attune_store::types::{ConversationWindow, TurnRole};
use attune_store::StateStore;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cooldown::ResponseCooldown;
use crate::error::{PipelineError, Result};
use crate::{chunk, fast_response, identity, style_apply};

const FALLBACK_REPLIES: &[&str] = &[
    "Sorry, I hit a snag putting that together — mind trying again?",
    "Something went wrong on my end there. Give it another shot?",
    "I couldn't get that one right, try rephrasing and I'll have another go.",
];

pub struct ResponsePipeline {
    store: Arc<StateStore>,
    router: Arc<ProviderRouter>,
    actions: Arc<dyn PlatformActions>,
    cooldown: ResponseCooldown,
    bot_user_id: UserId,
    wake_words: Vec<String>,
    default_model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_secs: u64,
    /// Outstanding session-save tasks (step 9), tracked so they can be
    /// joined at shutdown instead of abandoned (§9).
    pending_saves: Mutex<Vec<JoinHandle<()>>>,
}

impl ResponsePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<StateStore>,
        router: Arc<ProviderRouter>,
        actions: Arc<dyn PlatformActions>,
        bot_user_id: UserId,
        wake_words: Vec<String>,
        default_model: String,
        temperature: f64,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            store,
            router,
            actions,
            cooldown: ResponseCooldown::new(),
            bot_user_id,
            wake_words,
            default_model,
            temperature,
            max_tokens,
            timeout_secs,
            pending_saves: Mutex::new(Vec::new()),
        }
    }

    /// Joins every outstanding session-save task. Called once at
    /// shutdown so no save is ever abandoned mid-flight (§9).
    pub async fn join_pending_saves(&self) {
        let handles: Vec<_> = self.pending_saves.lock().unwrap().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "session-save task panicked");
            }
        }
    }

    /// Entry point EventIngest calls for every admitted `messageCreate`
    /// (§4.8). `proactive_should_engage` is the already-computed §4.10
    /// score decision; `user_uses_emoji` reflects the caller's own
    /// emoji-usage heuristic over recent history.
    pub async fn handle_message(
        &self,
        msg: IncomingMessage,
        proactive_should_engage: bool,
        user_uses_emoji: bool,
        now_unix: f64,
        now_iso: &str,
    ) {
        // 1. Admission.
        if msg.author_is_bot || msg.author_id == self.bot_user_id {
            return;
        }

        if let Err(e) = self
            .try_respond(&msg, proactive_should_engage, user_uses_emoji, now_unix, now_iso)
            .await
        {
            warn!(error = %e, "response pipeline failed, emitting fallback");
            self.emit(msg.channel_id, msg.message_id, fallback_reply(now_unix))
                .await;
        }
    }

    async fn try_respond(
        &self,
        msg: &IncomingMessage,
        proactive_should_engage: bool,
        user_uses_emoji: bool,
        now_unix: f64,
        now_iso: &str,
    ) -> Result<()> {
        let guild_id = msg.guild_id.unwrap_or(GuildId::new(0));
        let channel_id = msg.channel_id;
        let user_id = msg.author_id;

        let guild_traits = self
            .store
            .get_guild_personality(guild_id)
            .map_err(PipelineError::from)?
            .map(|g| g.traits);
        let user_override = self
            .store
            .get_user_override(user_id, guild_id)
            .map_err(PipelineError::from)?;
        let active_adaptations = self
            .store
            .list_active_adaptations(guild_id)
            .map_err(PipelineError::from)?;
        let active_refs = active_adaptations.iter().collect();
        let traits = attune_personality::effective(
            guild_traits.as_ref(),
            user_override.as_ref(),
            active_refs,
        );

        // 2. IdentityResponder shortcut.
        if let Some(category) = identity::detect_question_type(&msg.content) {
            let style = identity::determine_style(&traits);
            let reply = identity::respond(category, style, now_unix);
            self.emit(channel_id, msg.message_id, &reply).await;
            return Ok(());
        }

        // 3. Fast-response shortcut.
        if let Some(reply) = fast_response::trivial_reply(&msg.content, &traits) {
            self.emit(channel_id, msg.message_id, reply).await;
            return Ok(());
        }

        // 4. Decide whether to respond at all.
        if !self.should_respond(msg, proactive_should_engage) {
            return Ok(());
        }

        // 8 (gate half). A rapid repeat from the same (channel, user)
        // within the anti-echo window is skipped before we do any work.
        if !self.cooldown.check_and_record(channel_id, user_id, now_unix) {
            return Ok(());
        }

        // 5. Personality + Context.
        let key = SessionKey::new(guild_id, channel_id, user_id);
        let mut window = self
            .store
            .load_session(&key)
            .map_err(PipelineError::from)?
            .unwrap_or_else(ConversationWindow::empty);
        let built = attune_context::build(&mut window, &msg.content, now_iso, &traits);

        // 6. Provider call.
        let messages: Vec<ProviderMessage> = built
            .messages
            .iter()
            .map(|m| ProviderMessage {
                role: role_str(m.role),
                content: m.content.clone(),
            })
            .collect();
        let route_request = RouteRequest {
            guild_id,
            user_id,
            messages,
            model: self.default_model.clone(),
            options: ChatOptions {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                timeout_secs: self.timeout_secs,
            },
        };
        let raw_reply = match self.router.route(route_request, now_unix).await {
            Ok(response) => response.content,
            Err(e) => return Err(PipelineError::from(e)),
        };

        // 7. Post-processing.
        let directives = attune_personality::style_directives(&traits);
        let final_reply = style_apply::post_process(
            &raw_reply,
            directives,
            &built.active_topics,
            user_uses_emoji,
            now_unix,
        );

        attune_context::append_assistant_turn(&mut window, &final_reply, now_iso);

        // 9. Session save, enqueued rather than awaited inline, but
        // tracked so shutdown can still join it.
        let store = Arc::clone(&self.store);
        let window_to_save = window.clone();
        let now_iso_owned = now_iso.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = store.save_session(&key, &window_to_save, &now_iso_owned) {
                warn!(error = %e, "failed to persist session window");
            }
        });
        {
            let mut pending = self.pending_saves.lock().unwrap();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }

        // 10. Emit.
        self.emit(channel_id, msg.message_id, &final_reply).await;
        Ok(())
    }

    fn should_respond(&self, msg: &IncomingMessage, proactive_should_engage: bool) -> bool {
        if msg.guild_id.is_none() {
            return true;
        }
        if msg.mentions.contains(&self.bot_user_id) {
            return true;
        }
        let lower = msg.content.to_lowercase();
        if self.wake_words.iter().any(|w| lower.contains(w.as_str())) {
            return true;
        }
        proactive_should_engage
    }

    async fn emit(&self, channel_id: ChannelId, reply_to: Option<MessageId>, content: &str) {
        for (i, piece) in chunk::split_into_chunks(content).into_iter().enumerate() {
            let reply = if i == 0 { reply_to } else { None };
            if let Err(e) = self.actions.send_message(channel_id, &piece, reply).await {
                warn!(error = %e, "failed to send message chunk");
                break;
            }
        }
    }
}

fn role_str(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
        TurnRole::System => "system",
    }
}

fn fallback_reply(now: f64) -> &'static str {
    let idx = (now as u64 as usize) % FALLBACK_REPLIES.len();
    FALLBACK_REPLIES[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use attune_core::PlatformErrorKind;
    use std::sync::Mutex;

    struct RecordingActions {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PlatformActions for RecordingActions {
        async fn send_message(
            &self,
            _channel_id: ChannelId,
            content: &str,
            _reply_to: Option<MessageId>,
        ) -> std::result::Result<(), PlatformErrorKind> {
            self.sent.lock().unwrap().push(content.to_string());
            Ok(())
        }
        async fn send_dm(&self, _user_id: UserId, _content: &str) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn apply_timeout(&self, _: UserId, _: GuildId, _: u64) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn apply_ban(&self, _: UserId, _: GuildId, _: Option<u64>, _: &str) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn apply_kick(&self, _: UserId, _: GuildId, _: &str) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn remove_role(&self, _: UserId, _: GuildId, _: &str) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
        async fn add_role(&self, _: UserId, _: GuildId, _: &str) -> std::result::Result<(), PlatformErrorKind> {
            Ok(())
        }
    }

    fn dm_message(content: &str) -> IncomingMessage {
        IncomingMessage {
            guild_id: None,
            channel_id: ChannelId::new(1),
            message_id: None,
            author_id: UserId::new(2),
            author_is_bot: false,
            content: content.to_string(),
            attachments: vec![],
            mentions: vec![],
            mention_roles: 0,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn pipeline(actions: Arc<RecordingActions>) -> ResponsePipeline {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        let cache = Arc::new(attune_cache::Cache::new(10, None));
        let router = Arc::new(ProviderRouter::new(vec![], cache, "anthropic/claude-3-haiku".to_string()));
        ResponsePipeline::new(
            store,
            router,
            actions,
            UserId::new(999),
            vec!["astra".to_string()],
            "anthropic/claude-3-haiku".to_string(),
            0.7,
            1024,
            30,
        )
    }

    #[tokio::test]
    async fn identity_question_short_circuits_without_provider() {
        let actions = Arc::new(RecordingActions { sent: Mutex::new(vec![]) });
        let p = pipeline(Arc::clone(&actions));
        p.handle_message(dm_message("who are you?"), false, false, 0.0, "t0")
            .await;
        assert_eq!(actions.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bot_author_is_never_responded_to() {
        let actions = Arc::new(RecordingActions { sent: Mutex::new(vec![]) });
        let p = pipeline(Arc::clone(&actions));
        let mut msg = dm_message("hello");
        msg.author_is_bot = true;
        p.handle_message(msg, false, false, 0.0, "t0").await;
        assert!(actions.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fast_response_shortcut_handles_greeting() {
        let actions = Arc::new(RecordingActions { sent: Mutex::new(vec![]) });
        let p = pipeline(Arc::clone(&actions));
        p.handle_message(dm_message("hi"), false, false, 0.0, "t0").await;
        assert_eq!(actions.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn guild_message_without_mention_or_engagement_is_skipped() {
        let actions = Arc::new(RecordingActions { sent: Mutex::new(vec![]) });
        let p = pipeline(Arc::clone(&actions));
        let mut msg = dm_message("just chatting about nothing in particular");
        msg.guild_id = Some(GuildId::new(5));
        p.handle_message(msg, false, false, 0.0, "t0").await;
        assert!(actions.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_providers_configured_falls_back() {
        let actions = Arc::new(RecordingActions { sent: Mutex::new(vec![]) });
        let p = pipeline(Arc::clone(&actions));
        p.handle_message(dm_message("can you help me plan a trip to the mountains"), false, false, 0.0, "t0")
            .await;
        let sent = actions.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(FALLBACK_REPLIES.contains(&sent[0].as_str()));
    }
}

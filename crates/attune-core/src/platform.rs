//! The platform-agnostic event/action boundary (§6). The core never
//! assumes a transport — it only requires an async stream of
//! [`PlatformEvent`]s in and a [`PlatformActions`] sink out.

use async_trait::async_trait;

use crate::error::PlatformErrorKind;
use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// A single human (or system) message, normalized across channels.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: Option<MessageId>,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub content: String,
    pub attachments: Vec<String>,
    pub mentions: Vec<UserId>,
    pub mention_roles: u32,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct MemberJoinEvent {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub account_created_at: String,
    pub joined_at: String,
}

#[derive(Debug, Clone)]
pub struct ReactionAddEvent {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
}

/// One record from the input stream §6 describes. The core makes no
/// assumption about transport; it only requires an async iterator of
/// these.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    MessageCreate(IncomingMessage),
    MemberJoin(MemberJoinEvent),
    ReactionAdd(ReactionAddEvent),
    ConnectionUp,
    ConnectionDown,
}

/// Transport-agnostic source of platform events. A Discord/Telegram/etc.
/// adapter implements this by adapting its own event loop.
#[async_trait]
pub trait PlatformEvents: Send {
    async fn next_event(&mut self) -> Option<PlatformEvent>;
}

/// The output side of §6: every mutating action the core can ask a
/// platform to perform, with a standard error-kind enumeration.
#[async_trait]
pub trait PlatformActions: Send + Sync {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<(), PlatformErrorKind>;

    async fn send_dm(&self, user_id: UserId, content: &str) -> Result<(), PlatformErrorKind>;

    async fn apply_timeout(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        duration_secs: u64,
    ) -> Result<(), PlatformErrorKind>;

    async fn apply_ban(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        duration_secs: Option<u64>,
        reason: &str,
    ) -> Result<(), PlatformErrorKind>;

    async fn apply_kick(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        reason: &str,
    ) -> Result<(), PlatformErrorKind>;

    async fn remove_role(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        role: &str,
    ) -> Result<(), PlatformErrorKind>;

    async fn add_role(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        role: &str,
    ) -> Result<(), PlatformErrorKind>;
}

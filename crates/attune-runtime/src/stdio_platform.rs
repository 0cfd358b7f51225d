//! A minimal `PlatformEvents`/`PlatformActions` pair that reads DM
//! messages from stdin and prints replies to stdout. The real gateway
//! client (Discord, Telegram, ...) is out of scope for this crate (§1) —
//! this stand-in exists only so `attune` the binary is runnable and
//! demonstrable without one.

use async_trait::async_trait;
use attune_core::platform::{IncomingMessage, PlatformEvent, PlatformEvents};
use attune_core::{ChannelId, MessageId, PlatformActions, PlatformErrorKind, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};

const STDIN_USER_ID: u64 = 1;
const STDIN_CHANNEL_ID: u64 = 1;

pub struct StdioEvents {
    lines: tokio::io::Lines<BufReader<tokio::io::Stdin>>,
}

impl StdioEvents {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl PlatformEvents for StdioEvents {
    async fn next_event(&mut self) -> Option<PlatformEvent> {
        let content = self.lines.next_line().await.ok().flatten()?;
        Some(PlatformEvent::MessageCreate(IncomingMessage {
            guild_id: None,
            channel_id: ChannelId::new(STDIN_CHANNEL_ID),
            message_id: None,
            author_id: UserId::new(STDIN_USER_ID),
            author_is_bot: false,
            content,
            attachments: Vec::new(),
            mentions: Vec::new(),
            mention_roles: 0,
            timestamp: attune_core::time::now().to_rfc3339(),
        }))
    }
}

pub struct StdioActions;

#[async_trait]
impl PlatformActions for StdioActions {
    async fn send_message(
        &self,
        _channel_id: ChannelId,
        content: &str,
        _reply_to: Option<MessageId>,
    ) -> Result<(), PlatformErrorKind> {
        println!("{content}");
        Ok(())
    }

    async fn send_dm(&self, _user_id: UserId, content: &str) -> Result<(), PlatformErrorKind> {
        println!("[dm] {content}");
        Ok(())
    }

    async fn apply_timeout(&self, _user_id: UserId, _guild_id: attune_core::GuildId, _duration_secs: u64) -> Result<(), PlatformErrorKind> {
        Ok(())
    }

    async fn apply_ban(
        &self,
        _user_id: UserId,
        _guild_id: attune_core::GuildId,
        _duration_secs: Option<u64>,
        _reason: &str,
    ) -> Result<(), PlatformErrorKind> {
        Ok(())
    }

    async fn apply_kick(&self, _user_id: UserId, _guild_id: attune_core::GuildId, _reason: &str) -> Result<(), PlatformErrorKind> {
        Ok(())
    }

    async fn remove_role(&self, _user_id: UserId, _guild_id: attune_core::GuildId, _role: &str) -> Result<(), PlatformErrorKind> {
        Ok(())
    }

    async fn add_role(&self, _user_id: UserId, _guild_id: attune_core::GuildId, _role: &str) -> Result<(), PlatformErrorKind> {
        Ok(())
    }
}

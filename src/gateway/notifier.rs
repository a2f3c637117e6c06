/// Outbound chat surface
use crate::error::BotResult;
use async_trait::async_trait;

/// A message the bot posted, kept so it can be deleted later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub message_id: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_to_channel(&self, channel_id: &str, content: &str) -> BotResult<SentMessage>;

    /// Send a direct message to a chat user
    async fn send_direct(&self, user_id: &str, content: &str) -> BotResult<()>;

    async fn delete_message(&self, message: &SentMessage) -> BotResult<()>;

    /// Remove a guild role from a member
    async fn revoke_role(&self, user_id: &str, role_id: &str, reason: &str) -> BotResult<()>;
}

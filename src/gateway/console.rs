/// Local console gateway
///
/// Lets the bot run without chat credentials: stdin lines become inbound
/// messages from the configured operator, outbound messages go to stdout.
use crate::{
    error::BotResult,
    gateway::{EventStream, InboundMessage, Notifier, SentMessage},
};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub const CONSOLE_CHANNEL: &str = "console";

/// Prints every outbound message
#[derive(Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn post_to_channel(&self, channel_id: &str, content: &str) -> BotResult<SentMessage> {
        let message_id = uuid::Uuid::new_v4().to_string();
        println!("[#{}] {}", channel_id, content);
        Ok(SentMessage {
            channel_id: channel_id.to_string(),
            message_id,
        })
    }

    async fn send_direct(&self, user_id: &str, content: &str) -> BotResult<()> {
        println!("[dm:{}] {}", user_id, content);
        Ok(())
    }

    async fn delete_message(&self, message: &SentMessage) -> BotResult<()> {
        info!(
            "Deleted message {} in {}",
            message.message_id, message.channel_id
        );
        Ok(())
    }

    async fn revoke_role(&self, user_id: &str, role_id: &str, reason: &str) -> BotResult<()> {
        info!("Revoked role {} from {} ({})", role_id, user_id, reason);
        Ok(())
    }
}

/// Publish stdin lines to `stream` until EOF
pub async fn pump_stdin(stream: EventStream, operator_id: String, operator_roles: Vec<String>) -> BotResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let message =
            InboundMessage::new(CONSOLE_CHANNEL, operator_id.as_str(), line).with_roles(operator_roles.clone());
        stream.publish(message);
    }

    info!("Console input closed");
    Ok(())
}

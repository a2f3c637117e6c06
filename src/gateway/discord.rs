/// Notifier backed by the Discord REST API
use crate::{
    config::DiscordConfig,
    error::{BotError, BotResult},
    gateway::{Notifier, SentMessage},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateDm<'a> {
    recipient_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

/// Posts, deletes and DMs over HTTPS with a bot token
#[derive(Clone)]
pub struct DiscordNotifier {
    http_client: Client,
    api_base: String,
    guild_id: String,
    token: String,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig) -> BotResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(concat!("cloudservices/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            guild_id: config.guild_id.clone(),
            token: config.token.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", self.token))
    }

    async fn check(response: Response, what: &str) -> BotResult<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Notification(format!(
                "{} failed with {}: {}",
                what, status, body
            )));
        }
        Ok(response)
    }

    async fn create_message(&self, channel_id: &str, content: &str) -> BotResult<SentMessage> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&CreateMessage { content })
            .send()
            .await?;
        let message: IdOnly = Self::check(response, "Create message").await?.json().await?;

        debug!("Posted message {} to channel {}", message.id, channel_id);
        Ok(SentMessage {
            channel_id: channel_id.to_string(),
            message_id: message.id,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn post_to_channel(&self, channel_id: &str, content: &str) -> BotResult<SentMessage> {
        self.create_message(channel_id, content).await
    }

    async fn send_direct(&self, user_id: &str, content: &str) -> BotResult<()> {
        let url = format!("{}/users/@me/channels", self.api_base);
        let response = self
            .authorize(self.http_client.post(&url))
            .json(&CreateDm {
                recipient_id: user_id,
            })
            .send()
            .await?;
        let dm: IdOnly = Self::check(response, "Open DM channel").await?.json().await?;

        self.create_message(&dm.id, content).await?;
        Ok(())
    }

    async fn delete_message(&self, message: &SentMessage) -> BotResult<()> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.api_base, message.channel_id, message.message_id
        );
        let response = self
            .authorize(self.http_client.delete(&url))
            .send()
            .await?;
        Self::check(response, "Delete message").await?;
        Ok(())
    }

    async fn revoke_role(&self, user_id: &str, role_id: &str, reason: &str) -> BotResult<()> {
        let url = format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.api_base, self.guild_id, user_id, role_id
        );
        let response = self
            .authorize(self.http_client.delete(&url))
            .header("X-Audit-Log-Reason", reason)
            .send()
            .await?;
        Self::check(response, "Remove member role").await?;
        Ok(())
    }
}

/// Chat gateway surface
///
/// The gateway connection itself lives outside this crate. What the bot needs
/// from it is an inbound message stream ([`EventStream`]) and an outbound
/// [`Notifier`].

pub mod console;
pub mod discord;
pub mod notifier;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;
pub use notifier::{Notifier, SentMessage};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the inbound broadcast buffer per subscriber
const STREAM_CAPACITY: usize = 256;

/// A message received from the chat platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub channel_id: String,
    pub author_id: String,
    /// Role ids the author holds in the guild
    #[serde(default)]
    pub author_roles: Vec<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            author_roles: Vec::new(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.author_roles = roles;
        self
    }

    /// Whether this message was written by `author_id` in `channel_id`
    pub fn is_reply_from(&self, channel_id: &str, author_id: &str) -> bool {
        self.channel_id == channel_id && self.author_id == author_id
    }
}

/// Fan-out of inbound messages to every live subscription
#[derive(Clone)]
pub struct EventStream {
    sender: broadcast::Sender<InboundMessage>,
}

impl EventStream {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(STREAM_CAPACITY);
        Self { sender }
    }

    /// Deliver a message to all subscriptions; returns how many received it
    pub fn publish(&self, message: InboundMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    /// Register a listener. The listener is removed when the handle drops.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of waiting on a subscription
#[derive(Debug)]
pub enum Received {
    Message(InboundMessage),
    /// The subscriber fell behind and `n` messages were dropped for it
    Lagged(u64),
    Closed,
}

/// Handle for one registered listener on an [`EventStream`]
pub struct Subscription {
    receiver: broadcast::Receiver<InboundMessage>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Received {
        match self.receiver.recv().await {
            Ok(message) => Received::Message(message),
            Err(broadcast::error::RecvError::Lagged(n)) => Received::Lagged(n),
            Err(broadcast::error::RecvError::Closed) => Received::Closed,
        }
    }
}

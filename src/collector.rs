/// Interactive single-reply prompts
///
/// A collector posts a prompt and waits for the first inbound message that
/// passes its predicate and choice set, or for the timeout. Exactly one of the
/// two outcomes is reported, and the stream subscription is released as soon
/// as either settles.
use crate::{
    error::{BotError, BotResult},
    gateway::{EventStream, InboundMessage, Notifier, Received, SentMessage, Subscription},
    metrics,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type Predicate = Box<dyn Fn(&InboundMessage) -> bool + Send + Sync>;

/// How a single prompt should be answered
pub struct CollectOptions {
    pub timeout: Duration,
    /// Delete the prompt once the collection settles
    pub delete_on_resolve: bool,
    /// Accepted replies (exact match); any non-empty reply when `None`
    pub choices: Option<Vec<String>>,
    predicate: Option<Predicate>,
}

impl CollectOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            delete_on_resolve: false,
            choices: None,
            predicate: None,
        }
    }

    pub fn delete_on_resolve(mut self, delete: bool) -> Self {
        self.delete_on_resolve = delete;
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Only consider replies by the author of `message` in its channel
    pub fn reply_to(self, message: &InboundMessage) -> Self {
        let channel_id = message.channel_id.clone();
        let author_id = message.author_id.clone();
        self.filter(move |msg| msg.is_reply_from(&channel_id, &author_id))
    }

    fn accepts(&self, message: &InboundMessage) -> bool {
        if let Some(predicate) = &self.predicate {
            if !predicate(message) {
                return false;
            }
        }

        match &self.choices {
            Some(choices) => choices.iter().any(|choice| *choice == message.content),
            None => !message.content.trim().is_empty(),
        }
    }
}

/// Timeout-bounded prompt/answer protocol over the inbound stream
#[derive(Clone)]
pub struct InputCollector {
    stream: EventStream,
    notifier: Arc<dyn Notifier>,
}

impl InputCollector {
    pub fn new(stream: EventStream, notifier: Arc<dyn Notifier>) -> Self {
        Self { stream, notifier }
    }

    /// Post `prompt` to `channel_id` and wait for a qualifying reply
    pub async fn collect(
        &self,
        channel_id: &str,
        prompt: &str,
        options: CollectOptions,
    ) -> BotResult<InboundMessage> {
        // Subscribe before prompting so a fast reply cannot slip past.
        let mut subscription = self.stream.subscribe();
        let prompt_message = self.notifier.post_to_channel(channel_id, prompt).await?;

        let outcome = tokio::time::timeout(
            options.timeout,
            Self::next_accepted(&mut subscription, &options),
        )
        .await;
        drop(subscription);

        if options.delete_on_resolve {
            self.discard_prompt(&prompt_message).await;
        }

        match outcome {
            Ok(Ok(message)) => {
                debug!("Collected reply {} in {}", message.message_id, channel_id);
                metrics::record_collector_outcome("accepted");
                Ok(message)
            }
            Ok(Err(e)) => {
                metrics::record_collector_outcome("closed");
                Err(e)
            }
            Err(_) => {
                debug!("Prompt in {} timed out after {:?}", channel_id, options.timeout);
                metrics::record_collector_outcome("timeout");
                Err(BotError::CollectionTimeout)
            }
        }
    }

    async fn next_accepted(
        subscription: &mut Subscription,
        options: &CollectOptions,
    ) -> BotResult<InboundMessage> {
        loop {
            match subscription.recv().await {
                Received::Message(message) if options.accepts(&message) => return Ok(message),
                Received::Message(_) => continue,
                Received::Lagged(skipped) => {
                    warn!("Input collector lagged, {} messages skipped", skipped);
                }
                Received::Closed => {
                    return Err(BotError::Internal("Inbound message stream closed".to_string()))
                }
            }
        }
    }

    async fn discard_prompt(&self, prompt: &SentMessage) {
        if let Err(e) = self.notifier.delete_message(prompt).await {
            warn!("Failed to delete prompt {}: {}", prompt.message_id, e);
        }
    }
}

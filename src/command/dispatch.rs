/// Command dispatch loop and its error policy
use crate::{
    command::{resolve, tokenize, Command, CommandContext},
    context::AppContext,
    error::BotError,
    gateway::{InboundMessage, Received, Subscription},
    metrics,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// How a single inbound message was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command line, an unknown command, or the bot's own message
    Ignored,
    Disabled(String),
    Denied(String),
    Completed(String),
    /// The handler failed; the command has been disabled
    Failed(String),
}

/// Resolves inbound messages to commands and runs them
pub struct Dispatcher {
    app: Arc<AppContext>,
}

impl Dispatcher {
    pub fn new(app: Arc<AppContext>) -> Self {
        Self { app }
    }

    /// Consume the stream, handling every message on its own task
    pub async fn run(self: Arc<Self>, mut subscription: Subscription) {
        info!("Command dispatcher started");

        loop {
            match subscription.recv().await {
                Received::Message(message) => {
                    let dispatcher = Arc::clone(&self);
                    tokio::spawn(async move {
                        dispatcher.handle(message).await;
                    });
                }
                Received::Lagged(skipped) => {
                    warn!("Dispatcher lagged, {} messages dropped", skipped);
                }
                Received::Closed => break,
            }
        }

        info!("Command dispatcher stopped");
    }

    /// Handle one inbound message
    pub async fn handle(&self, message: InboundMessage) -> DispatchOutcome {
        if self.app.is_self(&message.author_id) {
            return DispatchOutcome::Ignored;
        }

        let Some(tokens) = tokenize(&message.content, &self.app.config.bot.prefix) else {
            return DispatchOutcome::Ignored;
        };
        let Some(resolved) = resolve(&self.app.registry, &tokens) else {
            return DispatchOutcome::Ignored;
        };
        let command = resolved.command;

        if !command.is_enabled() {
            self.reply(&message, "***This command has been disabled.***")
                .await;
            return DispatchOutcome::Disabled(command.name.clone());
        }

        if !command.permissions.allows(&message) {
            self.reply(&message, "***You do not have permission to run this command.***")
                .await;
            return DispatchOutcome::Denied(command.name.clone());
        }

        debug!(
            "Running {} for {} with {} args",
            command.name,
            message.author_id,
            resolved.args.len()
        );

        let ctx = CommandContext {
            app: &self.app,
            message: &message,
            command: &command,
            path: resolved.path,
            args: resolved.args,
        };

        let started = Instant::now();
        let result = command.handler().run(&ctx).await;
        metrics::record_command(
            &command.name,
            started.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        match result {
            Ok(()) => DispatchOutcome::Completed(command.name.clone()),
            Err(e) => {
                self.handle_error(&e, &message, Some(command.as_ref())).await;
                DispatchOutcome::Failed(command.name.clone())
            }
        }
    }

    /// Log, audit, and (when the failing command is known) disable it
    pub async fn handle_error(&self, err: &BotError, message: &InboundMessage, command: Option<&Command>) {
        error!(
            "Command failed for message {} by {}: {}",
            message.message_id, message.author_id, err
        );

        if let Some(command) = command {
            command.set_enabled(false);
            warn!("Disabled command {} after unexpected error", command.name);
        }

        let audit = format!(
            "**Error caused by <@{}>**\nChannel: <#{}> | Message: `{}`\nContent: {}\n```\n{}\n```",
            message.author_id, message.channel_id, message.message_id, message.content, err
        );
        if let Err(e) = self
            .app
            .notifier
            .post_to_channel(&self.app.config.channels.error_channel_id, &audit)
            .await
        {
            error!("Failed to post error audit: {}", e);
        }

        let notice = format!(
            "***An unexpected error has occurred - please contact a member of the Engineering Team.{}***",
            if command.is_some() {
                " This command has been disabled."
            } else {
                ""
            }
        );
        self.reply(message, &notice).await;
    }

    async fn reply(&self, message: &InboundMessage, content: &str) {
        if let Err(e) = self
            .app
            .notifier
            .post_to_channel(&message.channel_id, content)
            .await
        {
            warn!("Failed to reply in {}: {}", message.channel_id, e);
        }
    }
}

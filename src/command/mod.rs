/// Command model
///
/// Commands are built at startup from a static constructor table
/// ([`loader`]), stored in a [`Registry`] tree, resolved from raw tokens
/// ([`resolver`]) and executed by the [`dispatch::Dispatcher`].

pub mod dispatch;
pub mod loader;
pub mod registry;
pub mod resolver;

pub use dispatch::{DispatchOutcome, Dispatcher};
pub use loader::{load_commands, CommandConstructor, LoadReport};
pub use registry::Registry;
pub use resolver::{resolve, tokenize, Resolved};

use crate::{
    context::AppContext,
    error::BotResult,
    gateway::{InboundMessage, SentMessage},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Who may run a command
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    /// Open to everyone when set
    pub everyone: bool,
    pub roles: Vec<String>,
    pub users: Vec<String>,
}

impl Permissions {
    pub fn everyone() -> Self {
        Self {
            everyone: true,
            ..Self::default()
        }
    }

    pub fn restricted(roles: Vec<String>, users: Vec<String>) -> Self {
        Self {
            everyone: false,
            roles,
            users,
        }
    }

    pub fn allows(&self, message: &InboundMessage) -> bool {
        self.everyone
            || self.users.iter().any(|user| *user == message.author_id)
            || self
                .roles
                .iter()
                .any(|role| message.author_roles.contains(role))
    }
}

/// Per-invocation state handed to a handler
pub struct CommandContext<'a> {
    pub app: &'a AppContext,
    pub message: &'a InboundMessage,
    /// The resolved (deepest) command
    pub command: &'a Command,
    /// Names leading to `command`, e.g. `["modlogs", "recent"]`
    pub path: Vec<String>,
    /// Tokens left after resolution
    pub args: Vec<String>,
}

impl<'a> CommandContext<'a> {
    /// Post a message to the channel the command came from
    pub async fn reply(&self, content: impl AsRef<str> + Send) -> BotResult<SentMessage> {
        self.app
            .notifier
            .post_to_channel(&self.message.channel_id, content.as_ref())
            .await
    }

    /// Reply with the command's usage line, spelled from the top-level name
    pub async fn reply_usage(&self) -> BotResult<SentMessage> {
        let usage = self.command.usage.as_deref().unwrap_or("");
        self.reply(format!(
            "Usage: `{}{} {}`",
            self.app.config.bot.prefix,
            self.path.join(" "),
            usage
        ))
        .await
    }

    /// Everything from argument `index` onward joined by single spaces
    pub fn rest(&self, index: usize) -> Option<String> {
        let rest = self.args.get(index..)?.join(" ");
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()>;
}

/// A command definition, possibly with nested subcommands
pub struct Command {
    /// Lowercase primary name
    pub name: String,
    /// Lowercase alternative names
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub permissions: Permissions,
    pub subcommands: Registry,
    enabled: AtomicBool,
    handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn new(name: &str, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.to_lowercase(),
            aliases: Vec::new(),
            description: None,
            usage: None,
            permissions: Permissions::everyone(),
            subcommands: Registry::new(),
            enabled: AtomicBool::new(true),
            handler: Arc::new(handler),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Attach a subcommand; fails on a name or alias clash among siblings
    pub fn subcommand(mut self, command: Command) -> BotResult<Self> {
        self.subcommands.register(command)?;
        Ok(self)
    }

    /// Case-insensitive match against the name or any alias
    pub fn matches(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.name == token || self.aliases.contains(&token)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("enabled", &self.is_enabled())
            .field("subcommands", &self.subcommands.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NoopHandler;

    #[test]
    fn test_names_are_case_insensitive() {
        let command = Command::new("CreateAccount", NoopHandler).alias("CA");
        assert_eq!(command.name, "createaccount");
        assert!(command.matches("CREATEACCOUNT"));
        assert!(command.matches("ca"));
        assert!(!command.matches("create"));
    }

    #[test]
    fn test_enabled_flag_toggles() {
        let command = Command::new("lock", NoopHandler);
        assert!(command.is_enabled());
        command.set_enabled(false);
        assert!(!command.is_enabled());
    }

    #[test]
    fn test_permissions() {
        let message = InboundMessage::new("c1", "u1", "=lock").with_roles(vec!["staff".into()]);

        assert!(Permissions::everyone().allows(&message));
        assert!(Permissions::restricted(vec!["staff".into()], vec![]).allows(&message));
        assert!(Permissions::restricted(vec![], vec!["u1".into()]).allows(&message));
        assert!(!Permissions::restricted(vec!["admin".into()], vec!["u2".into()]).allows(&message));
        assert!(!Permissions::default().allows(&message));
    }
}

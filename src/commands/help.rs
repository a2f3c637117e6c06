use crate::{
    command::{resolve, Command, CommandContext, CommandHandler},
    config::BotConfig,
    error::BotResult,
    util::{split_string, MESSAGE_LIMIT},
};
use async_trait::async_trait;

pub struct Help;

fn describe(prefix: &str, command: &Command) -> String {
    let mut lines = vec![format!("**{}{}**", prefix, command.name)];
    if let Some(description) = &command.description {
        lines.push(description.clone());
    }
    if let Some(usage) = &command.usage {
        lines.push(format!("Usage: `{}{} {}`", prefix, command.name, usage));
    }
    if !command.aliases.is_empty() {
        lines.push(format!("Aliases: {}", command.aliases.join(", ")));
    }
    if !command.subcommands.is_empty() {
        let names: Vec<&str> = command.subcommands.iter().map(|c| c.name.as_str()).collect();
        lines.push(format!("Subcommands: {}", names.join(", ")));
    }
    if !command.is_enabled() {
        lines.push("_This command is currently disabled._".to_string());
    }
    lines.join("\n")
}

#[async_trait]
impl CommandHandler for Help {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let prefix = &ctx.app.config.bot.prefix;

        let text = if ctx.args.is_empty() {
            let mut lines = vec!["**Commands**".to_string()];
            for command in ctx.app.registry.iter() {
                if !command.permissions.allows(ctx.message) {
                    continue;
                }
                lines.push(format!(
                    "`{}{}` - {}",
                    prefix,
                    command.name,
                    command.description.as_deref().unwrap_or("No description")
                ));
            }
            lines.join("\n")
        } else {
            match resolve(&ctx.app.registry, &ctx.args) {
                Some(resolved) => describe(prefix, &resolved.command),
                None => "***Command not found***".to_string(),
            }
        };

        for chunk in split_string(&text, MESSAGE_LIMIT) {
            ctx.reply(chunk).await?;
        }
        Ok(())
    }
}

pub fn command(_config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("help", Help)
        .description("Information about commands")
        .usage("[command]"))
}

#[cfg(test)]
mod tests {
    use crate::testing::{builtin_context, run_as_operator};

    #[tokio::test]
    async fn test_lists_commands() {
        let harness = builtin_context().await;
        let replies = run_as_operator(&harness, "=help").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("`=ping` - Pings the bot"));
        assert!(replies[0].contains("`=deleteaccount`"));
    }

    #[tokio::test]
    async fn test_describes_subcommand() {
        let harness = builtin_context().await;
        let replies = run_as_operator(&harness, "=help modlogs recent").await;
        assert!(replies[0].starts_with("**=recent**"));

        let replies = run_as_operator(&harness, "=help ca").await;
        assert!(replies[0].contains("Aliases: ca"));

        let replies = run_as_operator(&harness, "=help nothing").await;
        assert_eq!(replies, vec!["***Command not found***".to_string()]);
    }
}

use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{parse_target, staff},
    config::BotConfig,
    db::ModerationLog,
    error::BotResult,
    lifecycle::notice::summarize,
    util::{split_string, MESSAGE_LIMIT},
};
use async_trait::async_trait;

const DEFAULT_RECENT: u32 = 10;
const MAX_RECENT: u32 = 50;

async fn post_logs(ctx: &CommandContext<'_>, header: String, logs: &[ModerationLog]) -> BotResult<()> {
    let system_id = &ctx.app.config.bot.user_id;
    let mut lines = vec![header];
    lines.extend(logs.iter().map(|log| summarize(log, system_id)));

    for chunk in split_string(&lines.join("\n"), MESSAGE_LIMIT) {
        ctx.reply(chunk).await?;
    }
    Ok(())
}

pub struct ModLogs;

#[async_trait]
impl CommandHandler for ModLogs {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };
        let target = parse_target(target);

        let logs = ctx.app.store.logs_for(target).await?;
        if logs.is_empty() {
            ctx.reply(format!("***No moderation logs found for {}***", target))
                .await?;
            return Ok(());
        }

        post_logs(
            ctx,
            format!("**Moderation logs for {}** ({})", target, logs.len()),
            &logs,
        )
        .await
    }
}

pub struct Recent;

#[async_trait]
impl CommandHandler for Recent {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let limit = match ctx.args.first() {
            Some(arg) => match arg.parse::<u32>() {
                Ok(n) if n > 0 => n.min(MAX_RECENT),
                _ => {
                    ctx.reply_usage().await?;
                    return Ok(());
                }
            },
            None => DEFAULT_RECENT,
        };

        let logs = ctx.app.store.recent_logs(limit).await?;
        if logs.is_empty() {
            ctx.reply("***No moderation logs recorded yet***").await?;
            return Ok(());
        }

        post_logs(
            ctx,
            format!("**Latest {} moderation logs**", logs.len()),
            &logs,
        )
        .await
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Command::new("modlogs", ModLogs)
        .description("Shows the moderation history of an account")
        .usage("<Username | User ID>")
        .permissions(staff(config))
        .subcommand(
            Command::new("recent", Recent)
                .description("Shows the latest moderation logs across all accounts")
                .usage("[count]")
                .permissions(staff(config)),
        )
}

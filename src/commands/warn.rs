use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{parse_target, report, staff},
    config::BotConfig,
    error::BotResult,
};
use async_trait::async_trait;

pub struct Warn;

#[async_trait]
impl CommandHandler for Warn {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let (Some(target), Some(reason)) = (ctx.args.first(), ctx.rest(1)) else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        let warned = ctx
            .app
            .lifecycle
            .warn(parse_target(target), &ctx.message.author_id, &reason)
            .await;
        if let Some(log) = report(ctx, warned).await? {
            ctx.reply(format!("***Account {} has been warned***", log.username))
                .await?;
        }
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("warn", Warn)
        .description("Sends an official warning to a user")
        .usage("<Username | User ID> <Reason>")
        .permissions(staff(config)))
}

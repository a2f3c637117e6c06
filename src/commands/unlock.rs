use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{moderators, parse_target, report},
    config::BotConfig,
    error::BotResult,
};
use async_trait::async_trait;

pub struct Unlock;

#[async_trait]
impl CommandHandler for Unlock {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        let reason = ctx.rest(1);
        let unlocked = ctx
            .app
            .lifecycle
            .unlock(parse_target(target), &ctx.message.author_id, reason.as_deref())
            .await;
        if let Some(log) = report(ctx, unlocked).await? {
            ctx.reply(format!("***Account {} has been unlocked***", log.username))
                .await?;
        }
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("unlock", Unlock)
        .description("Unlocks an account")
        .usage("<Username | User ID> [Reason]")
        .permissions(moderators(config)))
}

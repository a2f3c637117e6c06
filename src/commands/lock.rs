use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{moderators, parse_target, report},
    config::BotConfig,
    error::BotResult,
    util::{format_long_date, parse_duration},
};
use async_trait::async_trait;

pub struct Lock;

#[async_trait]
impl CommandHandler for Lock {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        // A leading duration token is optional; everything else is the reason.
        // A token that starts with a digit is always read as a duration.
        let (duration, reason) = match ctx.args.get(1) {
            Some(arg) if arg.starts_with(|c: char| c.is_ascii_digit()) => {
                let Some(duration) = report(ctx, parse_duration(arg)).await? else {
                    return Ok(());
                };
                (Some(duration), ctx.rest(2))
            }
            _ => (None, ctx.rest(1)),
        };

        let locked = ctx
            .app
            .lifecycle
            .lock(
                parse_target(target),
                &ctx.message.author_id,
                reason.as_deref(),
                duration,
            )
            .await;
        let Some(log) = report(ctx, locked).await? else {
            return Ok(());
        };

        let until = match log.expiration.and_then(|expiration| expiration.date) {
            Some(date) => format!(" until {}", format_long_date(date)),
            None => " indefinitely".to_string(),
        };
        ctx.reply(format!(
            "***Account {} has been locked{}***",
            log.username, until
        ))
        .await?;
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("lock", Lock)
        .description("Locks an account")
        .usage("<Username | User ID> [Duration, e.g. 30m, 2h, 7d] [Reason]")
        .permissions(moderators(config)))
}

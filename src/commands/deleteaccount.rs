use crate::{
    collector::CollectOptions,
    command::{Command, CommandContext, CommandHandler},
    commands::{administrators, parse_target, report},
    config::BotConfig,
    error::BotResult,
};
use async_trait::async_trait;
use std::time::Duration;

/// How long the invoker has to confirm
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DeleteAccount;

#[async_trait]
impl CommandHandler for DeleteAccount {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        let found = ctx.app.lifecycle.find(parse_target(target)).await;
        let Some(account) = report(ctx, found).await? else {
            return Ok(());
        };

        let answer = ctx
            .app
            .collector
            .collect(
                &ctx.message.channel_id,
                &format!(
                    "***Are you sure you want to delete {} (<@{}>)? This cannot be undone. (yes/no)***",
                    account.username, account.user_id
                ),
                CollectOptions::new(CONFIRM_TIMEOUT)
                    .delete_on_resolve(true)
                    .reply_to(ctx.message)
                    .choices(["yes", "no"]),
            )
            .await;
        let Some(answer) = report(ctx, answer).await? else {
            return Ok(());
        };
        if answer.content != "yes" {
            ctx.reply("***Deletion cancelled***").await?;
            return Ok(());
        }

        let reason = ctx.rest(1);
        let deleted = ctx
            .app
            .lifecycle
            .delete(&account.username, &ctx.message.author_id, reason.as_deref())
            .await;
        if let Some(log) = report(ctx, deleted).await? {
            ctx.reply(format!("***Account {} has been deleted***", log.username))
                .await?;
        }
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("deleteaccount", DeleteAccount)
        .alias("da")
        .description("Deletes a Cloud Account")
        .usage("<Username | User ID> [Reason]")
        .permissions(administrators(config)))
}

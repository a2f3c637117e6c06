use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{parse_target, report, staff},
    config::BotConfig,
    error::BotResult,
};
use async_trait::async_trait;
use tracing::warn;

pub struct ResetPassword;

#[async_trait]
impl CommandHandler for ResetPassword {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        let reset = ctx
            .app
            .lifecycle
            .reset_password(parse_target(target), &ctx.message.author_id)
            .await;
        let Some((account, password)) = report(ctx, reset).await? else {
            return Ok(());
        };

        let notice = format!(
            "The password for your Cloud Account `{}` has been reset.\nTemporary password: `{}`\nYou will be asked to change it on next login.",
            account.username, password
        );
        if let Err(e) = ctx.app.notifier.send_direct(&account.user_id, &notice).await {
            warn!("Failed to send new password to {}: {}", account.user_id, e);
        }
        if let Err(e) = ctx
            .app
            .mailer
            .send_password_reset_email(&account.email_address, &account.username, &password)
            .await
        {
            warn!("Failed to email {}: {}", account.email_address, e);
        }

        ctx.reply(format!(
            "***Password for {} has been reset and sent to the account holder***",
            account.username
        ))
        .await?;
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("resetpassword", ResetPassword)
        .alias("rp")
        .description("Resets a Cloud Account password")
        .usage("<Username | User ID>")
        .permissions(staff(config)))
}

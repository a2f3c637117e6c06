use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{parse_target, report, staff},
    config::BotConfig,
    error::BotResult,
    lifecycle::notice::moderator_label,
};
use async_trait::async_trait;

pub struct Whois;

#[async_trait]
impl CommandHandler for Whois {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let Some(target) = ctx.args.first() else {
            ctx.reply_usage().await?;
            return Ok(());
        };

        let found = ctx.app.lifecycle.find(parse_target(target)).await;
        let Some(account) = report(ctx, found).await? else {
            return Ok(());
        };
        let log_count = ctx.app.store.logs_for(&account.username).await?.len();

        let lines = [
            format!("**Account Information | {}**", account.username),
            format!("**User:** <@{}>", account.user_id),
            format!("**Email Address:** {}", account.email_address),
            format!(
                "**Created:** {} by {}",
                account.created_at.format("%Y-%m-%d %H:%M UTC"),
                moderator_label(&account.created_by, &ctx.app.config.bot.user_id)
            ),
            format!("**Locked:** {}", if account.locked { "Yes" } else { "No" }),
            format!(
                "**SecureSign:** {}",
                if account.ss_init { "Initialized" } else { "Not initialized" }
            ),
            format!("**Home:** `{}`", account.home_path),
            format!("**Moderation Logs:** {}", log_count),
        ];
        ctx.reply(lines.join("\n")).await?;
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("whois", Whois)
        .description("Shows Cloud Account information")
        .usage("<Username | User ID>")
        .permissions(staff(config)))
}

use crate::{
    command::{Command, CommandContext, CommandHandler},
    commands::{administrators, parse_target, report},
    config::BotConfig,
    error::BotResult,
    lifecycle::NewAccount,
    util,
};
use async_trait::async_trait;
use tracing::warn;

pub struct CreateAccount;

#[async_trait]
impl CommandHandler for CreateAccount {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let [user_id, email, username] = match ctx.args.as_slice() {
            [user_id, email, username, ..] => [parse_target(user_id), email.as_str(), username.as_str()],
            _ => {
                ctx.reply_usage().await?;
                return Ok(());
            }
        };

        let password = util::random_password();
        let new = NewAccount {
            username: username.to_lowercase(),
            user_id: user_id.to_string(),
            email_address: email.to_string(),
            password: password.clone(),
            full_name: None,
        };
        let created = ctx
            .app
            .lifecycle
            .create(new, &ctx.message.author_id)
            .await;
        let Some(account) = report(ctx, created).await? else {
            return Ok(());
        };

        let credentials = format!(
            "Your Cloud Account has been created.\nUsername: `{}`\nTemporary password: `{}`\nYou will be asked to change it on first login.",
            account.username, password
        );
        if let Err(e) = ctx.app.notifier.send_direct(&account.user_id, &credentials).await {
            warn!("Failed to send credentials to {}: {}", account.user_id, e);
        }
        if let Err(e) = ctx
            .app
            .mailer
            .send_welcome_email(&account.email_address, &account.username, &password)
            .await
        {
            warn!("Failed to email {}: {}", account.email_address, e);
        }

        ctx.reply(format!(
            "***Account {} created for <@{}>***",
            account.username, account.user_id
        ))
        .await?;
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("createaccount", CreateAccount)
        .alias("ca")
        .description("Creates a new Cloud Account")
        .usage("<User ID> <Email> <Account name>")
        .permissions(administrators(config)))
}

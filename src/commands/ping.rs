use crate::{
    command::{Command, CommandContext, CommandHandler},
    config::BotConfig,
    error::BotResult,
};
use async_trait::async_trait;
use chrono::Utc;

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let latency = Utc::now() - ctx.message.timestamp;
        ctx.reply(format!(
            "Pong!\nResponse: `{}ms`",
            latency.num_milliseconds().max(0)
        ))
        .await?;
        Ok(())
    }
}

pub fn command(_config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("ping", Ping).description("Pings the bot"))
}

use crate::{
    command::{Command, CommandContext, CommandHandler},
    config::BotConfig,
    error::BotResult,
    metrics,
    util::{split_string, MESSAGE_LIMIT},
};
use async_trait::async_trait;

pub struct Stats;

#[async_trait]
impl CommandHandler for Stats {
    async fn run(&self, ctx: &CommandContext<'_>) -> BotResult<()> {
        let text = metrics::render_metrics();
        if text.trim().is_empty() {
            ctx.reply("***No metrics recorded yet***").await?;
            return Ok(());
        }

        // Leave room for the code fence around each chunk
        for chunk in split_string(&text, MESSAGE_LIMIT - 8) {
            ctx.reply(format!("```\n{}\n```", chunk)).await?;
        }
        Ok(())
    }
}

pub fn command(config: &BotConfig) -> BotResult<Command> {
    Ok(Command::new("stats", Stats)
        .description("Shows the bot's Prometheus metrics")
        .permissions(super::administrators(config)))
}

/// Built-in commands
///
/// [`BUILTIN`] is the static registration table handed to
/// [`load_commands`](crate::command::load_commands) at startup.

pub mod createaccount;
pub mod deleteaccount;
pub mod help;
pub mod lock;
pub mod modlogs;
pub mod ping;
pub mod resetpassword;
pub mod stats;
pub mod unlock;
pub mod warn;
pub mod whois;

use crate::{
    command::{CommandConstructor, CommandContext, Permissions},
    config::BotConfig,
    error::BotResult,
};
use tracing::debug;

pub const BUILTIN: &[CommandConstructor] = &[
    ping::command,
    help::command,
    createaccount::command,
    warn::command,
    lock::command,
    unlock::command,
    deleteaccount::command,
    resetpassword::command,
    modlogs::command,
    whois::command,
    stats::command,
];

fn restricted(config: &BotConfig, roles: Vec<&Vec<String>>) -> Permissions {
    Permissions::restricted(
        roles.into_iter().flatten().cloned().collect(),
        vec![config.bot.console_operator_id.clone()],
    )
}

/// Staff, moderators and administrators
pub fn staff(config: &BotConfig) -> Permissions {
    restricted(
        config,
        vec![
            &config.roles.staff,
            &config.roles.moderators,
            &config.roles.administrators,
        ],
    )
}

/// Moderators and administrators
pub fn moderators(config: &BotConfig) -> Permissions {
    restricted(
        config,
        vec![&config.roles.moderators, &config.roles.administrators],
    )
}

pub fn administrators(config: &BotConfig) -> Permissions {
    restricted(config, vec![&config.roles.administrators])
}

/// Accept a raw id or a `<@id>` / `<@!id>` mention
pub fn parse_target(arg: &str) -> &str {
    arg.strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|id| id.trim_start_matches('!'))
        .unwrap_or(arg)
}

/// Turn an expected failure into a reply; anything else goes back to the
/// dispatcher.
pub async fn report<T>(ctx: &CommandContext<'_>, result: BotResult<T>) -> BotResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_user_facing() => {
            debug!("{} reported to {}: {}", ctx.command.name, ctx.message.author_id, e);
            ctx.reply(format!("***{}***", e)).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// How moderation logs are presented in the audit channel and direct messages
use crate::{
    db::{ModerationAction, ModerationLog},
    util::format_long_date,
};

/// Fixed presentation of one action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionStyle {
    pub title: &'static str,
    /// RGB hex, no leading `#`
    pub colour: &'static str,
    /// Label of the field naming who issued the action
    pub actor_label: &'static str,
}

impl ModerationAction {
    pub fn style(&self) -> ActionStyle {
        match self {
            ModerationAction::Create => ActionStyle {
                title: "Cloud Account | Create",
                colour: "00ff00",
                actor_label: "Administrator",
            },
            ModerationAction::Warn => ActionStyle {
                title: "Account Warning | Warn",
                colour: "ffff00",
                actor_label: "Staff",
            },
            ModerationAction::Lock => ActionStyle {
                title: "Account Infraction | Lock",
                colour: "ff6600",
                actor_label: "Moderator",
            },
            ModerationAction::Unlock => ActionStyle {
                title: "Account Reclaim | Unlock",
                colour: "0099ff",
                actor_label: "Moderator",
            },
            ModerationAction::Delete => ActionStyle {
                title: "Cloud Account | Delete",
                colour: "ff0000",
                actor_label: "Administrator",
            },
        }
    }
}

/// `SYSTEM` for actions the bot issued itself, a mention otherwise
pub fn moderator_label(moderator_id: &str, bot_user_id: &str) -> String {
    if moderator_id == bot_user_id {
        "SYSTEM".to_string()
    } else {
        format!("<@{}>", moderator_id)
    }
}

/// Render the audit notice for `log`
pub fn render_notice(log: &ModerationLog, bot_user_id: &str, footer: &str) -> String {
    let style = log.action.style();
    let mut lines = vec![
        format!("**{}** `#{}`", style.title, style.colour),
        format!("**User:** {} | <@{}>", log.username, log.user_id),
        format!(
            "**{}:** {}",
            style.actor_label,
            moderator_label(&log.moderator_id, bot_user_id)
        ),
    ];

    if let Some(reason) = &log.reason {
        lines.push(format!("**Reason:** {}", reason));
    }

    if log.action == ModerationAction::Lock {
        let until = log
            .expiration
            .and_then(|expiration| expiration.date)
            .map(format_long_date)
            .unwrap_or_else(|| "Indefinitely".to_string());
        lines.push(format!("**Lock Expiration:** {}", until));
    }

    lines.push(format!(
        "_{} | {}_",
        footer,
        log.issued_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}

/// One-line summary used when listing logs
pub fn summarize(log: &ModerationLog, bot_user_id: &str) -> String {
    let mut line = format!(
        "`{}` **{}** {} by {} on {}",
        log.log_id,
        log.action.as_str(),
        log.username,
        moderator_label(&log.moderator_id, bot_user_id),
        log.issued_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(reason) = &log.reason {
        line.push_str(&format!(" - {}", reason));
    }
    if let Some(date) = log.expiration.and_then(|expiration| expiration.date) {
        line.push_str(&format!(" (until {})", date.format("%Y-%m-%d %H:%M")));
    }
    line
}

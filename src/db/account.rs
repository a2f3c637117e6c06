/// Account and moderation log records
use crate::error::{BotError, BotResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// OS login name
    pub username: String,
    /// Chat platform identity
    pub user_id: String,
    pub email_address: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub locked: bool,
    /// Whether first-login initialization has run
    pub ss_init: bool,
    pub home_path: String,
}

/// Moderation action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Create,
    Warn,
    Lock,
    Unlock,
    Delete,
}

impl ModerationAction {
    pub const ALL: [ModerationAction; 5] = [
        ModerationAction::Create,
        ModerationAction::Warn,
        ModerationAction::Lock,
        ModerationAction::Unlock,
        ModerationAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Create => "create",
            ModerationAction::Warn => "warn",
            ModerationAction::Lock => "lock",
            ModerationAction::Unlock => "unlock",
            ModerationAction::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> BotResult<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(ModerationAction::Create),
            "warn" => Ok(ModerationAction::Warn),
            "lock" => Ok(ModerationAction::Lock),
            "unlock" => Ok(ModerationAction::Unlock),
            "delete" => Ok(ModerationAction::Delete),
            _ => Err(BotError::Validation(format!(
                "Invalid moderation action: {}",
                s
            ))),
        }
    }
}

/// Expiration sub-record of a time-bounded lock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expiration {
    /// `None` for an indefinite lock
    pub date: Option<DateTime<Utc>>,
    /// Set once the lock has been released by the sweep, or immediately for
    /// indefinite locks
    pub processed: bool,
}

impl Expiration {
    pub fn indefinite() -> Self {
        Self {
            date: None,
            processed: true,
        }
    }

    pub fn at(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            processed: false,
        }
    }

    /// An unprocessed expiration whose date has passed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.processed && self.date.map_or(false, |date| date <= now)
    }
}

/// Append-only moderation audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationLog {
    pub log_id: String,
    pub username: String,
    pub user_id: String,
    pub moderator_id: String,
    pub action: ModerationAction,
    pub reason: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expiration: Option<Expiration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_action_from_str() {
        assert_eq!(
            ModerationAction::from_str("LOCK").unwrap(),
            ModerationAction::Lock
        );
        for action in ModerationAction::ALL {
            assert_eq!(ModerationAction::from_str(action.as_str()).unwrap(), action);
        }
        assert!(ModerationAction::from_str("ban").is_err());
    }

    #[test]
    fn test_expiration_due() {
        let now = Utc::now();
        assert!(!Expiration::indefinite().is_due(now));
        assert!(Expiration::at(now - Duration::seconds(1)).is_due(now));
        assert!(!Expiration::at(now + Duration::minutes(5)).is_due(now));

        let released = Expiration {
            date: Some(now - Duration::hours(1)),
            processed: true,
        };
        assert!(!released.is_due(now));
    }
}

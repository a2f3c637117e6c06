/// Persistence boundary for accounts and moderation logs
///
/// The lifecycle manager only talks to the [`AccountStore`] trait; the SQLite
/// implementation lives in [`sqlite`].

pub mod sqlite;

pub use sqlite::SqliteAccountStore;

use crate::{
    db::{Account, ModerationLog},
    error::BotResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account whose username or user id equals `username_or_id`.
    /// A username match wins over a user id match.
    async fn find_account(&self, username_or_id: &str) -> BotResult<Option<Account>>;

    /// Insert or update an account keyed by username
    async fn save_account(&self, account: &Account) -> BotResult<()>;

    /// Remove an account record; returns whether a row was removed
    async fn delete_account(&self, username: &str) -> BotResult<bool>;

    /// Append a moderation log
    async fn save_log(&self, log: &ModerationLog) -> BotResult<()>;

    /// All logs whose username or user id equals `username_or_id`, newest first
    async fn logs_for(&self, username_or_id: &str) -> BotResult<Vec<ModerationLog>>;

    /// The most recent logs across all accounts, newest first
    async fn recent_logs(&self, limit: u32) -> BotResult<Vec<ModerationLog>>;

    /// Unprocessed lock logs whose expiration date is at or before `now`
    async fn expired_locks(&self, now: DateTime<Utc>) -> BotResult<Vec<ModerationLog>>;

    /// Flip `expiration.processed` on a lock log
    async fn mark_processed(&self, log_id: &str) -> BotResult<()>;
}

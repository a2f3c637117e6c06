/// Database layer for the cloudservices bot
///
/// Manages the SQLite connection pool and the account / moderation schema.

pub mod account;

pub use account::{Account, Expiration, ModerationAction, ModerationLog};

use crate::error::BotResult;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> BotResult<SqlitePool> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                })
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Create the account and moderation tables if they are missing
pub async fn init_schema(pool: &SqlitePool) -> BotResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS account (
            username TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL UNIQUE,
            email_address TEXT NOT NULL,
            created_at TEXT NOT NULL,
            created_by TEXT NOT NULL,
            locked INTEGER NOT NULL DEFAULT 0,
            ss_init INTEGER NOT NULL DEFAULT 0,
            home_path TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // No foreign key to account: logs outlive the accounts they describe.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moderation_log (
            log_id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL,
            user_id TEXT NOT NULL,
            moderator_id TEXT NOT NULL,
            action TEXT NOT NULL,
            reason TEXT,
            issued_at TEXT NOT NULL,
            expiration_date TEXT,
            expiration_processed INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_moderation_log_username ON moderation_log (username)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_moderation_log_user_id ON moderation_log (user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> BotResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

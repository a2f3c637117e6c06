/// SQLite-backed account store using runtime queries
use crate::{
    db::{Account, Expiration, ModerationAction, ModerationLog},
    error::{BotError, BotResult},
    store::AccountStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const LOG_COLUMNS: &str = "log_id, username, user_id, moderator_id, action, reason, issued_at,
                           expiration_date, expiration_processed";

/// Account store over a SQLite pool
#[derive(Clone)]
pub struct SqliteAccountStore {
    db: SqlitePool,
}

impl SqliteAccountStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn parse_log(row: &SqliteRow) -> BotResult<ModerationLog> {
        let action_str: String = row.try_get("action")?;
        let action = ModerationAction::from_str(&action_str)?;

        let processed: Option<bool> = row.try_get("expiration_processed")?;
        let date: Option<DateTime<Utc>> = row.try_get("expiration_date")?;
        let expiration = processed.map(|processed| Expiration { date, processed });

        Ok(ModerationLog {
            log_id: row.try_get("log_id")?,
            username: row.try_get("username")?,
            user_id: row.try_get("user_id")?,
            moderator_id: row.try_get("moderator_id")?,
            action,
            reason: row.try_get("reason")?,
            issued_at: row.try_get("issued_at")?,
            expiration,
        })
    }

    fn parse_logs(rows: Vec<SqliteRow>) -> BotResult<Vec<ModerationLog>> {
        rows.iter().map(Self::parse_log).collect()
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn find_account(&self, username_or_id: &str) -> BotResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT username, user_id, email_address, created_at, created_by, locked, ss_init, home_path
             FROM account
             WHERE username = ?1 OR user_id = ?1
             ORDER BY CASE WHEN username = ?1 THEN 0 ELSE 1 END
             LIMIT 1",
        )
        .bind(username_or_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(account)
    }

    async fn save_account(&self, account: &Account) -> BotResult<()> {
        sqlx::query(
            "INSERT INTO account (username, user_id, email_address, created_at, created_by, locked, ss_init, home_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(username) DO UPDATE SET
                user_id = excluded.user_id,
                email_address = excluded.email_address,
                locked = excluded.locked,
                ss_init = excluded.ss_init,
                home_path = excluded.home_path",
        )
        .bind(&account.username)
        .bind(&account.user_id)
        .bind(&account.email_address)
        .bind(account.created_at)
        .bind(&account.created_by)
        .bind(account.locked)
        .bind(account.ss_init)
        .bind(&account.home_path)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                BotError::Conflict(format!(
                    "User {} already has an account",
                    account.user_id
                ))
            }
            other => BotError::Persistence(other),
        })?;

        Ok(())
    }

    async fn delete_account(&self, username: &str) -> BotResult<bool> {
        let result = sqlx::query("DELETE FROM account WHERE username = ?1")
            .bind(username)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_log(&self, log: &ModerationLog) -> BotResult<()> {
        sqlx::query(
            r#"
            INSERT INTO moderation_log
            (log_id, username, user_id, moderator_id, action, reason, issued_at,
             expiration_date, expiration_processed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.log_id)
        .bind(&log.username)
        .bind(&log.user_id)
        .bind(&log.moderator_id)
        .bind(log.action.as_str())
        .bind(&log.reason)
        .bind(log.issued_at)
        .bind(log.expiration.and_then(|e| e.date))
        .bind(log.expiration.map(|e| e.processed))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn logs_for(&self, username_or_id: &str) -> BotResult<Vec<ModerationLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM moderation_log
             WHERE username = ?1 OR user_id = ?1
             ORDER BY issued_at DESC"
        ))
        .bind(username_or_id)
        .fetch_all(&self.db)
        .await?;

        Self::parse_logs(rows)
    }

    async fn recent_logs(&self, limit: u32) -> BotResult<Vec<ModerationLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM moderation_log ORDER BY issued_at DESC LIMIT ?1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Self::parse_logs(rows)
    }

    async fn expired_locks(&self, now: DateTime<Utc>) -> BotResult<Vec<ModerationLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM moderation_log
             WHERE action = 'lock'
               AND expiration_processed = 0
               AND expiration_date IS NOT NULL
             ORDER BY issued_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;

        // Compare parsed timestamps rather than their text encoding.
        Ok(Self::parse_logs(rows)?
            .into_iter()
            .filter(|log| log.expiration.map_or(false, |e| e.is_due(now)))
            .collect())
    }

    async fn mark_processed(&self, log_id: &str) -> BotResult<()> {
        let result = sqlx::query(
            "UPDATE moderation_log SET expiration_processed = 1
             WHERE log_id = ?1 AND expiration_processed IS NOT NULL",
        )
        .bind(log_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BotError::Validation(format!(
                "Moderation log {} has no expiration",
                log_id
            )));
        }

        Ok(())
    }
}

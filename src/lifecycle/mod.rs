/// Account lifecycle management
///
/// Every mutating action is a sequence of provisioning, persistence and
/// notification calls run under a per-username lock, and ends by emitting a
/// [`ModerationLog`]. There is no atomicity across the host and the database:
/// steps are ordered so that a failure leaves the database describing what
/// actually exists on the host.

pub mod keyed_lock;
pub mod notice;

pub use keyed_lock::{KeyedGuard, KeyedLock};

use crate::{
    config::BotConfig,
    db::{Account, Expiration, ModerationAction, ModerationLog},
    error::{BotError, BotResult},
    gateway::Notifier,
    metrics,
    provisioning::{NewUser, ProvisioningBackend},
    store::AccountStore,
    util,
    validation::{validate_new_account, validation_errors_to_bot_error},
};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Reason recorded when the sweep releases a timed lock
pub const LOCK_EXPIRED_REASON: &str = "Lock expired";

/// Reason attached to the member role removal on deletion
const ROLE_REVOKE_REASON: &str = "Cloud Account Deleted";

/// Static settings the manager needs from the configuration
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Identity used for actions the bot performs on its own
    pub system_user_id: String,
    /// Footer shown on audit notices
    pub display_name: String,
    pub audit_channel_id: String,
    /// Empty when no role should be revoked on deletion
    pub member_role_id: String,
    pub shell: String,
    pub home_root: PathBuf,
    pub backup_directory: PathBuf,
}

impl LifecycleSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            system_user_id: config.bot.user_id.clone(),
            display_name: config.bot.username.clone(),
            audit_channel_id: config.channels.audit_channel_id.clone(),
            member_role_id: config.channels.member_role_id.clone(),
            shell: config.provisioning.shell.clone(),
            home_root: config.provisioning.home_root.clone(),
            backup_directory: config.provisioning.backup_directory.clone(),
        }
    }
}

/// Input for [`LifecycleManager::create`]
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub user_id: String,
    pub email_address: String,
    /// Initial password; expired immediately so it must be changed on login
    pub password: String,
    /// GECOS comment, `<username>,<user_id>` when absent
    pub full_name: Option<String>,
}

/// Orchestrates account state transitions
pub struct LifecycleManager {
    store: Arc<dyn AccountStore>,
    backend: Arc<dyn ProvisioningBackend>,
    notifier: Arc<dyn Notifier>,
    settings: LifecycleSettings,
    locks: KeyedLock,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn AccountStore>,
        backend: Arc<dyn ProvisioningBackend>,
        notifier: Arc<dyn Notifier>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            backend,
            notifier,
            settings,
            locks: KeyedLock::new(),
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Look an account up by username or user id
    pub async fn find(&self, target: &str) -> BotResult<Account> {
        self.store
            .find_account(target)
            .await?
            .ok_or_else(|| BotError::AccountNotFound(target.to_string()))
    }

    /// Resolve `target`, take its lock and re-read the record under it
    async fn acquire(&self, target: &str) -> BotResult<(KeyedGuard<'_>, Account)> {
        let username = self.find(target).await?.username;
        let guard = self.locks.lock(&username).await;
        let account = self.find(&username).await?;
        Ok((guard, account))
    }

    /// Provision a new host account and record it
    pub async fn create(&self, new: NewAccount, moderator_id: &str) -> BotResult<Account> {
        validate_new_account(&new.username, &new.email_address)
            .map_err(validation_errors_to_bot_error)?;

        // Both identities are held so neither uniqueness check can race.
        // Keys are taken in a fixed order.
        let (first, second) = if new.username <= new.user_id {
            (&new.username, &new.user_id)
        } else {
            (&new.user_id, &new.username)
        };
        let _first = self.locks.lock(first).await;
        let _second = if first != second {
            Some(self.locks.lock(second).await)
        } else {
            None
        };

        if self.store.find_account(&new.username).await?.is_some() {
            return Err(BotError::Conflict(format!(
                "Username {} already exists",
                new.username
            )));
        }
        if let Some(existing) = self.store.find_account(&new.user_id).await? {
            if existing.user_id == new.user_id {
                return Err(BotError::Conflict(format!(
                    "User {} already has account {}",
                    new.user_id, existing.username
                )));
            }
        }

        let home_dir = self.settings.home_root.join(&new.username);
        let comment = new
            .full_name
            .clone()
            .unwrap_or_else(|| format!("{},{}", new.username, new.user_id));

        let password_hash = self.backend.hash_password(&new.password).await?;
        self.backend
            .create_user(NewUser {
                username: &new.username,
                password_hash: &password_hash,
                comment: &comment,
                shell: &self.settings.shell,
                home_dir: &home_dir,
            })
            .await?;
        self.backend.expire_password(&new.username).await?;

        let account = Account {
            username: new.username,
            user_id: new.user_id,
            email_address: new.email_address,
            created_at: Utc::now(),
            created_by: moderator_id.to_string(),
            locked: false,
            ss_init: false,
            home_path: home_dir.to_string_lossy().into_owned(),
        };
        self.store.save_account(&account).await?;
        info!("Created account {} for {}", account.username, account.user_id);

        self.emit_log(&account, ModerationAction::Create, moderator_id, None, None)
            .await?;
        Ok(account)
    }

    /// Record a warning against an account
    pub async fn warn(&self, target: &str, moderator_id: &str, reason: &str) -> BotResult<ModerationLog> {
        let (_guard, account) = self.acquire(target).await?;
        info!("Warning {} by {}", account.username, moderator_id);
        self.emit_log(
            &account,
            ModerationAction::Warn,
            moderator_id,
            Some(reason.to_string()),
            None,
        )
        .await
    }

    /// Lock an account, indefinitely when `duration` is `None`
    pub async fn lock(
        &self,
        target: &str,
        moderator_id: &str,
        reason: Option<&str>,
        duration: Option<Duration>,
    ) -> BotResult<ModerationLog> {
        let (_guard, mut account) = self.acquire(target).await?;
        if account.locked {
            return Err(BotError::InvalidState(format!(
                "Account {} is already locked",
                account.username
            )));
        }

        self.backend.lock_user(&account.username).await?;
        account.locked = true;
        self.store.save_account(&account).await?;
        info!("Locked {} by {}", account.username, moderator_id);

        let expiration = match duration {
            Some(duration) => Expiration::at(Utc::now() + duration),
            None => Expiration::indefinite(),
        };
        self.emit_log(
            &account,
            ModerationAction::Lock,
            moderator_id,
            reason.map(str::to_string),
            Some(expiration),
        )
        .await
    }

    /// Unlock a locked account. Pending timed locks are marked processed so the
    /// sweep does not release them a second time.
    pub async fn unlock(
        &self,
        target: &str,
        moderator_id: &str,
        reason: Option<&str>,
    ) -> BotResult<ModerationLog> {
        let (_guard, account) = self.acquire(target).await?;
        self.unlock_locked(account, moderator_id, reason.map(str::to_string))
            .await
    }

    async fn unlock_locked(
        &self,
        mut account: Account,
        moderator_id: &str,
        reason: Option<String>,
    ) -> BotResult<ModerationLog> {
        if !account.locked {
            return Err(BotError::InvalidState(format!(
                "Account {} is not locked",
                account.username
            )));
        }

        self.backend.unlock_user(&account.username).await?;
        account.locked = false;
        self.store.save_account(&account).await?;
        self.settle_pending_locks(&account).await?;
        info!("Unlocked {} by {}", account.username, moderator_id);

        self.emit_log(&account, ModerationAction::Unlock, moderator_id, reason, None)
            .await
    }

    async fn settle_pending_locks(&self, account: &Account) -> BotResult<()> {
        for log in self.store.logs_for(&account.username).await? {
            let pending = log.action == ModerationAction::Lock
                && log.expiration.map_or(false, |expiration| !expiration.processed);
            if pending {
                self.store.mark_processed(&log.log_id).await?;
            }
        }
        Ok(())
    }

    /// Remove the host account, archive its home and forget the record.
    ///
    /// The account is locked first (a failure there is only logged). Home
    /// removal and member role revocation run concurrently; the role is best
    /// effort. The record is deleted only once the host account is gone.
    pub async fn delete(
        &self,
        target: &str,
        moderator_id: &str,
        reason: Option<&str>,
    ) -> BotResult<ModerationLog> {
        let (_guard, account) = self.acquire(target).await?;

        if let Err(e) = self.backend.lock_user(&account.username).await {
            warn!("Failed to lock {} before deletion: {}", account.username, e);
        }

        let home_dir = PathBuf::from(&account.home_path);
        let (removed, revoked) = tokio::join!(
            self.backend.delete_user(
                &account.username,
                &home_dir,
                &self.settings.backup_directory
            ),
            self.revoke_member_role(&account.user_id),
        );
        if let Err(e) = revoked {
            warn!("Failed to revoke member role from {}: {}", account.user_id, e);
        }
        removed?;

        self.store.delete_account(&account.username).await?;
        self.settle_pending_locks(&account).await?;
        info!("Deleted account {} by {}", account.username, moderator_id);

        self.emit_log(
            &account,
            ModerationAction::Delete,
            moderator_id,
            reason.map(str::to_string),
            None,
        )
        .await
    }

    async fn revoke_member_role(&self, user_id: &str) -> BotResult<()> {
        if self.settings.member_role_id.is_empty() {
            return Ok(());
        }
        self.notifier
            .revoke_role(user_id, &self.settings.member_role_id, ROLE_REVOKE_REASON)
            .await
    }

    /// Replace the password with a fresh temporary one that must be changed
    /// on next login. Returns the account and the plaintext password.
    pub async fn reset_password(&self, target: &str, moderator_id: &str) -> BotResult<(Account, String)> {
        let (_guard, account) = self.acquire(target).await?;

        let password = util::random_password();
        let password_hash = self.backend.hash_password(&password).await?;
        self.backend
            .set_password(&account.username, &password_hash)
            .await?;
        self.backend.expire_password(&account.username).await?;

        info!("Password for {} reset by {}", account.username, moderator_id);
        Ok((account, password))
    }

    /// Release the timed lock recorded by `log` once its date has passed.
    ///
    /// Returns the emitted unlock log, or `None` when there was nothing left
    /// to unlock (the log is marked processed either way).
    pub async fn release_expired_lock(&self, log: &ModerationLog) -> BotResult<Option<ModerationLog>> {
        let due = log.action == ModerationAction::Lock
            && log.expiration.map_or(false, |expiration| expiration.is_due(Utc::now()));
        if !due {
            return Err(BotError::Validation(format!(
                "Log {} is not an expired lock",
                log.log_id
            )));
        }

        let _guard = self.locks.lock(&log.username).await;
        let account = match self.store.find_account(&log.username).await? {
            Some(account)
                if account.username == log.username
                    && account.user_id == log.user_id
                    && account.locked =>
            {
                account
            }
            _ => {
                self.store.mark_processed(&log.log_id).await?;
                return Ok(None);
            }
        };

        // Only the lock currently in force may be released
        let latest_lock = self
            .store
            .logs_for(&account.username)
            .await?
            .into_iter()
            .find(|l| l.action == ModerationAction::Lock && l.user_id == account.user_id);
        if latest_lock.map_or(true, |latest| latest.log_id != log.log_id) {
            self.store.mark_processed(&log.log_id).await?;
            return Ok(None);
        }

        // Releasing the lock also settles this log
        let system_id = self.settings.system_user_id.clone();
        let unlock = self
            .unlock_locked(account, &system_id, Some(LOCK_EXPIRED_REASON.to_string()))
            .await?;
        Ok(Some(unlock))
    }

    /// Release every timed lock due at `now`; returns how many were handled
    pub async fn sweep_expired_locks(&self, now: DateTime<Utc>) -> BotResult<usize> {
        let due = self.store.expired_locks(now).await?;
        let mut handled = 0;

        for log in &due {
            match self.release_expired_lock(log).await {
                Ok(Some(_)) => {
                    info!("Released expired lock on {}", log.username);
                    handled += 1;
                }
                Ok(None) => handled += 1,
                Err(e) => warn!("Failed to release lock {} on {}: {}", log.log_id, log.username, e),
            }
        }

        Ok(handled)
    }

    /// Persist a moderation log, then announce it.
    ///
    /// The audit post and the direct message to the account holder run
    /// concurrently and their failures are only logged.
    pub async fn emit_log(
        &self,
        account: &Account,
        action: ModerationAction,
        moderator_id: &str,
        reason: Option<String>,
        expiration: Option<Expiration>,
    ) -> BotResult<ModerationLog> {
        let log = ModerationLog {
            log_id: Uuid::new_v4().to_string(),
            username: account.username.clone(),
            user_id: account.user_id.clone(),
            moderator_id: moderator_id.to_string(),
            action,
            reason,
            issued_at: Utc::now(),
            expiration: if action == ModerationAction::Lock {
                expiration.or(Some(Expiration::indefinite()))
            } else {
                None
            },
        };
        self.store.save_log(&log).await?;
        metrics::record_moderation_action(action.as_str());

        let notice = notice::render_notice(
            &log,
            &self.settings.system_user_id,
            &self.settings.display_name,
        );
        let (posted, sent) = tokio::join!(
            self.notifier
                .post_to_channel(&self.settings.audit_channel_id, &notice),
            self.notifier.send_direct(&log.user_id, &notice),
        );
        if let Err(e) = posted {
            warn!("Failed to post audit notice for {}: {}", log.log_id, e);
        }
        if let Err(e) = sent {
            warn!("Failed to notify {} of {}: {}", log.user_id, log.log_id, e);
        }

        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lifecycle_harness, LifecycleHarness};

    fn new_account(username: &str, user_id: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            user_id: user_id.to_string(),
            email_address: format!("{}@example.com", username),
            password: "hunter22".to_string(),
            full_name: None,
        }
    }

    async fn with_account(username: &str, user_id: &str) -> LifecycleHarness {
        let harness = lifecycle_harness().await;
        harness
            .manager
            .create(new_account(username, user_id), "admin")
            .await
            .unwrap();
        harness.backend.clear();
        harness.notifier.clear();
        harness
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let harness = lifecycle_harness().await;
        let account = harness
            .manager
            .create(new_account("alice", "123"), "admin")
            .await
            .unwrap();
        assert_eq!(account.home_path, "/home/alice");

        let found = harness.manager.find("123").await.unwrap();
        assert_eq!(found.username, "alice");
        assert!(!found.locked);
        assert!(!found.ss_init);
        assert_eq!(found.created_by, "admin");

        let logs = harness.store.logs_for("alice").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, ModerationAction::Create);
        assert_eq!(logs[0].username, "alice");
        assert!(logs[0].expiration.is_none());

        assert_eq!(
            harness.backend.calls(),
            vec![
                "hash_password".to_string(),
                "create_user alice /home/alice alice,123".to_string(),
                "expire_password alice".to_string(),
            ]
        );
        assert_eq!(harness.notifier.posts_to("audit").len(), 1);
        assert_eq!(harness.notifier.directs_to("123").len(), 1);
    }

    #[tokio::test]
    async fn test_create_conflicts() {
        let harness = with_account("alice", "123").await;

        let result = harness.manager.create(new_account("alice", "999"), "admin").await;
        assert!(matches!(result, Err(BotError::Conflict(_))));

        let result = harness.manager.create(new_account("bob", "123"), "admin").await;
        assert!(matches!(result, Err(BotError::Conflict(_))));
        assert!(harness.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_before_provisioning() {
        let harness = lifecycle_harness().await;
        let mut bad = new_account("alice", "123");
        bad.email_address = "not-an-email".to_string();

        let result = harness.manager.create(bad, "admin").await;
        assert!(matches!(result, Err(BotError::Validation(_))));
        assert!(harness.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provisioning_failure_persists_nothing() {
        let harness = lifecycle_harness().await;
        harness.backend.fail_on("create_user");

        let result = harness.manager.create(new_account("alice", "123"), "admin").await;
        assert!(matches!(result, Err(BotError::Provisioning { .. })));
        assert!(harness.store.find_account("alice").await.unwrap().is_none());
        assert!(harness.store.logs_for("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timed_lock_expiration() {
        let harness = with_account("alice", "123").await;
        let before = Utc::now();

        let log = harness
            .manager
            .lock("alice", "mod", Some("spam"), Some(Duration::milliseconds(60_000)))
            .await
            .unwrap();

        let expiration = log.expiration.unwrap();
        assert!(!expiration.processed);
        let date = expiration.date.unwrap();
        assert!(date >= before + Duration::seconds(60));
        assert!(date <= Utc::now() + Duration::seconds(60));
        assert!(harness.manager.find("alice").await.unwrap().locked);
        assert_eq!(harness.backend.calls(), vec!["lock_user alice".to_string()]);
    }

    #[tokio::test]
    async fn test_indefinite_lock_and_double_lock() {
        let harness = with_account("alice", "123").await;

        let log = harness.manager.lock("123", "mod", None, None).await.unwrap();
        let expiration = log.expiration.unwrap();
        assert!(expiration.date.is_none());
        assert!(expiration.processed);

        let result = harness.manager.lock("alice", "mod", None, None).await;
        assert!(matches!(result, Err(BotError::InvalidState(_))));
        assert_eq!(harness.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unlock_requires_locked_account() {
        let harness = with_account("alice", "123").await;

        let result = harness.manager.unlock("alice", "mod", None).await;
        assert!(matches!(result, Err(BotError::InvalidState(_))));
        assert!(harness.backend.calls().is_empty());
        assert!(harness.notifier.all_posts().is_empty());
    }

    #[tokio::test]
    async fn test_manual_unlock_settles_timed_lock() {
        let harness = with_account("alice", "123").await;
        harness
            .manager
            .lock("alice", "mod", None, Some(Duration::hours(1)))
            .await
            .unwrap();

        let log = harness.manager.unlock("alice", "mod", Some("appeal")).await.unwrap();
        assert_eq!(log.action, ModerationAction::Unlock);
        assert!(log.expiration.is_none());
        assert!(!harness.manager.find("alice").await.unwrap().locked);

        let later = Utc::now() + Duration::hours(2);
        assert!(harness.store.expired_locks(later).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_warn_unknown_account() {
        let harness = lifecycle_harness().await;
        let result = harness.manager.warn("ghost", "mod", "hello").await;
        assert!(matches!(result, Err(BotError::AccountNotFound(ref t)) if t == "ghost"));
    }

    #[tokio::test]
    async fn test_warn_logs_reason() {
        let harness = with_account("alice", "123").await;
        let log = harness.manager.warn("alice", "mod", "be nice").await.unwrap();
        assert_eq!(log.reason.as_deref(), Some("be nice"));
        assert!(harness.backend.calls().is_empty());
        assert!(harness.notifier.posts_to("audit")[0].contains("Account Warning | Warn"));
    }

    #[tokio::test]
    async fn test_delete_unknown_account_makes_no_calls() {
        let harness = lifecycle_harness().await;
        let result = harness.manager.delete("ghost", "admin", None).await;
        assert!(matches!(result, Err(BotError::AccountNotFound(_))));
        assert!(harness.backend.calls().is_empty());
        assert!(harness.notifier.revoked().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_account() {
        let harness = with_account("alice", "123").await;

        let log = harness.manager.delete("alice", "admin", Some("left")).await.unwrap();
        assert_eq!(log.action, ModerationAction::Delete);
        assert!(harness.store.find_account("alice").await.unwrap().is_none());

        let calls = harness.backend.calls();
        assert_eq!(calls[0], "lock_user alice");
        assert!(calls.contains(&"delete_user alice /home/alice /management/Archives".to_string()));
        assert_eq!(
            harness.notifier.revoked(),
            vec![("123".to_string(), "member".to_string())]
        );

        // The audit trail outlives the account
        let logs = harness.store.logs_for("alice").await.unwrap();
        assert_eq!(logs.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_tolerates_lock_failure_but_not_removal_failure() {
        let harness = with_account("alice", "123").await;
        harness.backend.fail_on("lock_user");
        harness.backend.fail_on("delete_user");

        let result = harness.manager.delete("alice", "admin", None).await;
        assert!(matches!(result, Err(BotError::Provisioning { .. })));
        assert!(harness.store.find_account("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_notification_failures_are_swallowed() {
        let harness = with_account("alice", "123").await;
        harness.notifier.set_failing(true);

        let log = harness.manager.warn("alice", "mod", "spam").await.unwrap();
        let stored = harness.store.logs_for("alice").await.unwrap();
        assert!(stored.iter().any(|l| l.log_id == log.log_id));
    }

    #[tokio::test]
    async fn test_reset_password() {
        let harness = with_account("alice", "123").await;
        let (account, password) = harness.manager.reset_password("123", "mod").await.unwrap();

        assert_eq!(account.username, "alice");
        assert_eq!(password.len(), util::TEMP_PASSWORD_LENGTH);
        assert_eq!(
            harness.backend.calls(),
            vec![
                "hash_password".to_string(),
                format!("set_password alice hash:{}", password),
                "expire_password alice".to_string(),
            ]
        );
        assert_eq!(harness.store.logs_for("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_release_expired_lock() {
        let harness = with_account("alice", "123").await;
        let lock = harness
            .manager
            .lock("alice", "mod", None, Some(Duration::milliseconds(10)))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;

        let released = harness.manager.sweep_expired_locks(Utc::now()).await.unwrap();
        assert_eq!(released, 1);
        assert!(!harness.manager.find("alice").await.unwrap().locked);

        let logs = harness.store.logs_for("alice").await.unwrap();
        let unlock = logs
            .iter()
            .find(|l| l.action == ModerationAction::Unlock)
            .unwrap();
        assert_eq!(unlock.moderator_id, "bot");
        assert_eq!(unlock.reason.as_deref(), Some(LOCK_EXPIRED_REASON));
        assert!(harness
            .notifier
            .posts_to("audit")
            .iter()
            .any(|p| p.contains("SYSTEM")));

        let stored_lock = logs.iter().find(|l| l.log_id == lock.log_id).unwrap();
        assert!(stored_lock.expiration.unwrap().processed);
        assert_eq!(harness.manager.sweep_expired_locks(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_release_after_manual_unlock_only_marks_processed() {
        let harness = with_account("alice", "123").await;
        let lock = harness
            .manager
            .lock("alice", "mod", None, Some(Duration::milliseconds(10)))
            .await
            .unwrap();
        // Flip the record directly so the log is still pending
        let mut account = harness.manager.find("alice").await.unwrap();
        account.locked = false;
        harness.store.save_account(&account).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        harness.backend.clear();

        let stored = harness.store.logs_for("alice").await.unwrap();
        let pending = stored.iter().find(|l| l.log_id == lock.log_id).unwrap();
        let released = harness.manager.release_expired_lock(pending).await.unwrap();
        assert!(released.is_none());
        assert!(harness.backend.calls().is_empty());
        assert!(harness.store.expired_locks(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_rejects_logs_that_are_not_due() {
        let harness = with_account("alice", "123").await;
        let warn = harness.manager.warn("alice", "mod", "hi").await.unwrap();
        let result = harness.manager.release_expired_lock(&warn).await;
        assert!(matches!(result, Err(BotError::Validation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_locks_on_same_account() {
        let harness = with_account("alice", "123").await;
        let manager = harness.manager.clone();

        let (a, b) = tokio::join!(
            manager.lock("alice", "mod", None, None),
            manager.lock("123", "mod", None, None),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(harness.backend.calls(), vec!["lock_user alice".to_string()]);
    }

    #[tokio::test]
    async fn test_recreated_account_keeps_indefinite_lock_after_sweep() {
        let harness = with_account("alice", "123").await;
        let old_lock = harness
            .manager
            .lock("alice", "mod", None, Some(Duration::milliseconds(50)))
            .await
            .unwrap();
        harness.manager.delete("alice", "admin", None).await.unwrap();

        harness
            .manager
            .create(new_account("alice", "456"), "admin")
            .await
            .unwrap();
        harness.manager.lock("alice", "mod", None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        harness.backend.clear();

        // Deleting the first account settled its pending lock
        assert_eq!(harness.manager.sweep_expired_locks(Utc::now()).await.unwrap(), 0);

        // Even a stale copy of that log cannot release the new account
        let released = harness.manager.release_expired_lock(&old_lock).await.unwrap();
        assert!(released.is_none());

        let account = harness.manager.find("alice").await.unwrap();
        assert_eq!(account.user_id, "456");
        assert!(account.locked);
        assert!(harness.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_release_ignores_superseded_lock() {
        let harness = with_account("alice", "123").await;
        let first = harness
            .manager
            .lock("alice", "mod", None, Some(Duration::milliseconds(10)))
            .await
            .unwrap();
        // Force a second lock over the first without settling it
        let mut account = harness.manager.find("alice").await.unwrap();
        account.locked = false;
        harness.store.save_account(&account).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        harness.manager.lock("alice", "mod", None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        harness.backend.clear();

        let released = harness.manager.release_expired_lock(&first).await.unwrap();
        assert!(released.is_none());
        assert!(harness.manager.find("alice").await.unwrap().locked);
        assert!(harness.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_user_id() {
        let harness = lifecycle_harness().await;
        let manager = harness.manager.clone();

        let (a, b) = tokio::join!(
            manager.create(new_account("alice", "123"), "admin"),
            manager.create(new_account("bob", "123"), "admin"),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(BotError::Conflict(_))));

        let creates: Vec<String> = harness
            .backend
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("create_user"))
            .collect();
        assert_eq!(creates.len(), 1);
        assert_eq!(manager.locks.active_keys(), 0);
    }
}

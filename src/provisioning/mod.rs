/// OS-level account provisioning
///
/// The lifecycle manager drives user accounts on the host through the
/// [`ProvisioningBackend`] trait. [`ShellBackend`] runs the standard shadow
/// utilities; every call is a request/response process invocation.

pub mod shell;

pub use shell::ShellBackend;

use crate::error::BotResult;
use async_trait::async_trait;
use std::path::Path;

/// Parameters for a new OS user
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    /// GECOS comment field
    pub comment: &'a str,
    pub shell: &'a str,
    pub home_dir: &'a Path,
}

#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Derive a crypt(3) password hash
    async fn hash_password(&self, plaintext: &str) -> BotResult<String>;

    async fn create_user(&self, user: NewUser<'_>) -> BotResult<()>;

    /// Force a password change on next login
    async fn expire_password(&self, username: &str) -> BotResult<()>;

    async fn lock_user(&self, username: &str) -> BotResult<()>;

    async fn unlock_user(&self, username: &str) -> BotResult<()>;

    /// Remove the user and its home directory, archiving it under `backup_target`
    async fn delete_user(&self, username: &str, home_dir: &Path, backup_target: &Path) -> BotResult<()>;

    /// Replace the user's password hash
    async fn set_password(&self, username: &str, password_hash: &str) -> BotResult<()>;
}

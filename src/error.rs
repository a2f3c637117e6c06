/// Unified error types for the cloudservices bot
use thiserror::Error;

/// Main error type for the bot
#[derive(Error, Debug)]
pub enum BotError {
    /// A command name or alias is already taken in a registry
    #[error("Duplicate command name or alias: {0}")]
    DuplicateName(String),

    /// No qualifying reply arrived before the collector timed out
    #[error("Did not supply a valid input in time")]
    CollectionTimeout,

    /// No account matches the given username or user id
    #[error("Account {0} not found")]
    AccountNotFound(String),

    /// An OS-level provisioning command exited unsuccessfully
    #[error("Command failed: {command}\n{output}")]
    Provisioning { command: String, output: String },

    /// Database errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Conflict errors (e.g., duplicate account)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The account is not in the state the action requires
    #[error("Invalid account state: {0}")]
    InvalidState(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Chat platform delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the error is an expected outcome a command should report back
    /// to the invoking user rather than treat as a crash.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            BotError::AccountNotFound(_)
                | BotError::CollectionTimeout
                | BotError::Conflict(_)
                | BotError::InvalidState(_)
                | BotError::Validation(_)
        )
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Notification(err.to_string())
    }
}

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Configuration management for the cloudservices bot
use crate::error::{BotError, BotResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub bot: BotSection,
    pub discord: Option<DiscordConfig>,
    pub channels: ChannelConfig,
    pub roles: RoleConfig,
    pub storage: StorageConfig,
    pub provisioning: ProvisioningConfig,
    pub email: Option<EmailConfig>,
    pub jobs: JobConfig,
    pub logging: LoggingConfig,
}

/// Bot identity and command syntax
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSection {
    /// Prefix every command line starts with
    pub prefix: String,
    /// The bot's own user id; moderation logs issued under it render as SYSTEM
    pub user_id: String,
    /// Display name used in notices
    pub username: String,
    /// Author id attached to lines typed into the local console
    pub console_operator_id: String,
}

/// Chat platform REST credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    pub api_base: String,
    pub guild_id: String,
}

/// Channels the bot reports into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Moderation audit channel
    pub audit_channel_id: String,
    /// Unexpected command failures
    pub error_channel_id: String,
    /// Role granted to members with a cloud account, revoked on deletion
    pub member_role_id: String,
}

/// Role ids allowed to run privileged commands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    pub staff: Vec<String>,
    pub moderators: Vec<String>,
    pub administrators: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// OS account provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub shell: String,
    pub home_root: PathBuf,
    pub backup_directory: PathBuf,
    /// Log provisioning commands instead of running them
    pub dry_run: bool,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/zsh".to_string(),
            home_root: PathBuf::from("/home"),
            backup_directory: PathBuf::from("/management/Archives"),
            dry_run: false,
        }
    }
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Seconds between expired-lock sweeps
    pub lock_sweep_interval: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn id_list(var: &str) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> BotResult<Self> {
        dotenv::dotenv().ok();

        let prefix = env::var("BOT_PREFIX").unwrap_or_else(|_| "=".to_string());
        let user_id = env::var("BOT_USER_ID").unwrap_or_else(|_| "0".to_string());
        let username = env::var("BOT_USERNAME").unwrap_or_else(|_| "Cloud Services".to_string());
        let console_operator_id =
            env::var("BOT_CONSOLE_OPERATOR_ID").unwrap_or_else(|_| "console".to_string());

        let discord = match env::var("DISCORD_TOKEN") {
            Ok(token) => Some(DiscordConfig {
                token,
                api_base: env::var("DISCORD_API_BASE")
                    .unwrap_or_else(|_| "https://discord.com/api/v10".to_string()),
                guild_id: env::var("DISCORD_GUILD_ID")
                    .map_err(|_| BotError::Validation("DISCORD_GUILD_ID required".to_string()))?,
            }),
            Err(_) => None,
        };

        let audit_channel_id =
            env::var("BOT_AUDIT_CHANNEL_ID").unwrap_or_else(|_| "audit".to_string());
        let error_channel_id =
            env::var("BOT_ERROR_CHANNEL_ID").unwrap_or_else(|_| "errors".to_string());
        let member_role_id = env::var("BOT_MEMBER_ROLE_ID").unwrap_or_default();

        let data_directory: PathBuf = env::var("BOT_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("BOT_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("cloudservices.sqlite"));

        let defaults = ProvisioningConfig::default();
        let provisioning = ProvisioningConfig {
            shell: env::var("PROVISION_SHELL").unwrap_or(defaults.shell),
            home_root: env::var("PROVISION_HOME_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.home_root),
            backup_directory: env::var("PROVISION_BACKUP_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_directory),
            dry_run: env::var("PROVISION_DRY_RUN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        };

        let email = if let Ok(smtp_url) = env::var("BOT_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("BOT_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| "support@localhost".to_string()),
            })
        } else {
            None
        };

        let lock_sweep_interval = env::var("BOT_LOCK_SWEEP_INTERVAL")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(BotConfig {
            bot: BotSection {
                prefix,
                user_id,
                username,
                console_operator_id,
            },
            discord,
            channels: ChannelConfig {
                audit_channel_id,
                error_channel_id,
                member_role_id,
            },
            roles: RoleConfig {
                staff: id_list("BOT_STAFF_ROLE_IDS"),
                moderators: id_list("BOT_MODERATOR_ROLE_IDS"),
                administrators: id_list("BOT_ADMIN_ROLE_IDS"),
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            provisioning,
            email,
            jobs: JobConfig {
                lock_sweep_interval,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> BotResult<()> {
        if self.bot.prefix.trim().is_empty() {
            return Err(BotError::Validation("Prefix cannot be empty".to_string()));
        }

        if self.bot.prefix.chars().any(char::is_whitespace) {
            return Err(BotError::Validation(
                "Prefix cannot contain whitespace".to_string(),
            ));
        }

        if !self.provisioning.home_root.is_absolute() {
            return Err(BotError::Validation(
                "Provisioning home root must be an absolute path".to_string(),
            ));
        }

        if self.jobs.lock_sweep_interval == 0 {
            return Err(BotError::Validation(
                "Lock sweep interval must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration suitable for tests and local runs
    pub fn for_data_dir(data_directory: PathBuf) -> Self {
        Self {
            bot: BotSection {
                prefix: "=".to_string(),
                user_id: "bot".to_string(),
                username: "Cloud Services".to_string(),
                console_operator_id: "console".to_string(),
            },
            discord: None,
            channels: ChannelConfig {
                audit_channel_id: "audit".to_string(),
                error_channel_id: "errors".to_string(),
                member_role_id: "member".to_string(),
            },
            roles: RoleConfig::default(),
            storage: StorageConfig {
                database: data_directory.join("cloudservices.sqlite"),
                data_directory,
            },
            provisioning: ProvisioningConfig::default(),
            email: None,
            jobs: JobConfig {
                lock_sweep_interval: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = BotConfig::for_data_dir(PathBuf::from("./data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_prefix() {
        let mut config = BotConfig::for_data_dir(PathBuf::from("./data"));
        config.bot.prefix = "  ".to_string();
        assert!(matches!(config.validate(), Err(BotError::Validation(_))));

        config.bot.prefix = "! ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_relative_home_root() {
        let mut config = BotConfig::for_data_dir(PathBuf::from("./data"));
        config.provisioning.home_root = PathBuf::from("home");
        assert!(config.validate().is_err());
    }
}

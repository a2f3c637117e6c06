/// Application context and dependency injection
use crate::{
    collector::InputCollector,
    command::Registry,
    config::BotConfig,
    db,
    error::{BotError, BotResult},
    gateway::{ConsoleNotifier, DiscordNotifier, EventStream, Notifier},
    lifecycle::{LifecycleManager, LifecycleSettings},
    mailer::Mailer,
    provisioning::{ProvisioningBackend, ShellBackend},
    store::{AccountStore, SqliteAccountStore},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<BotConfig>,
    pub db: SqlitePool,
    pub store: Arc<dyn AccountStore>,
    pub notifier: Arc<dyn Notifier>,
    pub lifecycle: Arc<LifecycleManager>,
    // Inbound messages and prompts over them
    pub stream: EventStream,
    pub collector: InputCollector,
    pub registry: Arc<Registry>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: BotConfig, registry: Registry, stream: EventStream) -> BotResult<Self> {
        // Validate configuration
        config.validate()?;

        Self::ensure_directories(&config).await?;

        // Initialize database
        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::init_schema(&pool).await?;
        db::test_connection(&pool).await?;

        let backend: Arc<dyn ProvisioningBackend> = Arc::new(ShellBackend::new(&config.provisioning));

        // Chat REST access is optional; without it everything goes to stdout
        let notifier: Arc<dyn Notifier> = match &config.discord {
            Some(discord) => {
                tracing::info!("Using chat REST notifier for guild {}", discord.guild_id);
                Arc::new(DiscordNotifier::new(discord)?)
            }
            None => {
                tracing::info!("No chat token configured - using console notifier");
                Arc::new(ConsoleNotifier)
            }
        };

        let mailer = Mailer::new(config.email.clone())?;

        Ok(Self::assemble(
            config, pool, backend, notifier, registry, stream, mailer,
        ))
    }

    /// Wire the services together over already-built collaborators
    pub fn assemble(
        config: BotConfig,
        db: SqlitePool,
        backend: Arc<dyn ProvisioningBackend>,
        notifier: Arc<dyn Notifier>,
        registry: Registry,
        stream: EventStream,
        mailer: Mailer,
    ) -> Self {
        let store: Arc<dyn AccountStore> = Arc::new(SqliteAccountStore::new(db.clone()));
        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&store),
            backend,
            Arc::clone(&notifier),
            LifecycleSettings::from_config(&config),
        ));
        let collector = InputCollector::new(stream.clone(), Arc::clone(&notifier));

        Self {
            config: Arc::new(config),
            db,
            store,
            notifier,
            lifecycle,
            stream,
            collector,
            registry: Arc::new(registry),
            mailer: Arc::new(mailer),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &BotConfig) -> BotResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                BotError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }

    /// Whether `user_id` is the bot itself
    pub fn is_self(&self, user_id: &str) -> bool {
        self.config.bot.user_id == user_id
    }
}

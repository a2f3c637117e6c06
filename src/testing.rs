/// Recording fakes and harness builders for unit tests
use crate::{
    command::{CommandContext, CommandHandler, Registry},
    config::BotConfig,
    context::AppContext,
    db,
    error::{BotError, BotResult},
    gateway::{EventStream, Notifier, SentMessage},
    lifecycle::{LifecycleManager, LifecycleSettings},
    mailer::Mailer,
    provisioning::{NewUser, ProvisioningBackend},
    store::SqliteAccountStore,
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Handler that does nothing
pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn run(&self, _ctx: &CommandContext<'_>) -> BotResult<()> {
        Ok(())
    }
}

/// Notifier that records everything it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    posts: Mutex<Vec<(String, String)>>,
    directs: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<SentMessage>>,
    revoked: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Make every call fail from now on
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> BotResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BotError::Notification("gateway unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn all_posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn posts_to(&self, channel_id: &str) -> Vec<String> {
        self.all_posts()
            .into_iter()
            .filter(|(channel, _)| channel == channel_id)
            .map(|(_, content)| content)
            .collect()
    }

    pub fn directs_to(&self, user_id: &str) -> Vec<String> {
        self.directs
            .lock()
            .unwrap()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<SentMessage> {
        self.deleted.lock().unwrap().clone()
    }

    /// `(user_id, role_id)` pairs
    pub fn revoked(&self) -> Vec<(String, String)> {
        self.revoked.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.posts.lock().unwrap().clear();
        self.directs.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
        self.revoked.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_to_channel(&self, channel_id: &str, content: &str) -> BotResult<SentMessage> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        posts.push((channel_id.to_string(), content.to_string()));
        Ok(SentMessage {
            channel_id: channel_id.to_string(),
            message_id: format!("m{}", posts.len()),
        })
    }

    async fn send_direct(&self, user_id: &str, content: &str) -> BotResult<()> {
        self.check()?;
        self.directs
            .lock()
            .unwrap()
            .push((user_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: &SentMessage) -> BotResult<()> {
        self.check()?;
        self.deleted.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn revoke_role(&self, user_id: &str, role_id: &str, _reason: &str) -> BotResult<()> {
        self.check()?;
        self.revoked
            .lock()
            .unwrap()
            .push((user_id.to_string(), role_id.to_string()));
        Ok(())
    }
}

/// Provisioning backend that records calls instead of touching the host
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingBackend {
    /// Make the named operation fail from now on
    pub fn fail_on(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
        self.failing.lock().unwrap().clear();
    }

    fn record(&self, operation: &str, call: String) -> BotResult<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.lock().unwrap().contains(operation) {
            Err(BotError::Provisioning {
                command: call,
                output: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProvisioningBackend for RecordingBackend {
    async fn hash_password(&self, plaintext: &str) -> BotResult<String> {
        self.record("hash_password", "hash_password".to_string())?;
        Ok(format!("hash:{}", plaintext))
    }

    async fn create_user(&self, user: NewUser<'_>) -> BotResult<()> {
        self.record(
            "create_user",
            format!(
                "create_user {} {} {}",
                user.username,
                user.home_dir.display(),
                user.comment
            ),
        )
    }

    async fn expire_password(&self, username: &str) -> BotResult<()> {
        self.record("expire_password", format!("expire_password {}", username))
    }

    async fn lock_user(&self, username: &str) -> BotResult<()> {
        self.record("lock_user", format!("lock_user {}", username))
    }

    async fn unlock_user(&self, username: &str) -> BotResult<()> {
        self.record("unlock_user", format!("unlock_user {}", username))
    }

    async fn delete_user(&self, username: &str, home_dir: &Path, backup_target: &Path) -> BotResult<()> {
        self.record(
            "delete_user",
            format!(
                "delete_user {} {} {}",
                username,
                home_dir.display(),
                backup_target.display()
            ),
        )
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> BotResult<()> {
        self.record(
            "set_password",
            format!("set_password {} {}", username, password_hash),
        )
    }
}

/// Fresh SQLite database with the schema applied
pub async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::create_pool(&dir.path().join("test.sqlite"), db::DatabaseOptions::default())
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();
    (dir, pool)
}

pub struct LifecycleHarness {
    pub manager: Arc<LifecycleManager>,
    pub store: Arc<SqliteAccountStore>,
    pub backend: Arc<RecordingBackend>,
    pub notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

pub async fn lifecycle_harness() -> LifecycleHarness {
    let (dir, pool) = test_pool().await;
    let config = BotConfig::for_data_dir(dir.path().to_path_buf());
    let store = Arc::new(SqliteAccountStore::new(pool));
    let backend = Arc::new(RecordingBackend::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = Arc::new(LifecycleManager::new(
        store.clone(),
        backend.clone(),
        notifier.clone(),
        LifecycleSettings::from_config(&config),
    ));

    LifecycleHarness {
        manager,
        store,
        backend,
        notifier,
        _dir: dir,
    }
}

pub struct TestHarness {
    pub app: Arc<AppContext>,
    pub backend: Arc<RecordingBackend>,
    pub notifier: Arc<RecordingNotifier>,
    _dir: TempDir,
}

/// Application context over recording fakes and a temporary database
pub async fn test_context(registry: Registry) -> TestHarness {
    test_context_with(registry, |_| {}).await
}

pub async fn test_context_with(registry: Registry, configure: impl FnOnce(&mut BotConfig)) -> TestHarness {
    let (dir, pool) = test_pool().await;
    let mut config = BotConfig::for_data_dir(dir.path().to_path_buf());
    configure(&mut config);

    let backend = Arc::new(RecordingBackend::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let mailer = Mailer::new(None).unwrap();
    let app = AppContext::assemble(
        config,
        pool,
        backend.clone(),
        notifier.clone(),
        registry,
        EventStream::new(),
        mailer,
    );

    TestHarness {
        app: Arc::new(app),
        backend,
        notifier,
        _dir: dir,
    }
}

/// Context whose registry holds the built-in commands
pub async fn builtin_context() -> TestHarness {
    let config = BotConfig::for_data_dir(std::path::PathBuf::from("./data"));
    let (registry, _) = crate::command::load_commands(&config, crate::commands::BUILTIN);
    test_context(registry).await
}

/// A command line typed by the console operator
pub fn operator_message(content: &str) -> crate::gateway::InboundMessage {
    crate::gateway::InboundMessage::new("console", "console", content)
}

/// Dispatch `content` as the console operator and return what was posted
/// back to the console channel
pub async fn run_as_operator(harness: &TestHarness, content: &str) -> Vec<String> {
    let dispatcher = crate::command::Dispatcher::new(harness.app.clone());
    let before = harness.notifier.posts_to("console").len();
    dispatcher.handle(operator_message(content)).await;
    harness.notifier.posts_to("console").split_off(before)
}

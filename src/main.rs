/// Cloud Services bot
///
/// Loads the built-in commands, wires the services together and dispatches
/// inbound messages until the console closes or the process is interrupted.

use cloudservices::{
    command::{load_commands, Dispatcher},
    commands::BUILTIN,
    config::BotConfig,
    context::AppContext,
    error::BotResult,
    gateway::{console, EventStream},
    jobs,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> BotResult<()> {
    // Load configuration
    let config = BotConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cloudservices={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner();

    let (registry, report) = load_commands(&config, BUILTIN);
    if !report.failed.is_empty() {
        warn!("{} commands failed to load", report.failed.len());
    }

    // Create application context
    let stream = EventStream::new();
    let ctx = Arc::new(AppContext::new(config, registry, stream.clone()).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&ctx)));
    tokio::spawn(dispatcher.run(stream.subscribe()));

    // The chat gateway publishes into `stream`; the console is always available
    let operator_id = ctx.config.bot.console_operator_id.clone();
    info!("Ready - type commands prefixed with {}", ctx.config.bot.prefix);

    tokio::select! {
        result = console::pump_stdin(stream, operator_id, Vec::new()) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ________                __   _____                 _
  / ____/ /___  __  ______/ /  / ___/___  ______   __(_)_______  _____
 / /   / / __ \/ / / / __  /   \__ \/ _ \/ ___/ | / / / ___/ _ \/ ___/
/ /___/ / /_/ / /_/ / /_/ /   ___/ /  __/ /   | |/ / / /__/  __(__  )
\____/_/\____/\__,_/\__,_/   /____/\___/_/    |___/_/\___/\___/____/

        Cloud account bot v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Static command registration
use crate::{
    command::{Command, Registry},
    config::BotConfig,
    error::BotResult,
};
use tracing::{error, info};

/// Builds one top-level command (with its subcommands)
pub type CommandConstructor = fn(&BotConfig) -> BotResult<Command>;

/// What happened while loading the constructor table
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Table index and error of every entry that failed
    pub failed: Vec<(usize, String)>,
}

/// Build a registry from `constructors`, in table order.
///
/// A constructor that fails, or a command whose name clashes with one already
/// loaded, is logged and skipped; the remaining entries still load.
pub fn load_commands(config: &BotConfig, constructors: &[CommandConstructor]) -> (Registry, LoadReport) {
    let mut registry = Registry::new();
    let mut report = LoadReport::default();

    for (index, constructor) in constructors.iter().enumerate() {
        let loaded = constructor(config).and_then(|command| registry.register(command));
        match loaded {
            Ok(command) => {
                info!("Loaded command {}", command.name);
                report.loaded.push(command.name.clone());
            }
            Err(e) => {
                error!("Error occurred loading command #{}: {}", index, e);
                report.failed.push((index, e.to_string()));
            }
        }
    }

    info!(
        "Loaded {} commands ({} failed)",
        report.loaded.len(),
        report.failed.len()
    );
    (registry, report)
}

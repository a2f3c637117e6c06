/// Cloud Services - chat command bot and cloud account lifecycle manager
///
/// Resolves prefixed chat commands through a nested command registry and
/// drives host account provisioning (create, warn, lock, unlock, delete,
/// password reset) with a persisted moderation audit trail.

pub mod collector;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod lifecycle;
pub mod mailer;
pub mod metrics;
pub mod provisioning;
pub mod store;
pub mod util;
pub mod validation;

#[cfg(test)]
mod testing;

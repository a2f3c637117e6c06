/// Background task implementations
use crate::{context::AppContext, error::BotResult};
use chrono::Utc;

/// Release every timed lock that has run out
pub async fn release_expired_locks(ctx: &AppContext) -> BotResult<usize> {
    ctx.lifecycle.sweep_expired_locks(Utc::now()).await
}

/// Health check - verify all systems are operational
pub async fn health_check(ctx: &AppContext) -> BotResult<()> {
    // Check database connectivity
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    // All checks passed
    Ok(())
}

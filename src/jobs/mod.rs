use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::lock_sweep_job(Arc::clone(&self)));

        // Spawn monitoring tasks
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Release timed locks whose expiration has passed
    async fn lock_sweep_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.jobs.lock_sweep_interval;
        let mut interval = interval(Duration::from_secs(period));

        loop {
            interval.tick().await;

            match tasks::release_expired_locks(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Released {} expired locks", count);
                    }
                    crate::metrics::record_background_job("lock_sweep", "success");
                }
                Err(e) => {
                    error!("Failed to sweep expired locks: {}", e);
                    crate::metrics::record_background_job("lock_sweep", "failure");
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                    crate::metrics::record_background_job("health_check", "success");
                }
                Err(e) => {
                    error!("Health check failed: {}", e);
                    crate::metrics::record_background_job("health_check", "failure");
                }
            }
        }
    }
}

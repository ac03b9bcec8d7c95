//! Background maintenance: expired-session sweeps and retention pruning.
//!
//! The session validator already purges lazily; the sweep here only bounds
//! table growth for tokens that are never presented again.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::domain::events::DomainEvent;
use crate::state::SharedState;

pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting maintenance scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            let config = config.clone();
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = run_maintenance(&state, &config).await {
                    error!("Scheduled maintenance failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.maintenance_interval_minutes;

        info!("Scheduler running every {} minutes", interval_mins);

        let mut tick = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            tick.tick().await;

            if !*self.running.read().await {
                break;
            }

            if let Err(e) = run_maintenance(&self.state, &self.config).await {
                error!("Scheduled maintenance failed: {}", e);
            }
        }

        Ok(())
    }

    /// One maintenance pass, also usable from tests or a one-shot command.
    pub async fn run_once(&self) -> Result<()> {
        run_maintenance(&self.state, &self.config).await
    }
}

async fn run_maintenance(state: &SharedState, config: &SchedulerConfig) -> Result<()> {
    let purged_sessions = state.store.purge_expired_sessions().await?;
    let pruned_usage_events = state
        .store
        .prune_usage_events(config.usage_retention_days)
        .await?;
    let pruned_logs = state.store.prune_logs(config.log_retention_days).await?;

    if purged_sessions > 0 || pruned_usage_events > 0 || pruned_logs > 0 {
        info!(
            purged_sessions,
            pruned_usage_events, pruned_logs, "Maintenance pass finished"
        );
    }

    let _ = state.event_bus.send(DomainEvent::MaintenanceFinished {
        purged_sessions,
        pruned_usage_events,
        pruned_logs,
    });

    Ok(())
}

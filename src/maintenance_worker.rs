// Background worker: prune samples past retention every prune_interval_secs.
// VACUUM runs on a configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::history_repo::HistoryRepo;
use tracing::{debug, info, instrument, warn};

/// Config for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintenanceWorkerConfig {
    pub prune_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *" = 03:00 daily). Uses local time.
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    pub vacuum_interval_secs: u64,
}

/// Spawns the maintenance worker. Returns a join handle.
pub fn spawn(
    repo: Arc<HistoryRepo>,
    config: MaintenanceWorkerConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config).await;
    })
}

#[instrument(skip(repo), fields(prune_interval_secs = config.prune_interval_secs))]
async fn run(repo: Arc<HistoryRepo>, config: MaintenanceWorkerConfig) {
    let mut prune_interval =
        tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    loop {
        tokio::select! {
            _ = prune_interval.tick() => {
                match repo.prune_old_data().await {
                    Ok(removed) => debug!(operation = "prune_old_data", removed, "old samples pruned"),
                    Err(e) => warn!(error = %e, operation = "prune_old_data", "prune failed"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
        }
    }
}

/// Delay until the next fire time of `schedule` after `now`, or None when the schedule is exhausted.
pub fn next_vacuum_delay(
    schedule: &cron::Schedule,
    now: chrono::DateTime<chrono::Local>,
) -> Option<Duration> {
    schedule
        .after(&now)
        .next()
        .map(|next| (next - now).to_std().unwrap_or(Duration::from_secs(1)))
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval). Uses local time for cron.
async fn vacuum_scheduler(config: MaintenanceWorkerConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
            return;
        };
        loop {
            match next_vacuum_delay(&schedule, chrono::Local::now()) {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    if tx.send(()).await.is_err() {
                        break;
                    }
                }
                None => tokio::time::sleep(Duration::from_secs(3600)).await,
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}

// Background scoring worker: on every scan tick, refresh host metrics, build a snapshot
// from the state store, evaluate it and publish the sample.
// Persistence runs in a dedicated history writer task (channel).

use crate::config::SourcesConfig;
use crate::engine;
use crate::history_repo::HistoryRepo;
use crate::models::ScoreSample;
use crate::snapshot_builder;
use crate::state_store::SharedStateStore;
use crate::sysinfo_repo::SysinfoRepo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Most recent sample; `None` until the first evaluation.
pub type LatestSample = Arc<RwLock<Option<ScoreSample>>>;

/// Rate limit for "no receivers" message (avoid logging every tick when no one is on /ws/score)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(600);

/// Channel capacity for sample writer (backpressure if writer falls behind).
pub fn writer_channel_capacity(flush_rate: u64) -> usize {
    (flush_rate as usize * 2).max(32)
}

/// Stores, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub state_store: SharedStateStore,
    /// `None` when host metrics are disabled.
    pub sysinfo_repo: Option<Arc<SysinfoRepo>>,
    pub sources: SourcesConfig,
    pub latest: LatestSample,
    pub tx: broadcast::Sender<ScoreSample>,
    pub write_tx: mpsc::Sender<ScoreSample>,
    pub ws_score_connections: Arc<AtomicUsize>,
    pub samples_saved_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and logging config.
pub struct WorkerConfig {
    pub scan_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Writer config: batching for the dedicated history writer task.
pub struct HistoryWriterConfig {
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}

/// Pushes the latest host readings into the store. Failures are logged and the
/// previous readings stay in place.
pub async fn publish_host_metrics(store: &SharedStateStore, sysinfo_repo: &SysinfoRepo) {
    let metrics = match sysinfo_repo.sample().await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(
                error = %e,
                operation = "sample_host_metrics",
                "host metrics failed"
            );
            return;
        }
    };
    let mut store = store.write().await;
    for record in metrics.records() {
        if let Err(e) = store.upsert(record) {
            tracing::warn!(error = %e, operation = "publish_host_metrics", "invalid host entity");
        }
    }
}

/// One full evaluation: optional host refresh, snapshot, score.
pub async fn evaluate_once(
    store: &SharedStateStore,
    sysinfo_repo: Option<&SysinfoRepo>,
    sources: &SourcesConfig,
) -> ScoreSample {
    if let Some(repo) = sysinfo_repo {
        publish_host_metrics(store, repo).await;
    }
    let snapshot = {
        let store = store.read().await;
        snapshot_builder::build_snapshot(&store, sources)
    };
    let report = engine::evaluate(&snapshot);
    tracing::debug!(
        operation = "evaluate",
        entities = snapshot.monitored_entities.len(),
        global_score = report.global_score,
        hardware_score = report.hardware_score,
        application_score = report.application_score,
        zombie_count = report.zombie_count,
        "health score evaluated"
    );
    ScoreSample {
        timestamp: now_ms(),
        report,
    }
}

/// Spawns the background task that receives samples from the worker and flushes to the DB.
/// Flushes when buffer len >= flush_rate, or every flush_interval_secs, or when channel closes.
/// When the worker drops its sender, this task flushes remaining and exits.
pub fn spawn_history_writer(
    mut write_rx: mpsc::Receiver<ScoreSample>,
    history_repo: Arc<HistoryRepo>,
    config: HistoryWriterConfig,
    samples_saved_total: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_secs(config.flush_interval_secs);
    tokio::spawn(async move {
        let mut buffer: Vec<ScoreSample> = Vec::new();
        let mut flush_tick = interval(flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = write_rx.recv() => {
                    match result {
                        Some(sample) => {
                            buffer.push(sample);
                            if buffer.len() >= config.flush_rate as usize
                                && let Err(e) = flush_buffer(&history_repo, &mut buffer, &samples_saved_total).await
                            {
                                tracing::warn!(error = %e, "history writer: save_samples failed");
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    if let Err(e) = flush_buffer(&history_repo, &mut buffer, &samples_saved_total).await {
                        tracing::warn!(error = %e, "history writer: save_samples failed");
                    }
                }
            }
        }
        if let Err(e) = flush_buffer(&history_repo, &mut buffer, &samples_saved_total).await {
            tracing::warn!(error = %e, "history writer: final flush failed");
        }
        tracing::debug!("History writer shutting down");
    })
}

async fn flush_buffer(
    history_repo: &HistoryRepo,
    buffer: &mut Vec<ScoreSample>,
    samples_saved_total: &AtomicU64,
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let n = buffer.len();
    history_repo.save_samples(buffer).await?;
    samples_saved_total.fetch_add(n as u64, Ordering::Relaxed);
    buffer.clear();
    tracing::debug!(
        operation = "save_samples",
        samples_count = n,
        "Samples saved"
    );
    Ok(())
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        state_store,
        sysinfo_repo,
        sources,
        latest,
        tx,
        write_tx,
        ws_score_connections,
        samples_saved_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        scan_interval_ms,
        stats_log_interval_secs,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", scan_interval_ms);

    let task = async move {
        let mut tick = interval(Duration::from_millis(scan_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut evaluations_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let sample =
                        evaluate_once(&state_store, sysinfo_repo.as_deref(), &sources).await;
                    evaluations_total += 1;
                    *latest.write().await = Some(sample.clone());

                    if tx.send(sample.clone()).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_sample",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                    if write_tx.send(sample).await.is_err() {
                        tracing::debug!("History writer channel closed");
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let global_score = latest.read().await.as_ref().map(|s| s.report.global_score);
                    tracing::info!(
                        ws_score_clients = ws_score_connections.load(Ordering::Relaxed),
                        evaluations_total,
                        samples_saved_total = samples_saved_total.load(Ordering::Relaxed),
                        global_score = ?global_score,
                        "app stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(worker_span))
}

use anyhow::Result;
use healthscore::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::{RwLock, broadcast};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        name = %version::NAME,
        version = %version::VERSION,
        scan_interval_secs = app_config.monitoring.scan_interval_secs,
        "starting"
    );

    let state_store = match &app_config.sources.states_file {
        Some(path) => {
            let payload = state_store::load_states_file(path)?;
            let store = state_store::StateStore::from_payload(payload)
                .map_err(|e| anyhow::anyhow!("states file {}: {}", path, e))?;
            tracing::info!(states = store.len(), path = %path, "state store seeded");
            store
        }
        None => state_store::StateStore::new(),
    }
    .shared();

    let sysinfo_repo = app_config
        .monitoring
        .host_metrics
        .then(|| Arc::new(sysinfo_repo::SysinfoRepo::new()));

    let history_repo = Arc::new(
        history_repo::HistoryRepo::connect(
            &app_config.database.path,
            app_config.database.retention_days,
        )
        .await?,
    );
    history_repo.init().await?;
    let latest: worker::LatestSample = Arc::new(RwLock::new(history_repo.latest_sample().await?));

    let (tx, _) = broadcast::channel::<models::ScoreSample>(app_config.publishing.broadcast_capacity);
    let (write_tx, write_rx) = tokio::sync::mpsc::channel(worker::writer_channel_capacity(
        app_config.database.flush_rate,
    ));
    let ws_score_connections = Arc::new(AtomicUsize::new(0));
    let samples_saved_total = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let writer_handle = worker::spawn_history_writer(
        write_rx,
        history_repo.clone(),
        worker::HistoryWriterConfig {
            flush_rate: app_config.database.flush_rate,
            flush_interval_secs: app_config.database.flush_interval_secs,
        },
        samples_saved_total.clone(),
    );

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            state_store: state_store.clone(),
            sysinfo_repo,
            sources: app_config.sources.clone(),
            latest: latest.clone(),
            tx: tx.clone(),
            write_tx,
            ws_score_connections: ws_score_connections.clone(),
            samples_saved_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            scan_interval_ms: app_config.monitoring.scan_interval_secs.saturating_mul(1000),
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let _maintenance_handle = maintenance_worker::spawn(
        history_repo.clone(),
        maintenance_worker::MaintenanceWorkerConfig {
            prune_interval_secs: app_config.database.prune_interval_secs,
            vacuum_schedule: app_config.database.vacuum_schedule.clone(),
            vacuum_interval_secs: app_config.database.vacuum_interval_secs,
        },
    );

    let app = routes::app(
        tx,
        state_store,
        latest,
        history_repo,
        ws_score_connections,
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;
    // Worker dropped its sender; the writer flushes what is left and exits.
    let _ = writer_handle.await;

    Ok(())
}

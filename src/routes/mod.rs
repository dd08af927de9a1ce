// HTTP + WebSocket routes

mod error;
mod http;
mod ws;

pub use error::ApiError;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::history_repo::HistoryRepo;
use crate::models::ScoreSample;
use crate::state_store::SharedStateStore;
use crate::worker::LatestSample;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) stats_tx: broadcast::Sender<ScoreSample>,
    pub(crate) state_store: SharedStateStore,
    pub(crate) latest: LatestSample,
    pub(crate) history_repo: Arc<HistoryRepo>,
    pub(crate) ws_score_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    stats_tx: broadcast::Sender<ScoreSample>,
    state_store: SharedStateStore,
    latest: LatestSample,
    history_repo: Arc<HistoryRepo>,
    ws_score_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        stats_tx,
        state_store,
        latest,
        history_repo,
        ws_score_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "healthscore: global health score service" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/score", get(http::score_handler)) // GET /api/score
        .route("/api/sensor", get(http::sensor_handler)) // GET /api/sensor
        .route("/api/history", get(http::history_handler)) // GET /api/history
        .route("/api/states", post(http::states_handler)) // POST /api/states
        .route("/api/evaluate", post(http::evaluate_handler)) // POST /api/evaluate
        .route("/ws/score", get(ws::ws_score)) // WS /ws/score
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

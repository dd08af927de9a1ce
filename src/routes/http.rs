// HTTP handlers: version, score, sensor view, history, state ingestion, stateless evaluation

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::engine;
use crate::models::{HealthReport, ScoreSample, SystemSnapshot};
use crate::state_store::StatesPayload;
use crate::version::{NAME, VERSION};

const DEFAULT_HISTORY_LIMIT: u32 = 60;
/// One day at the default one-minute scan interval.
const MAX_HISTORY_LIMIT: u32 = 1440;

const SENSOR_UNIQUE_ID: &str = "system_ha_global_health_score";
const SENSOR_ICON: &str = "mdi:shield-check";

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/score: latest sample.
pub(super) async fn score_handler(State(state): State<AppState>) -> ApiResult<Json<ScoreSample>> {
    let latest = state.latest.read().await;
    latest.as_ref().cloned().map(Json).ok_or(ApiError::NotReady)
}

/// GET /api/sensor: the score as a sensor entity with its attribute map.
pub(super) async fn sensor_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let latest = state.latest.read().await;
    let sample = latest.as_ref().ok_or(ApiError::NotReady)?;
    Ok(Json(serde_json::json!({
        "name": state.config.publishing.name,
        "uniqueId": SENSOR_UNIQUE_ID,
        "state": sample.report.global_score,
        "unitOfMeasurement": "%",
        "icon": SENSOR_ICON,
        "lastUpdated": sample.timestamp,
        "attributes": sample.report.attributes(),
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<u32>,
}

/// GET /api/history?limit=N: recent samples, oldest first.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ScoreSample>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}, got {}",
            MAX_HISTORY_LIMIT, limit
        )));
    }
    let samples = state.history_repo.get_recent_samples(limit).await?;
    Ok(Json(samples))
}

/// POST /api/states: replaces the state store content.
pub(super) async fn states_handler(
    State(state): State<AppState>,
    Json(payload): Json<StatesPayload>,
) -> ApiResult<StatusCode> {
    let states = payload.states.len();
    state.state_store.write().await.replace(payload)?;
    tracing::debug!(operation = "replace_states", states, "state store replaced");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/evaluate: scores the given snapshot without touching service state.
pub(super) async fn evaluate_handler(Json(snapshot): Json<SystemSnapshot>) -> Json<HealthReport> {
    Json(engine::evaluate(&snapshot))
}

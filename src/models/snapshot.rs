// Engine input: one point-in-time capture of every signal the score depends on

use serde::{Deserialize, Serialize};

/// State of one monitored entity, as seen by the engine.
/// `ignored` is resolved by the caller (label matching on entity or device).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    pub id: String,
    pub domain: String,
    pub state: String,
    #[serde(default)]
    pub ignored: bool,
}

/// State reported by an integration health-check entity (e.g. "ok", "unhealthy").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationHealth {
    pub id: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub ram_percent: f64,
    #[serde(default)]
    pub disk_percent: f64,
    #[serde(default)]
    pub db_size_mb: f64,
    /// `None` when log monitoring is not configured.
    #[serde(default)]
    pub log_size_mb: Option<f64>,
    #[serde(default)]
    pub monitored_entities: Vec<EntityState>,
    #[serde(default)]
    pub integration_health_states: Vec<IntegrationHealth>,
    #[serde(default)]
    pub backup_is_stale: bool,
    #[serde(default)]
    pub pending_update_count: u32,
    #[serde(default)]
    pub core_version_current: Option<String>,
    #[serde(default)]
    pub core_version_latest: Option<String>,
}

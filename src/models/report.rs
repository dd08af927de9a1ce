// Engine output: scores, zombie list, maintenance sizes and advisories

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

/// Individual penalty terms behind the two sub-scores.
/// Application terms are already capped; `cpu` is the hardware tier penalty.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite,
)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyBreakdown {
    pub cpu: u32,
    pub zombie: u32,
    pub integration: u32,
    pub database: u32,
    pub log: u32,
    pub backup: u32,
    /// Pending updates plus core lag, after the combined cap.
    pub updates: u32,
    pub core_lag: u32,
}

impl PenaltyBreakdown {
    /// Sum of the terms subtracted from the application sub-score.
    pub fn application_total(&self) -> u32 {
        self.zombie + self.integration + self.database + self.log + self.backup + self.updates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub global_score: u8,
    pub hardware_score: u8,
    pub application_score: u8,
    pub zombie_count: u32,
    pub zombie_entity_ids: Vec<String>,
    pub db_size_mb: f64,
    /// 0.0 when log monitoring is not configured.
    pub log_size_mb: f64,
    pub advisories: Vec<String>,
    pub penalties: PenaltyBreakdown,
}

impl HealthReport {
    /// Advisories as one newline-separated block.
    pub fn recommendations(&self) -> String {
        self.advisories.join("\n")
    }

    /// Flat attribute map in the shape dashboards built around the sensor entity expect.
    pub fn attributes(&self) -> serde_json::Value {
        let zombie_entities = if self.zombie_entity_ids.is_empty() {
            "None".to_string()
        } else {
            self.zombie_entity_ids.join(", ")
        };
        serde_json::json!({
            "hardware_score": self.hardware_score,
            "application_score": self.application_score,
            "zombie_count": self.zombie_count,
            "zombie_entities": zombie_entities,
            "db_size_mb": self.db_size_mb,
            "log_size_mb": self.log_size_mb,
            "recommendations": self.recommendations(),
        })
    }
}

/// A report stamped with the evaluation time (ms since epoch); what the worker
/// publishes and the history stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSample {
    pub timestamp: u64,
    pub report: HealthReport,
}

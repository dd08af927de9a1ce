// Application sub-score penalty terms. Each term is capped on its own;
// the sum is subtracted from 100 and floored at 0 by the caller.

use crate::models::EntityState;

/// Domains whose entities count as zombies when unavailable/unknown.
pub const ZOMBIE_DOMAINS: [&str; 9] = [
    "sensor",
    "binary_sensor",
    "switch",
    "light",
    "fan",
    "climate",
    "media_player",
    "vacuum",
    "camera",
];

pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_UNHEALTHY: &str = "unhealthy";

/// Health-check entities report on other integrations; they are never zombies themselves.
pub const INTEGRATION_HEALTH_MARKER: &str = "integration_health";

const ZOMBIE_WEIGHT: u32 = 2;
const ZOMBIE_CAP: u32 = 20;
const INTEGRATION_WEIGHT: u32 = 5;
const INTEGRATION_CAP: u32 = 15;
const UPDATE_WEIGHT: u32 = 5;
const UPDATES_CAP: u32 = 35;
pub const BACKUP_PENALTY: u32 = 30;

/// (exclusive upper bound in MB, penalty); above the last bound gets the max.
const DB_TIERS: [(f64, u32); 2] = [(1000.0, 0), (2500.0, 10)];
const DB_MAX_PENALTY: u32 = 30;
const LOG_TIERS: [(f64, u32); 2] = [(20.0, 0), (100.0, 10)];
const LOG_MAX_PENALTY: u32 = 25;

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn tiered(value: f64, tiers: &[(f64, u32)], max: u32) -> u32 {
    tiers
        .iter()
        .find(|(bound, _)| value < *bound)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(max)
}

pub fn is_zombie(entity: &EntityState) -> bool {
    !entity.ignored
        && ZOMBIE_DOMAINS.contains(&entity.domain.as_str())
        && (entity.state == STATE_UNAVAILABLE || entity.state == STATE_UNKNOWN)
        && !entity.id.contains(INTEGRATION_HEALTH_MARKER)
}

/// Ids of zombie entities, in input order.
pub fn zombie_ids(entities: &[EntityState]) -> Vec<String> {
    entities
        .iter()
        .filter(|e| is_zombie(e))
        .map(|e| e.id.clone())
        .collect()
}

pub fn zombie_penalty(zombie_count: usize) -> u32 {
    count_u32(zombie_count)
        .saturating_mul(ZOMBIE_WEIGHT)
        .min(ZOMBIE_CAP)
}

pub fn integration_penalty(failed_integrations: usize) -> u32 {
    count_u32(failed_integrations)
        .saturating_mul(INTEGRATION_WEIGHT)
        .min(INTEGRATION_CAP)
}

pub fn database_penalty(db_size_mb: f64) -> u32 {
    tiered(db_size_mb, &DB_TIERS, DB_MAX_PENALTY)
}

/// No penalty when logs are not monitored.
pub fn log_penalty(log_size_mb: Option<f64>) -> u32 {
    log_size_mb.map_or(0, |mb| tiered(mb, &LOG_TIERS, LOG_MAX_PENALTY))
}

pub fn backup_penalty(backup_is_stale: bool) -> u32 {
    if backup_is_stale { BACKUP_PENALTY } else { 0 }
}

/// Pending updates and core lag share one cap.
pub fn updates_penalty(pending_update_count: u32, core_lag_penalty: u32) -> u32 {
    pending_update_count
        .saturating_mul(UPDATE_WEIGHT)
        .saturating_add(core_lag_penalty)
        .min(UPDATES_CAP)
}

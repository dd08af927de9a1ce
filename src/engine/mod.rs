// Scoring engine: SystemSnapshot -> HealthReport.
// Pure and deterministic; no I/O, no shared state, never fails.

pub mod advisory;
pub mod application;
pub mod hardware;
pub mod version_lag;

use crate::models::{HealthReport, PenaltyBreakdown, SystemSnapshot};
use advisory::Advisory;

const HARDWARE_WEIGHT: f64 = 0.4;
const APPLICATION_WEIGHT: f64 = 0.6;

const DISK_ADVISORY_PERCENT: f64 = 80.0;
const DB_ADVISORY_MB: f64 = 1000.0;
const LOG_ADVISORY_MB: f64 = 25.0;

/// Out-of-range percentages are treated as their nearest bound; NaN as 0.
fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Sizes: NaN, infinite and negative readings count as 0.
fn sanitize_size(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// One decimal, rounding the exact stored value with ties to even (same digits as `{:.1}`).
fn round_1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(0.0)
}

/// Truncates a score into [0, 100].
fn to_score(value: f64) -> u8 {
    value.floor().clamp(0.0, 100.0) as u8
}

pub fn evaluate(snapshot: &SystemSnapshot) -> HealthReport {
    let cpu = clamp_percent(snapshot.cpu_percent);
    let ram = clamp_percent(snapshot.ram_percent);
    let disk = clamp_percent(snapshot.disk_percent);
    let db_mb = sanitize_size(snapshot.db_size_mb);
    let log_mb = snapshot.log_size_mb.map(sanitize_size);

    let hw = hardware::score(cpu, ram, disk);
    let hardware_final = hw.total();

    let zombie_entity_ids = application::zombie_ids(&snapshot.monitored_entities);
    let zombie_count = zombie_entity_ids.len();
    let failed_integrations = snapshot
        .integration_health_states
        .iter()
        .filter(|h| h.state == application::STATE_UNHEALTHY)
        .count();
    let core_lag = version_lag::core_lag_penalty(
        snapshot.core_version_current.as_deref(),
        snapshot.core_version_latest.as_deref(),
    );

    let penalties = PenaltyBreakdown {
        cpu: hw.cpu_penalty,
        zombie: application::zombie_penalty(zombie_count),
        integration: application::integration_penalty(failed_integrations),
        database: application::database_penalty(db_mb),
        log: application::log_penalty(log_mb),
        backup: application::backup_penalty(snapshot.backup_is_stale),
        updates: application::updates_penalty(snapshot.pending_update_count, core_lag),
        core_lag,
    };
    let application_final = 100u32.saturating_sub(penalties.application_total());

    let global =
        hardware_final * HARDWARE_WEIGHT + f64::from(application_final) * APPLICATION_WEIGHT;

    let zombie_count = u32::try_from(zombie_count).unwrap_or(u32::MAX);
    let log_mb = log_mb.unwrap_or(0.0);
    // Scoring uses the clamped reading; the advisory reports what the sensor said.
    let raw_cpu = if snapshot.cpu_percent.is_nan() {
        0.0
    } else {
        snapshot.cpu_percent
    };
    let advisories = collect_advisories(
        raw_cpu,
        disk,
        db_mb,
        log_mb,
        snapshot.pending_update_count,
        zombie_count,
        &penalties,
    );

    HealthReport {
        global_score: to_score(global),
        hardware_score: to_score(hardware_final),
        application_score: to_score(f64::from(application_final)),
        zombie_count,
        zombie_entity_ids,
        db_size_mb: round_1(db_mb),
        log_size_mb: round_1(log_mb),
        advisories: advisory::render(&advisories),
        penalties,
    }
}

fn collect_advisories(
    cpu: f64,
    disk: f64,
    db_mb: f64,
    log_mb: f64,
    pending_update_count: u32,
    zombie_count: u32,
    penalties: &PenaltyBreakdown,
) -> Vec<Advisory> {
    let mut out = Vec::new();
    if penalties.cpu > 0 {
        out.push(Advisory::CpuImpact { cpu_percent: cpu });
    }
    if disk >= DISK_ADVISORY_PERCENT {
        out.push(Advisory::DiskCritical);
    }
    if db_mb > DB_ADVISORY_MB {
        out.push(Advisory::LargeDatabase { db_size_mb: db_mb });
    }
    if log_mb > LOG_ADVISORY_MB {
        out.push(Advisory::LargeLogs {
            log_size_mb: log_mb,
        });
    }
    if penalties.backup > 0 {
        out.push(Advisory::StaleBackup);
    }
    if pending_update_count > 0 {
        out.push(Advisory::PendingUpdates {
            count: pending_update_count,
        });
    }
    if penalties.zombie > 0 {
        out.push(Advisory::Zombies {
            count: zombie_count,
        });
    }
    if penalties.core_lag > 0 {
        out.push(Advisory::LegacyCore);
    }
    out
}

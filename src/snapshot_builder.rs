// Assembles a SystemSnapshot from the state store: resolves configured sources,
// walks all entities for label-based ignores, counts updates and health checks.

use crate::config::SourcesConfig;
use crate::engine::application::{INTEGRATION_HEALTH_MARKER, STATE_UNAVAILABLE, STATE_UNKNOWN};
use crate::models::{EntityState, IntegrationHealth, SystemSnapshot};
use crate::state_store::StateStore;

const STATE_ON: &str = "on";
const UPDATE_DOMAIN: &str = "update";
const HEALTH_CHECK_DOMAIN: &str = "sensor";
const ATTR_INSTALLED_VERSION: &str = "installed_version";
const ATTR_LATEST_VERSION: &str = "latest_version";

/// Numeric state of an entity; 0.0 when missing, unavailable, unknown or not a number.
pub fn read_float(store: &StateStore, entity_id: &str) -> f64 {
    let Some(record) = store.get(entity_id) else {
        return 0.0;
    };
    if record.state == STATE_UNAVAILABLE || record.state == STATE_UNKNOWN {
        return 0.0;
    }
    record.state.trim().parse::<f64>().unwrap_or(0.0)
}

pub fn build_snapshot(store: &StateStore, sources: &SourcesConfig) -> SystemSnapshot {
    let monitored_entities = store
        .all()
        .iter()
        .map(|r| EntityState {
            id: r.entity_id.clone(),
            domain: r.domain().to_string(),
            state: r.state.clone(),
            ignored: store.is_ignored(&r.entity_id, &sources.ignore_label),
        })
        .collect();

    let integration_health_states = store
        .all()
        .iter()
        .filter(|r| {
            r.domain() == HEALTH_CHECK_DOMAIN && r.entity_id.contains(INTEGRATION_HEALTH_MARKER)
        })
        .map(|r| IntegrationHealth {
            id: r.entity_id.clone(),
            state: r.state.clone(),
        })
        .collect();

    let pending_update_count = store
        .all()
        .iter()
        .filter(|r| r.domain() == UPDATE_DOMAIN && r.state == STATE_ON)
        .count();

    let backup_is_stale = store
        .get(&sources.backup_entity)
        .is_some_and(|r| r.state == STATE_ON);

    let core = store.get(&sources.core_update_entity);
    let core_version_current = core
        .and_then(|r| r.attribute_str(ATTR_INSTALLED_VERSION))
        .map(str::to_string);
    let core_version_latest = core
        .and_then(|r| r.attribute_str(ATTR_LATEST_VERSION))
        .map(str::to_string);

    SystemSnapshot {
        cpu_percent: read_float(store, &sources.cpu_sensor),
        ram_percent: read_float(store, &sources.ram_sensor),
        disk_percent: read_float(store, &sources.disk_sensor),
        db_size_mb: read_float(store, &sources.db_sensor),
        log_size_mb: sources
            .log_sensor
            .as_deref()
            .map(|id| read_float(store, id)),
        monitored_entities,
        integration_health_states,
        backup_is_stale,
        pending_update_count: u32::try_from(pending_update_count).unwrap_or(u32::MAX),
        core_version_current,
        core_version_latest,
    }
}

// Shared test helpers
#![allow(dead_code)]

use healthscore::config::AppConfig;
use healthscore::models::*;

pub const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[sources]
cpu_sensor = "sensor.processor_use"
ram_sensor = "sensor.memory_use_percent"
disk_sensor = "sensor.disk_use_percent"
db_sensor = "sensor.database_size"

[monitoring]
scan_interval_secs = 60
stats_log_interval_secs = 60
host_metrics = false

[publishing]
broadcast_capacity = 10

[database]
path = "data/test.db"
flush_rate = 5
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

pub fn entity(id: &str, state: &str) -> EntityState {
    let domain = id.split_once('.').map_or(id, |(d, _)| d);
    EntityState {
        id: id.into(),
        domain: domain.into(),
        state: state.into(),
        ignored: false,
    }
}

/// `n` unavailable sensors named sensor.dead_0 .. sensor.dead_{n-1}.
pub fn zombies(n: usize) -> Vec<EntityState> {
    (0..n)
        .map(|i| entity(&format!("sensor.dead_{}", i), "unavailable"))
        .collect()
}

pub fn sample(timestamp: u64, snapshot: &SystemSnapshot) -> ScoreSample {
    ScoreSample {
        timestamp,
        report: healthscore::evaluate(snapshot),
    }
}

use serde::Deserialize;

use crate::state_store::split_entity_id;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sources: SourcesConfig,
    pub monitoring: MonitoringConfig,
    pub publishing: PublishingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Which entities feed each signal of the snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub cpu_sensor: String,
    pub ram_sensor: String,
    pub disk_sensor: String,
    pub db_sensor: String,
    /// Log monitoring is optional; no penalty when unset.
    #[serde(default)]
    pub log_sensor: Option<String>,
    #[serde(default = "default_core_update_entity")]
    pub core_update_entity: String,
    #[serde(default = "default_backup_entity")]
    pub backup_entity: String,
    /// Registry label that exempts an entity (or every entity of a device) from zombie detection.
    #[serde(default = "default_ignore_label")]
    pub ignore_label: String,
    /// JSON states payload loaded into the store at startup.
    #[serde(default)]
    pub states_file: Option<String>,
}

fn default_core_update_entity() -> String {
    "update.home_assistant_core_update".into()
}

fn default_backup_entity() -> String {
    "binary_sensor.backups_stale".into()
}

fn default_ignore_label() -> String {
    "haghs_ignore".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// How often to log app stats (ws clients, evaluations, samples saved) at INFO level.
    pub stats_log_interval_secs: u64,
    /// Publish local CPU/RAM/disk readings as sensor.host_* entities.
    #[serde(default = "default_true")]
    pub host_metrics: bool,
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of score samples kept in the broadcast channel for /ws/score (slow clients may lag).
    pub broadcast_capacity: usize,
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "System: HA - Global Health Score".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub flush_rate: u64,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *"). Uses local time.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    #[serde(default = "default_vacuum_interval_secs")]
    pub vacuum_interval_secs: u64,
}

fn default_flush_interval_secs() -> u64 {
    300
}

fn default_retention_days() -> u32 {
    7
}

fn default_prune_interval_secs() -> u64 {
    3600
}

fn default_vacuum_interval_secs() -> u64 {
    86_400
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );

        let sources = &self.sources;
        let mut entity_ids = vec![
            ("sources.cpu_sensor", &sources.cpu_sensor),
            ("sources.ram_sensor", &sources.ram_sensor),
            ("sources.disk_sensor", &sources.disk_sensor),
            ("sources.db_sensor", &sources.db_sensor),
            ("sources.core_update_entity", &sources.core_update_entity),
            ("sources.backup_entity", &sources.backup_entity),
        ];
        if let Some(log_sensor) = &sources.log_sensor {
            entity_ids.push(("sources.log_sensor", log_sensor));
        }
        for (key, value) in entity_ids {
            if let Err(e) = split_entity_id(value) {
                anyhow::bail!("{} is not a valid entity id: {}", key, e);
            }
        }
        anyhow::ensure!(
            !sources.ignore_label.is_empty(),
            "sources.ignore_label must be non-empty"
        );
        if let Some(states_file) = &sources.states_file {
            anyhow::ensure!(
                !states_file.is_empty(),
                "sources.states_file must be non-empty when set"
            );
        }

        anyhow::ensure!(
            self.monitoring.scan_interval_secs > 0,
            "monitoring.scan_interval_secs must be > 0, got {}",
            self.monitoring.scan_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.flush_rate > 0,
            "database.flush_rate must be > 0, got {}",
            self.database.flush_rate
        );
        anyhow::ensure!(
            self.database.flush_interval_secs > 0,
            "database.flush_interval_secs must be > 0, got {}",
            self.database.flush_interval_secs
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.database.prune_interval_secs > 0,
            "database.prune_interval_secs must be > 0, got {}",
            self.database.prune_interval_secs
        );
        anyhow::ensure!(
            self.database.vacuum_interval_secs > 0,
            "database.vacuum_interval_secs must be > 0, got {}",
            self.database.vacuum_interval_secs
        );
        if let Some(schedule) = &self.database.vacuum_schedule
            && let Err(e) = schedule.parse::<cron::Schedule>()
        {
            anyhow::bail!(
                "database.vacuum_schedule is not a valid cron expression: {}",
                e
            );
        }
        Ok(())
    }
}

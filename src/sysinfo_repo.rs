// Host CPU / RAM / disk readings via sysinfo, published into the state store as sensor.host_*

use crate::state_store::EntityRecord;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, System};
use tracing::instrument;

pub const HOST_ENTITY_PREFIX: &str = "sensor.host_";
pub const HOST_CPU_ENTITY: &str = "sensor.host_cpu_percent";
pub const HOST_RAM_ENTITY: &str = "sensor.host_ram_percent";
pub const HOST_DISK_ENTITY: &str = "sensor.host_disk_percent";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetrics {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub disk_percent: f64,
}

impl HostMetrics {
    /// Readings as entity states, one decimal like a typical percentage sensor.
    pub fn records(&self) -> [EntityRecord; 3] {
        [
            EntityRecord::new(HOST_CPU_ENTITY, format!("{:.1}", self.cpu_percent))
                .with_attribute("unit_of_measurement", "%"),
            EntityRecord::new(HOST_RAM_ENTITY, format!("{:.1}", self.ram_percent))
                .with_attribute("unit_of_measurement", "%"),
            EntityRecord::new(HOST_DISK_ENTITY, format!("{:.1}", self.disk_percent))
                .with_attribute("unit_of_measurement", "%"),
        ]
    }
}

fn usage_percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        ((used as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let disks = Disks::new_with_refreshed_list();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(disks)),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "sample"))]
    pub async fn sample(&self) -> anyhow::Result<HostMetrics> {
        Ok(HostMetrics {
            cpu_percent: self.get_cpu_usage().await?,
            ram_percent: self.get_ram_usage().await?,
            disk_percent: self.get_root_disk_usage().await?,
        })
    }

    /// Global CPU usage. sysinfo needs two refreshes at least MINIMUM_CPU_UPDATE_INTERVAL
    /// apart; calls closer than that return the previous reading.
    pub async fn get_cpu_usage(&self) -> anyhow::Result<f64> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            let mut guard = last_cpu_refresh
                .lock()
                .map_err(|e| anyhow::anyhow!("cpu refresh lock poisoned: {}", e))?;

            let now = Instant::now();
            let usage = match *guard {
                Some((prev_ts, prev_usage))
                    if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                {
                    prev_usage
                }
                _ => {
                    sys.refresh_cpu_all();
                    let usage = f64::from(sys.global_cpu_usage()).clamp(0.0, 100.0);
                    *guard = Some((now, usage));
                    usage
                }
            };
            Ok(usage)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    pub async fn get_ram_usage(&self) -> anyhow::Result<f64> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();
            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            Ok(usage_percent(used, total))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Usage of the partition mounted at `/`, or the largest partition when there is none.
    pub async fn get_root_disk_usage(&self) -> anyhow::Result<f64> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(false);
            let list = disks_guard.list();
            let disk = list
                .iter()
                .find(|d| d.mount_point() == Path::new("/"))
                .or_else(|| list.iter().max_by_key(|d| d.total_space()));
            Ok(disk.map_or(0.0, |d| {
                let total = d.total_space();
                usage_percent(total.saturating_sub(d.available_space()), total)
            }))
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}

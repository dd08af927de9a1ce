// Human-readable findings. Variant order is the display order.

use std::fmt;

pub const ALL_CLEAR: &str = "✅ System optimized";

#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    CpuImpact { cpu_percent: f64 },
    DiskCritical,
    LargeDatabase { db_size_mb: f64 },
    LargeLogs { log_size_mb: f64 },
    StaleBackup,
    PendingUpdates { count: u32 },
    Zombies { count: u32 },
    LegacyCore,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::CpuImpact { cpu_percent } => write!(
                f,
                "⚡ Optimization: CPU load is impacting score ({:.1}%).",
                cpu_percent
            ),
            Advisory::DiskCritical => write!(f, "⚠️ Disk Space: Drive full (>80%). Clean up!"),
            Advisory::LargeDatabase { db_size_mb } => write!(
                f,
                "🗄️ Database: Huge DB ({:.1} GB). Check Recorder.",
                db_size_mb / 1000.0
            ),
            Advisory::LargeLogs { log_size_mb } => write!(
                f,
                "📜 Log File: Large Logs ({} MB). Errors detected?",
                log_size_mb.trunc() as u64
            ),
            Advisory::StaleBackup => write!(f, "🚨 Security: Stale backup detected!"),
            Advisory::PendingUpdates { count } => {
                write!(f, "📦 Maintenance: {} update(s) pending.", count)
            }
            Advisory::Zombies { count } => {
                write!(f, "🧟 Hygiene: {} Zombie Entities detected.", count)
            }
            Advisory::LegacyCore => write!(f, "👴 Legacy: Core version is >2 months old."),
        }
    }
}

/// Renders advisories, or the single all-clear line when there are none.
pub fn render(advisories: &[Advisory]) -> Vec<String> {
    if advisories.is_empty() {
        return vec![ALL_CLEAR.to_string()];
    }
    advisories.iter().map(ToString::to_string).collect()
}

// Hardware sub-score: CPU stair-steps, RAM and disk degrade linearly past a floor

const RAM_FLOOR_PERCENT: f64 = 70.0;
const RAM_SLOPE: f64 = 3.33;
const DISK_FLOOR_PERCENT: f64 = 80.0;
const DISK_SLOPE: f64 = 5.0;

/// (inclusive upper bound, penalty), ascending; anything above the last bound gets `CPU_MAX_PENALTY`.
const CPU_TIERS: [(f64, u32); 4] = [(10.0, 0), (15.0, 10), (25.0, 25), (50.0, 50)];
const CPU_MAX_PENALTY: u32 = 80;

/// Per-resource partial scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwareScore {
    pub cpu_penalty: u32,
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
}

impl HardwareScore {
    /// Unweighted mean of the three partial scores.
    pub fn total(&self) -> f64 {
        (self.cpu + self.ram + self.disk) / 3.0
    }
}

pub fn cpu_penalty(cpu_percent: f64) -> u32 {
    CPU_TIERS
        .iter()
        .find(|(bound, _)| cpu_percent <= *bound)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(CPU_MAX_PENALTY)
}

pub fn cpu_score(cpu_percent: f64) -> f64 {
    f64::from(100 - cpu_penalty(cpu_percent))
}

pub fn ram_score(ram_percent: f64) -> f64 {
    if ram_percent < RAM_FLOOR_PERCENT {
        return 100.0;
    }
    (100.0 - (ram_percent - RAM_FLOOR_PERCENT) * RAM_SLOPE).max(0.0)
}

pub fn disk_score(disk_percent: f64) -> f64 {
    if disk_percent < DISK_FLOOR_PERCENT {
        return 100.0;
    }
    (100.0 - (disk_percent - DISK_FLOOR_PERCENT) * DISK_SLOPE).max(0.0)
}

/// Inputs must already be clamped to [0, 100].
pub fn score(cpu_percent: f64, ram_percent: f64, disk_percent: f64) -> HardwareScore {
    HardwareScore {
        cpu_penalty: cpu_penalty(cpu_percent),
        cpu: cpu_score(cpu_percent),
        ram: ram_score(ram_percent),
        disk: disk_score(disk_percent),
    }
}

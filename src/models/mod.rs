// Domain models: engine input snapshot and scored output

mod report;
mod snapshot;

pub use report::{HealthReport, PenaltyBreakdown, ScoreSample};
pub use snapshot::{EntityState, IntegrationHealth, SystemSnapshot};

// Library root: engine plus the service plumbing around it (exposed for tests)

pub mod config;
pub mod engine;
pub mod history_repo;
pub mod maintenance_worker;
pub mod models;
pub mod routes;
pub mod snapshot_builder;
pub mod state_store;
pub mod sysinfo_repo;
pub mod version;
pub mod worker;

pub use engine::evaluate;
pub use models::{HealthReport, SystemSnapshot};

// src/status/mod.rs
mod report;
mod service;

pub use report::{AgentStatus, CronJobStatus, GatewayState, GatewayStatus, StatusReport};
pub use service::StatusService;

pub mod analytics;
pub mod config;
pub mod error;
pub mod report;
pub mod telemetry;

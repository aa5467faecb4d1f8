pub mod config;
pub mod error;
pub mod inspection;
pub mod report;
pub mod telemetry;

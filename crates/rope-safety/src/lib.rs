pub mod config;
pub mod error;
pub mod ratings;
pub mod telemetry;

pub mod clients;
pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod reminder;
pub mod telemetry;

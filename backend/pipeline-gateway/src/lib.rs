//! Pipeline Gateway Library
//! Re-exports modules for testing and integration

pub mod clients;
pub mod config;
pub mod rest_api;
pub mod telemetry;

//! # Actix Middleware Library
//!
//! Unified middleware components for the pipeline gateway
//!
//! ## Modules
//! - `correlation_id`: correlation header extraction, propagation and echo
//! - `logging`: request/response logging tagged with the request id

pub mod correlation_id;
pub mod logging;

pub use correlation_id::{get_correlation_id, Correlation, CorrelationIdMiddleware};
pub use logging::RequestLogging;

//! Request-scoped correlation values for the pipeline gateway
//!
//! A [`CorrelationContext`] holds the correlation headers of one inbound
//! request (request id, execution id, ...). The HTTP middleware binds it to
//! the request's future, after which any code running as part of that
//! request can read it without threading an identifier through every call:
//!
//! ```rust
//! use correlation_context::{headers, CorrelationContext};
//!
//! # async fn example() {
//! let context = CorrelationContext::new();
//! context.set(headers::REQUEST_ID, "req-123");
//!
//! context
//!     .scope(async {
//!         assert_eq!(correlation_context::request_id().as_deref(), Some("req-123"));
//!     })
//!     .await;
//!
//! // Outside the scope nothing is bound
//! assert!(correlation_context::request_id().is_none());
//! # }
//! ```
//!
//! ## Modules
//! - `context`: the per-request store and its task-local binding
//! - `headers`: well-known correlation header names

pub mod context;
pub mod headers;

pub use context::{
    current, get, propagate_blocking, request_id, set, ContextGuard, CorrelationContext,
};
pub use headers::{default_headers, generate_value, CorrelationHeader};

//! Failure taxonomy and HTTP error translation for the pipeline gateway
//!
//! Handlers and clients return [`ServiceError`]; they never build error
//! responses themselves. The `http` module turns a `ServiceError` into the
//! response a caller sees, which keeps one place deciding status codes and
//! reason phrases.
//!
//! # Rules
//!
//! 1. Anything not specifically classified is a 500 whose reason phrase is
//!    the failure's message, verbatim. Classified failures keep the
//!    canonical reason; their message goes in the body
//! 2. Only the message reaches the caller, never a source chain
//! 3. Translation cannot fail: unknown failures take rule 1

use thiserror::Error;

pub mod http;
pub mod reason;

pub use http::HttpErrorResponse;

/// Result alias used across gateway crates
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure raised while handling a gateway request
///
/// `Display` yields the public message for every variant.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unclassified failure
    #[error("{message}")]
    Internal { message: String },

    /// Unclassified failure from arbitrary code
    #[error(transparent)]
    Other(anyhow::Error),

    /// Caller sent something unusable
    #[error("{message}")]
    InvalidInput { message: String },

    /// Referenced resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Downstream service answered with an error status
    #[error("{message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    /// Downstream service could not be reached
    #[error("{message}")]
    Unavailable { service: String, message: String },

    /// Downstream call did not finish in time
    #[error("{operation} timed out")]
    Timeout { operation: String },
}

impl ServiceError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::Internal { .. } | Self::Other(_) => "INTERNAL_ERROR",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Unavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    /// True when no specific classification applies
    pub fn is_unclassified(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Other(_))
    }
}

/// Recovers a `ServiceError` wrapped in an `anyhow::Error`; anything else
/// is unclassified
impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ServiceError>() {
            Ok(service_error) => service_error,
            Err(other) => Self::Other(other),
        }
    }
}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        Self::Internal { message }
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        Self::internal(message)
    }
}

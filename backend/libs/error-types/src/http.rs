//! HTTP error response handling
//!
//! `ServiceError` implements actix's `ResponseError`, so any handler
//! returning `Result<_, ServiceError>` gets a consistent error response:
//! status from the failure's classification, a JSON body carrying the
//! message and request id, and for unclassified failures the message as the
//! reason phrase. Classified failures keep the canonical reason.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use crate::{reason, ServiceError};

/// Standard HTTP error body
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for client handling
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Timestamp of the error
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HttpErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            request_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Add request ID for tracing
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl ServiceError {
    fn log(&self, status: StatusCode, request_id: Option<&str>) {
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                code = self.code(),
                request_id = request_id.unwrap_or("-"),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                code = self.code(),
                request_id = request_id.unwrap_or("-"),
                error = %self,
                "Request rejected"
            );
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Upstream { status, .. } => match StatusCode::from_u16(*status) {
                Ok(status) if status.is_client_error() => status,
                _ => StatusCode::BAD_GATEWAY,
            },
            ServiceError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Internal { .. } | ServiceError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let request_id = correlation_context::request_id();

        self.log(status, request_id.as_deref());

        let mut body = HttpErrorResponse::new(status.as_u16(), self.code(), message.as_str());
        if let Some(id) = request_id {
            body = body.with_request_id(id);
        }

        let mut builder = HttpResponse::build(status);
        // Classified failures carry caller or upstream data; only
        // unclassified messages reach the status line
        if self.is_unclassified() {
            if let Some(phrase) = reason::reason_phrase(&message) {
                builder.reason(phrase);
            }
        }
        builder.json(body)
    }
}

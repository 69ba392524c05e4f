//! Well-known correlation headers
//!
//! Only the request id is generated when a caller omits it. The remaining
//! headers are carried through when present and never invented.

use uuid::Uuid;

/// Request identifier, generated when absent
pub const REQUEST_ID: &str = "X-SPINNAKER-REQUEST-ID";

/// Identifier of the pipeline execution a request belongs to
pub const EXECUTION_ID: &str = "X-SPINNAKER-EXECUTION-ID";

/// Application the request acts on
pub const APPLICATION: &str = "X-SPINNAKER-APPLICATION";

/// Originating client of the request (ui, api, ...)
pub const USER_ORIGIN: &str = "X-SPINNAKER-USER-ORIGIN";

/// A header the correlation middleware tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationHeader {
    pub name: String,
    /// Generate a fresh value when the inbound request lacks this header
    pub generate_if_absent: bool,
}

impl CorrelationHeader {
    /// Header that is generated when missing
    pub fn generated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generate_if_absent: true,
        }
    }

    /// Header that is only carried through when the caller sent it
    pub fn propagated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generate_if_absent: false,
        }
    }
}

/// Default header set: request id plus the propagate-only headers
pub fn default_headers() -> Vec<CorrelationHeader> {
    vec![
        CorrelationHeader::generated(REQUEST_ID),
        CorrelationHeader::propagated(EXECUTION_ID),
        CorrelationHeader::propagated(APPLICATION),
        CorrelationHeader::propagated(USER_ORIGIN),
    ]
}

/// Fresh correlation value (UUID v4)
pub fn generate_value() -> String {
    Uuid::new_v4().to_string()
}

//! Structured logging setup

use anyhow::{anyhow, Result};
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "info,pipeline_gateway=debug";

/// Install the global JSON subscriber
///
/// `RUST_LOG` overrides the default filter. Span fields (the request id of
/// the `http_request` span) are included on every line.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

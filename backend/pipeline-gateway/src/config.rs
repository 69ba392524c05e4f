//! Configuration for the Pipeline Gateway
//!
//! Loads settings from, lowest priority first:
//! 1. Built-in defaults
//! 2. `config/gateway.toml` (optional)
//! 3. Environment variables prefixed with `GATE__`, sections separated by
//!    `__` (e.g. `GATE__SERVER__PORT=9090`)
//!
//! A `.env` file is read first for local development.

use anyhow::{anyhow, Context, Result};
use correlation_context::{headers, CorrelationHeader};
use serde::Deserialize;
use std::path::Path;

/// Optional configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config/gateway.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Orchestration service endpoint
    pub orchestration: OrchestrationConfig,

    /// Correlation headers
    pub correlation: CorrelationConfig,

    /// Error translation
    pub errors: ErrorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 0 = one worker per CPU core
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Header generated when a caller omits it
    pub request_id_header: String,
    /// Headers echoed and forwarded only when present
    pub propagated_headers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorsConfig {
    /// Distinct reason phrases kept for the status line
    pub max_interned_reasons: usize,
}

impl Config {
    /// Load configuration from `.env`, the default file and the environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load(Some(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Load configuration with an optional file layered over the defaults
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8084)?
            .set_default("server.workers", 0)?
            .set_default("orchestration.base_url", "http://orca:8083")?
            .set_default("orchestration.timeout_ms", 30_000)?
            .set_default("correlation.request_id_header", headers::REQUEST_ID)?
            .set_default(
                "correlation.propagated_headers",
                vec![headers::EXECUTION_ID, headers::APPLICATION, headers::USER_ORIGIN],
            )?
            .set_default(
                "errors.max_interned_reasons",
                error_types::reason::DEFAULT_CAPACITY as i64,
            )?;

        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("GATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("correlation.propagated_headers"),
            )
            .build()
            .context("Failed to load configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if self.orchestration.base_url.trim().is_empty() {
            return Err(anyhow!("Orchestration base URL is required"));
        }

        if self.orchestration.timeout_ms == 0 {
            return Err(anyhow!("Orchestration timeout must be greater than 0"));
        }

        if self.correlation.request_id_header.trim().is_empty() {
            return Err(anyhow!("Request id header name is required"));
        }

        Ok(())
    }

    /// Headers tracked by the correlation middleware
    ///
    /// The request id header comes first; duplicates of it in the
    /// propagated list are dropped.
    pub fn correlation_headers(&self) -> Vec<CorrelationHeader> {
        let request_id = self.correlation.request_id_header.trim();
        let mut tracked = vec![CorrelationHeader::generated(request_id)];

        for name in &self.correlation.propagated_headers {
            let name = name.trim();
            if name.is_empty()
                || tracked.iter().any(|h| h.name.eq_ignore_ascii_case(name))
            {
                continue;
            }
            tracked.push(CorrelationHeader::propagated(name));
        }

        tracked
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

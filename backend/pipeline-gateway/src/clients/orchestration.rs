//! HTTP client for the orchestration service
//!
//! `POST {base_url}/orchestrate/{pipeline_id}` with the trigger as JSON,
//! tagged with the application it was submitted for.
//! Every correlation value bound to the calling request is forwarded as a
//! header, so downstream logs line up with the gateway's.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use correlation_context::headers;
use error_types::{ServiceError, ServiceResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{TriggerPayload, TriggerResult, TriggerService};
use crate::config::OrchestrationConfig;

const SERVICE_NAME: &str = "orchestration";

#[derive(Debug, Clone)]
pub struct OrchestrationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OrchestrationClient {
    pub fn new(config: &OrchestrationConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid orchestration base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "Orchestration base URL cannot be a base: {}",
                config.base_url
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build orchestration HTTP client")?;

        Ok(Self { http, base_url })
    }

    fn orchestrate_url(&self, pipeline_id: &str) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::internal("orchestration base URL cannot be a base"))?
            .pop_if_empty()
            .push("orchestrate")
            .push(pipeline_id);
        Ok(url)
    }

    /// Correlation values of the current request plus the application
    fn outbound_headers(application: &str) -> HeaderMap {
        let mut outbound = HeaderMap::new();

        let values = correlation_context::current()
            .map(|context| context.values())
            .unwrap_or_default();

        for (name, value) in values {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    outbound.insert(name, value);
                }
                _ => warn!(header = %name, "Skipping correlation value that is not a valid header"),
            }
        }

        match (
            HeaderName::from_bytes(headers::APPLICATION.as_bytes()),
            HeaderValue::from_str(application),
        ) {
            (Ok(name), Ok(value)) => {
                outbound.insert(name, value);
            }
            _ => warn!(
                header = headers::APPLICATION,
                "Application name is not a valid header value, not forwarding"
            ),
        }

        outbound
    }

    fn transport_error(err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout {
                operation: "trigger pipeline".to_string(),
            }
        } else if err.is_connect() {
            ServiceError::Unavailable {
                service: SERVICE_NAME.to_string(),
                message: format!("{SERVICE_NAME} service unavailable"),
            }
        } else {
            // The URL holds the caller's pipeline id; keep it out of the message
            ServiceError::internal(format!("{SERVICE_NAME} request failed: {}", err.without_url()))
        }
    }
}

/// Error body text, or empty when it could not be read
fn error_body<E: std::fmt::Display>(
    body: std::result::Result<String, E>,
    pipeline_id: &str,
    status: StatusCode,
) -> String {
    body.unwrap_or_else(|e| {
        warn!(
            pipeline_id = %pipeline_id,
            status = status.as_u16(),
            error = %e,
            "Failed to read {SERVICE_NAME} error body"
        );
        String::new()
    })
}

/// `message` or `error` field of a JSON error body
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[async_trait]
impl TriggerService for OrchestrationClient {
    async fn trigger(
        &self,
        application: &str,
        pipeline_id: &str,
        mut trigger: TriggerPayload,
    ) -> ServiceResult<TriggerResult> {
        let url = self.orchestrate_url(pipeline_id)?;

        // Caller-supplied application wins
        trigger
            .entry("application")
            .or_insert_with(|| serde_json::Value::String(application.to_string()));

        debug!(
            application = %application,
            pipeline_id = %pipeline_id,
            url = %url,
            "Forwarding pipeline trigger"
        );

        let response = self
            .http
            .post(url)
            .headers(Self::outbound_headers(application))
            .json(&trigger)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await.map_err(Self::transport_error)?;
            info!(
                application = %application,
                pipeline_id = %pipeline_id,
                status = status.as_u16(),
                "Pipeline triggered"
            );

            if body.is_empty() {
                return Ok(TriggerResult::new());
            }
            return serde_json::from_slice(&body).map_err(|e| {
                ServiceError::internal(format!("Invalid {SERVICE_NAME} response: {e}"))
            });
        }

        let body = error_body(response.text().await, pipeline_id, status);
        let message = upstream_message(&body).unwrap_or_else(|| {
            format!(
                "{SERVICE_NAME} returned {}",
                status.canonical_reason().unwrap_or("an error")
            )
        });

        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound {
                resource: "pipeline",
                id: pipeline_id.to_string(),
            });
        }

        Err(ServiceError::Upstream {
            service: SERVICE_NAME.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

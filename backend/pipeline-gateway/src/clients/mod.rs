//! Downstream service clients
//!
//! Handlers depend on the [`TriggerService`] trait, not on a concrete
//! client, so tests can swap in a mock.

use async_trait::async_trait;
use error_types::ServiceResult;
use serde_json::{Map, Value};

pub mod orchestration;

pub use orchestration::OrchestrationClient;

/// Caller-supplied trigger, passed through untouched
pub type TriggerPayload = Map<String, Value>;

/// Whatever the orchestration service answered
pub type TriggerResult = Map<String, Value>;

/// Starts pipeline executions
#[async_trait]
pub trait TriggerService: Send + Sync {
    async fn trigger(
        &self,
        application: &str,
        pipeline_id: &str,
        trigger: TriggerPayload,
    ) -> ServiceResult<TriggerResult>;
}

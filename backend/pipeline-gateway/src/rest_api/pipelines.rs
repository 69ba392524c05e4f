use actix_web::{post, web, HttpResponse};
use error_types::{ServiceError, ServiceResult};
use tracing::info;

use crate::clients::{TriggerPayload, TriggerService};

/// A validated trigger request
#[derive(Debug)]
pub struct TriggerRequest {
    pub application: String,
    pub pipeline_id: String,
    pub trigger: TriggerPayload,
}

impl TriggerRequest {
    pub fn new(application: &str, pipeline_id: &str, trigger: TriggerPayload) -> ServiceResult<Self> {
        let application = application.trim();
        let pipeline_id = pipeline_id.trim();

        if application.is_empty() {
            return Err(ServiceError::invalid_input("application name must not be blank"));
        }
        if pipeline_id.is_empty() {
            return Err(ServiceError::invalid_input("pipeline id must not be blank"));
        }

        Ok(Self {
            application: application.to_string(),
            pipeline_id: pipeline_id.to_string(),
            trigger,
        })
    }
}

/// POST /pipelines/{application}/{pipeline_id}
///
/// Failures are returned as-is; the error translator decides the response.
#[post("/pipelines/{application}/{pipeline_id}")]
pub async fn invoke_pipeline_config(
    path: web::Path<(String, String)>,
    trigger: web::Json<TriggerPayload>,
    triggers: web::Data<dyn TriggerService>,
) -> Result<HttpResponse, ServiceError> {
    let (application, pipeline_id) = path.into_inner();
    let request = TriggerRequest::new(&application, &pipeline_id, trigger.into_inner())?;

    info!(
        application = %request.application,
        pipeline_id = %request.pipeline_id,
        trigger_keys = request.trigger.len(),
        "Triggering pipeline"
    );

    let result = triggers
        .trigger(&request.application, &request.pipeline_id, request.trigger)
        .await?;

    Ok(HttpResponse::Accepted().json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_request_trims_identifiers() {
        let request = TriggerRequest::new(" my-application ", "my-pipeline-id\t", TriggerPayload::new())
            .unwrap();

        assert_eq!(request.application, "my-application");
        assert_eq!(request.pipeline_id, "my-pipeline-id");
    }

    #[test]
    fn test_trigger_request_rejects_blank_identifiers() {
        let err = TriggerRequest::new("  ", "p", TriggerPayload::new()).unwrap_err();
        assert_eq!(err.to_string(), "application name must not be blank");

        let err = TriggerRequest::new("app", "", TriggerPayload::new()).unwrap_err();
        assert_eq!(err.to_string(), "pipeline id must not be blank");
    }
}

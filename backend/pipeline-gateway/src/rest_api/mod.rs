//! REST API routes
//!
//! Request bodies and paths that fail to parse are turned into
//! `ServiceError::InvalidInput`, so they get the same error translation as
//! handler failures.

use actix_web::{web, HttpResponse};
use error_types::ServiceError;

pub mod pipelines;

/// Register every gateway route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/health", web::get().to(health))
        .service(pipelines::invoke_pipeline_config);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServiceError::invalid_input(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| ServiceError::invalid_input(err.to_string()).into())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

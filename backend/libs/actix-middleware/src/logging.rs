//! Logging middleware
//!
//! Logs HTTP request/response information using tracing. Place it inside
//! `CorrelationIdMiddleware` so every line carries the request id.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

/// Middleware that logs HTTP requests and responses
#[derive(Clone, Default)]
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggingService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let request_id = correlation_context::request_id().unwrap_or_default();

        tracing::info!(
            method = %method,
            path = %path,
            request_id = %request_id,
            "HTTP request started"
        );

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(res) => tracing::info!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    status = %res.status().as_u16(),
                    duration_ms = elapsed.as_millis() as u64,
                    "HTTP request completed"
                ),
                Err(err) => tracing::warn!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    status = %err.as_response_error().status_code().as_u16(),
                    duration_ms = elapsed.as_millis() as u64,
                    "HTTP request failed"
                ),
            }

            result
        })
    }
}

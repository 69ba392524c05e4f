//! Request correlation ID middleware
//!
//! Extracts or generates correlation values for request tracing across
//! services and guarantees they come back on the response.
//!
//! ## Design
//! - If the request carries a tracked header: use its value
//! - Otherwise: generate a UUID v4 (request id only, see
//!   [`CorrelationHeader::generate_if_absent`])
//! - Bind a [`CorrelationContext`] to the rest of the chain and store it in
//!   request extensions for handler access
//! - Run the chain inside an `http_request` tracing span carrying the
//!   request id
//! - Write the context back onto the response whether the chain returned a
//!   response, returned an error or panicked. Errors and panics leave the
//!   middleware as an `InternalError` wrapping the finished response, which
//!   actix sends unchanged
//! - Clear the context once the response is built
//!
//! Register it last (outermost) so it sees every response:
//!
//! ```rust
//! use actix_middleware::CorrelationIdMiddleware;
//! use actix_web::App;
//!
//! let app = App::new()
//!     .wrap(CorrelationIdMiddleware::default());
//! ```

use actix_web::{
    body::MessageBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header::{HeaderMap, HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use correlation_context::{default_headers, generate_value, CorrelationContext, CorrelationHeader};
use futures::future::{FutureExt, LocalBoxFuture};
use std::any::Any;
use std::future::{ready, Ready};
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::sync::Arc;
use tracing::Instrument;

/// Middleware that manages request correlation values
#[derive(Clone)]
pub struct CorrelationIdMiddleware {
    headers: Arc<Vec<CorrelationHeader>>,
}

impl CorrelationIdMiddleware {
    pub fn new(headers: Vec<CorrelationHeader>) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }

    pub fn headers(&self) -> &[CorrelationHeader] {
        &self.headers
    }
}

impl Default for CorrelationIdMiddleware {
    fn default() -> Self {
        Self::new(default_headers())
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorrelationIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationIdMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationIdMiddlewareService {
            service: Rc::new(service),
            headers: Arc::clone(&self.headers),
        }))
    }
}

pub struct CorrelationIdMiddlewareService<S> {
    service: Rc<S>,
    headers: Arc<Vec<CorrelationHeader>>,
}

impl<S> CorrelationIdMiddlewareService<S> {
    fn extract(&self, req: &ServiceRequest) -> CorrelationContext {
        let context = CorrelationContext::new();

        for header in self.headers.iter() {
            // Any UTF-8 value is kept; only undecodable bytes count as absent
            let inbound = req
                .headers()
                .get(header.name.as_str())
                .and_then(|h| std::str::from_utf8(h.as_bytes()).ok())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            match inbound {
                Some(value) => context.set(&header.name, value),
                None if header.generate_if_absent => context.set(&header.name, generate_value()),
                None => {}
            }
        }

        context
    }
}

impl<S, B> Service<ServiceRequest> for CorrelationIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let context = self.extract(&req);
        let established = context.values();

        // Store in request extensions for handler access
        req.extensions_mut().insert(context.clone());

        let span = tracing::info_span!(
            "http_request",
            request_id = %context.request_id().unwrap_or_default(),
            method = %req.method(),
            path = %req.path(),
        );
        // No HttpRequest clone may outlive this point: routing needs it unshared
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let _guard = context.guard();

            let chain = context.clone().scope(async move {
                // Rendered inside the scope so the error body sees the context
                service.call(req).await.map_err(|err| {
                    let res = err.error_response();
                    (err, res)
                })
            });

            let outcome = AssertUnwindSafe(chain.instrument(span.clone()))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(mut res)) => {
                    finalize_headers(res.headers_mut(), &context, established);
                    Ok(res)
                }
                Ok(Err((err, mut res))) => {
                    finalize_headers(res.headers_mut(), &context, established);
                    Err(InternalError::from_response(err, res).into())
                }
                Err(payload) => {
                    span.in_scope(|| {
                        tracing::error!(
                            panic = panic_message(payload.as_ref()),
                            "Request handler panicked"
                        );
                    });
                    let mut res = HttpResponse::InternalServerError().finish();
                    finalize_headers(res.headers_mut(), &context, established);
                    Err(InternalError::from_response("request handler panicked", res).into())
                }
            }
        })
    }
}

/// Values added during the request are echoed too; the values established
/// on entry always win
fn finalize_headers(
    headers: &mut HeaderMap,
    context: &CorrelationContext,
    established: Vec<(String, String)>,
) {
    write_headers(headers, context.values());
    write_headers(headers, established);
}

fn write_headers(headers: &mut HeaderMap, values: Vec<(String, String)>) {
    for (name, value) in values {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(header_name), Ok(header_value)) => {
                headers.insert(header_name, header_value);
            }
            _ => {
                tracing::warn!(header = %name, "Correlation value is not a valid header, skipping");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Extract the request id for this request
///
/// Falls back to the task-local context, then to a fresh value when the
/// middleware is not installed.
///
/// ## Example
/// ```rust
/// use actix_middleware::get_correlation_id;
/// use actix_web::HttpRequest;
///
/// fn handler(req: HttpRequest) -> String {
///     let id = get_correlation_id(&req);
///     format!("Request ID: {}", id)
/// }
/// ```
pub fn get_correlation_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<CorrelationContext>()
        .and_then(CorrelationContext::request_id)
        .or_else(correlation_context::request_id)
        .unwrap_or_else(generate_value)
}

/// Extractor for the request's correlation context
///
/// ```rust
/// use actix_middleware::Correlation;
///
/// async fn handler(Correlation(context): Correlation) -> String {
///     context.request_id().unwrap_or_default()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Correlation(pub CorrelationContext);

impl FromRequest for Correlation {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let context = req
            .extensions()
            .get::<CorrelationContext>()
            .cloned()
            .or_else(correlation_context::current);

        ready(match context {
            Some(context) => Ok(Correlation(context)),
            None => Err(actix_web::error::ErrorInternalServerError(
                "correlation middleware is not installed",
            )),
        })
    }
}

use actix_middleware::{CorrelationIdMiddleware, RequestLogging};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use pipeline_gateway::clients::{OrchestrationClient, TriggerService};
use pipeline_gateway::{config::Config, rest_api, telemetry};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing()?;

    info!("Starting Pipeline Gateway...");

    let config = Config::from_env()?;

    error_types::reason::set_capacity(config.errors.max_interned_reasons);

    let triggers: Arc<dyn TriggerService> = Arc::new(
        OrchestrationClient::new(&config.orchestration)
            .context("Failed to initialize orchestration client")?,
    );
    let triggers = web::Data::from(triggers);

    info!(
        base_url = %config.orchestration.base_url,
        timeout_ms = config.orchestration.timeout_ms,
        "Orchestration client initialized"
    );

    let headers = config.correlation_headers();
    info!(
        headers = ?headers.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
        "Correlation headers configured"
    );
    let correlation = CorrelationIdMiddleware::new(headers);

    let bind_addr = config.bind_addr();
    info!("Pipeline Gateway starting on http://{}", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            // Outermost: sees every response, including errors from the layers below
            .wrap(correlation.clone())
            .app_data(triggers.clone())
            .configure(rest_api::configure)
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind {bind_addr}"))?
        .run()
        .await
        .context("Pipeline Gateway stopped with an error")
}

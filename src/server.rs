//! HTTP Server and Metrics Collection
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Pull-driven scraping**: every `/metrics` request runs one scrape cycle against the
//!   switch before rendering; there is no background polling
//! - **State Management**: Shared state (scraper, metrics) using Arc for thread-safety
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Scrape the switch, then return Prometheus metrics in text format
//! - `GET /health` - Health check (200 if the last scrape succeeded, 503 otherwise)
//!
//! # Error Handling
//!
//! A failed scrape is logged, sets `gs1200_up` to 0 and clears the device metrics.
//! The request still returns the rendered registry so Prometheus sees `up == 0`
//! rather than a failed target.

use crate::collector::Scraper;
use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::projection;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<Scraper>,
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(scraper: Scraper, metrics: MetricsCollector) -> Self {
        Self {
            scraper: Arc::new(scraper),
            metrics,
        }
    }
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let scraper = Scraper::new(&config.device)?;
    let state = AppState::new(scraper, metrics);

    let app = router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run one scrape cycle and publish its result. Returns whether it succeeded.
pub async fn scrape_and_publish(state: &AppState) -> bool {
    let metrics = &state.metrics;

    state
        .scraper
        .scrape_then(|outcome, elapsed| {
            let observations = match outcome {
                Ok(device) => Some(projection::project(&device)),
                Err(e) => {
                    if e.is_payload_error() {
                        error!("Switch returned unexpected data: {}", e);
                    } else {
                        error!("Failed to collect metrics: {}", e);
                    }
                    None
                }
            };

            match metrics.publish_cycle(observations.as_deref(), elapsed) {
                Ok(()) => observations.is_some(),
                Err(e) => {
                    error!("Failed to publish metrics: {}", e);
                    false
                }
            }
        })
        .await
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>GS1200 Exporter</title></head>
<body>
<h1>GS1200 Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    scrape_and_publish(&state).await;

    match state.metrics.render() {
        Ok(metrics) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            metrics,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up_value = state.metrics.up.get();

    if up_value > 0.0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Last scrape of the switch failed")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

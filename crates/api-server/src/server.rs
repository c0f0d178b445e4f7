//! API server — router assembly and HTTP/metrics startup.

use crate::rest::{self, AppState};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use brain_core::config::AppConfig;
use brain_reporting::archive::SummaryArchive;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Uploaded exports are small tabular files; cap the request body well
/// above any realistic weekly export.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct ApiServer {
    config: AppConfig,
    archive: Option<Arc<SummaryArchive>>,
}

impl ApiServer {
    pub fn new(config: AppConfig) -> Self {
        let archive = config
            .archive
            .enabled
            .then(|| Arc::new(SummaryArchive::new(&config.archive.dir)));
        Self { config, archive }
    }

    /// Assemble the application router. Split out from `start_http` so
    /// tests can drive it without binding a socket.
    pub fn router(&self) -> Router {
        let state = AppState {
            archive: self.archive.clone(),
            start_time: Instant::now(),
        };

        Router::new()
            // Analysis endpoint
            .route("/api/analyze-campaigns", post(rest::analyze_campaigns))
            // Operational endpoints
            .route("/api/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus exporter on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.metrics.port);
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

//! API server. Serves the CRM REST API and operational probes over HTTP and
//! exposes Prometheus metrics on a separate port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use crm_core::AppConfig;
use crm_management::{management_router, ManagementState};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rest::{self, AppState};

pub struct ApiServer {
    config: AppConfig,
    state: ManagementState,
    ready: Arc<AtomicBool>,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: ManagementState) -> Self {
        Self {
            config,
            state,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report ready on `/ready` from now on.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let ops_state = AppState {
            store: Arc::clone(&self.state.store),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
            ready: Arc::clone(&self.ready),
        };
        let ops = Router::new()
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .with_state(ops_state);

        Ok(management_router(self.state.clone())
            .merge(ops)
            .layer(CompressionLayer::new())
            .layer(self.cors()?)
            .layer(TraceLayer::new_for_http()))
    }

    fn cors(&self) -> anyhow::Result<CorsLayer> {
        let origin = self.config.api.frontend_origin.trim();
        if origin == "*" {
            return Ok(CorsLayer::permissive());
        }
        Ok(CorsLayer::new()
            .allow_origin(HeaderValue::from_str(origin)?)
            .allow_methods(Any)
            .allow_headers(Any))
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Install the Prometheus recorder and serve it on the metrics port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> ApiServer {
        let config = AppConfig::default();
        let state = ManagementState::from_config(&config);
        ApiServer::new(config, state)
    }

    async fn get_status(app: &Router, uri: &str) -> StatusCode {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_readiness_follows_startup() {
        let server = server();
        let app = server.router().unwrap();
        assert_eq!(get_status(&app, "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get_status(&app, "/live").await, StatusCode::OK);

        server.mark_ready();
        assert_eq!(get_status(&app, "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_node() {
        let app = server().router().unwrap();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["customers"], 0);
    }

    #[tokio::test]
    async fn test_api_routes_are_mounted_behind_auth() {
        let app = server().router().unwrap();
        assert_eq!(get_status(&app, "/api/campaigns").await, StatusCode::UNAUTHORIZED);
    }
}

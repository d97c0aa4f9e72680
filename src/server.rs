//! HTTP endpoint for daemon metrics
//!
//! # Routes
//!
//! - `GET /health` - Liveness probe
//! - `GET /metrics` - Prometheus text format
//!
//! Runs on its own task next to the daemon loop; the loop never waits on it.

use crate::daemon::metrics;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

/// Metrics HTTP server
pub struct MetricsServer {
    listener: TcpListener,
}

impl MetricsServer {
    /// Bind the listener; failure here is a startup error
    pub async fn bind(addr: &str) -> crate::Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            crate::EdgeVertexError::Config(format!("Failed to bind metrics address {}: {}", addr, e))
        })?;
        Ok(Self { listener })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> crate::Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Build the router
    pub fn router() -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(render_metrics))
    }

    /// Serve until the process exits
    pub async fn run(self) -> crate::Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(addr = %addr, "Metrics server listening");
        }
        axum::serve(self.listener, Self::router()).await?;
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

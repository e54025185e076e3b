//! Liveness and metrics HTTP server.
//!
//! - `GET /health` and `GET /` - always `200 OK`
//! - `GET /metrics` - Prometheus text exposition

use std::net::SocketAddr;

use axum::{Router, extract::State, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub fn app(metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

async fn render_metrics(State(metrics): State<PrometheusHandle>) -> String {
    metrics.render()
}

/// Serve [`app`] on `addr` until `shutdown_token` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    metrics: PrometheusHandle,
    shutdown_token: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .inspect_err(|e| error!(addr = %addr, error = %e, "Failed to bind health server"))?;
    info!(addr = %listener.local_addr()?, "Health server listening");

    axum::serve(listener, app(metrics))
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await
}

/// Waits for a spawned [`serve`] task. A panicked or aborted task is reported as an error.
pub async fn join(server: JoinHandle<std::io::Result<()>>) -> std::io::Result<()> {
    server.await.map_err(std::io::Error::other)?
}

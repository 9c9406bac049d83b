//! HTTP surface of the agent binary
//!
//! `/healthz` and `/readyz` answer process supervisors from the shared
//! [`HealthReport`], `/metrics` exposes the Prometheus registry and the
//! dashboard routes are merged in from `agent_lib::dashboard`.

use agent_lib::{
    dashboard,
    health::{ComponentStatus, HealthRegistry, HealthReport},
    orchestrator::ControlHandle,
};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use prometheus::{Encoder, TextEncoder};
use tracing::{error, info};

/// Liveness: only an unhealthy component fails it. In-memory learning and a
/// flaky scan still capture handshakes.
async fn healthz(State(health): State<HealthRegistry>) -> (StatusCode, Json<HealthReport>) {
    let report = health.report().await;
    let code = if report.status == ComponentStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report))
}

async fn readyz(State(health): State<HealthRegistry>) -> (StatusCode, Json<HealthReport>) {
    let report = health.report().await;
    let code = if report.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

async fn metrics() -> (StatusCode, [(&'static str, &'static str); 1], Vec<u8>) {
    let mut buffer = Vec::new();
    let code = match TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            buffer.clear();
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (code, [("content-type", "text/plain; charset=utf-8")], buffer)
}

pub fn create_router(health: HealthRegistry, control: ControlHandle) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(health.clone())
        .merge(dashboard::router(control, health))
}

pub async fn serve(
    port: u16,
    health: HealthRegistry,
    control: ControlHandle,
) -> anyhow::Result<()> {
    let app = create_router(health, control);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Dashboard HTTP API
//!
//! Read endpoints serve the latest published snapshots. Write endpoints only
//! queue commands; the orchestrator applies them at its next IDLE boundary,
//! so every accepted command answers 202.

use crate::health::{HealthRegistry, HealthReport};
use crate::models::{Bssid, StatusSnapshot, TargetSummary};
use crate::orchestrator::{Command, ControlHandle, ModePreference};
use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Body returned by every command endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub accepted: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub bssid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TargetsQuery {
    pub limit: Option<usize>,
}

#[derive(Clone)]
struct DashboardState {
    control: ControlHandle,
    health: HealthRegistry,
}

impl FromRef<DashboardState> for ControlHandle {
    fn from_ref(state: &DashboardState) -> Self {
        state.control.clone()
    }
}

impl FromRef<DashboardState> for HealthRegistry {
    fn from_ref(state: &DashboardState) -> Self {
        state.health.clone()
    }
}

fn reply(
    status: StatusCode,
    accepted: bool,
    message: impl Into<String>,
) -> (StatusCode, Json<CommandResponse>) {
    (
        status,
        Json(CommandResponse {
            accepted,
            message: message.into(),
        }),
    )
}

fn dispatch(
    control: &ControlHandle,
    command: Command,
    message: String,
) -> (StatusCode, Json<CommandResponse>) {
    debug!(command = ?command, "Dashboard command");
    match control.send(command) {
        Ok(()) => reply(StatusCode::ACCEPTED, true, message),
        Err(e) => reply(StatusCode::SERVICE_UNAVAILABLE, false, e.to_string()),
    }
}

async fn status(State(control): State<ControlHandle>) -> Json<StatusSnapshot> {
    Json(control.status())
}

/// Component faults as the operator sees them; always 200, unlike `/healthz`
async fn health_report(State(health): State<HealthRegistry>) -> Json<HealthReport> {
    Json(health.report().await)
}

async fn targets(
    State(control): State<ControlHandle>,
    Query(query): Query<TargetsQuery>,
) -> Json<Vec<TargetSummary>> {
    let mut targets = control.targets();
    if let Some(limit) = query.limit {
        targets.truncate(limit);
    }
    Json(targets)
}

async fn override_target(
    State(control): State<ControlHandle>,
    Json(request): Json<OverrideRequest>,
) -> impl IntoResponse {
    let bssid: Bssid = match request.bssid.parse() {
        Ok(bssid) => bssid,
        Err(e) => return reply(StatusCode::BAD_REQUEST, false, format!("{}", e)),
    };
    info!(bssid = %bssid, "Target override requested");
    dispatch(
        &control,
        Command::Override(bssid),
        format!("{} will be attacked next cycle", bssid),
    )
}

async fn set_mode(
    State(control): State<ControlHandle>,
    Json(request): Json<ModeRequest>,
) -> impl IntoResponse {
    let preference: ModePreference = match request.mode.parse() {
        Ok(preference) => preference,
        Err(e) => return reply(StatusCode::BAD_REQUEST, false, e),
    };
    info!(preference = %preference, "Mode change requested");
    dispatch(
        &control,
        Command::ForceMode(preference),
        format!("mode preference set to {}", preference),
    )
}

async fn pause(State(control): State<ControlHandle>) -> impl IntoResponse {
    dispatch(&control, Command::Pause, "pausing at next idle boundary".to_string())
}

async fn resume(State(control): State<ControlHandle>) -> impl IntoResponse {
    dispatch(&control, Command::Resume, "resuming attack cycle".to_string())
}

async fn reset_learning(State(control): State<ControlHandle>) -> impl IntoResponse {
    info!("Learning reset requested");
    dispatch(
        &control,
        Command::ResetLearning,
        "learned history will be discarded at next idle boundary".to_string(),
    )
}

/// Create the dashboard router
pub fn router(control: ControlHandle, health: HealthRegistry) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/health", get(health_report))
        .route("/api/targets", get(targets))
        .route("/api/override", post(override_target))
        .route("/api/mode", post(set_mode))
        .route("/api/pause", post(pause))
        .route("/api/resume", post(resume))
        .route("/api/learning/reset", post(reset_learning))
        .with_state(DashboardState { control, health })
}

//! Operational endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::lifecycle::state::HostState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub state: String,
    pub application: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: &'static str,
    pub components: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// `UP` with 200 while running, `DOWN` with 503 otherwise.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let current = state.lifecycle.current();
    let (code, status) = if current == HostState::Running {
        (StatusCode::OK, "UP")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DOWN")
    };

    (
        code,
        Json(HealthStatus {
            status,
            state: current.to_string(),
            application: state.config.application.name.clone(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        }),
    )
}

pub async fn get_info(State(state): State<AppState>) -> Json<AppInfo> {
    Json(AppInfo {
        name: state.config.application.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        components: state.context.component_names().to_vec(),
    })
}

pub async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: "not found" }))
}

//! Liveness and diagnostics endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use rolemine_common::config::FailurePolicy;
use rolemine_common::models::WizardStep;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

/// GET /health body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub wizard: WizardHealth,
    pub backend: BackendHealth,
    /// Most recent backend or internal failure seen by a handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WizardHealth {
    pub session_id: Uuid,
    pub step: WizardStep,
    pub loading: bool,
}

#[derive(Debug, Serialize)]
pub struct BackendHealth {
    pub base_url: String,
    pub on_failure: FailurePolicy,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let controller = &state.controller;
    let wizard = controller.status().await;
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .try_into()
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        wizard: WizardHealth {
            session_id: wizard.session_id,
            step: wizard.step,
            loading: wizard.loading,
        },
        backend: BackendHealth {
            base_url: controller.backend_url().to_string(),
            on_failure: controller.settings().on_failure,
        },
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

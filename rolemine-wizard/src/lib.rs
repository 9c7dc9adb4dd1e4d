//! rolemine-wizard library interface
//!
//! Exposes the wizard pipeline (ingestion, summary, configuration, mining, results)
//! and the HTTP router for integration testing.

pub mod api;
pub mod cleaning;
pub mod client;
pub mod config_form;
pub mod error;
pub mod fallback;
pub mod ingest;
pub mod report;
pub mod results;
pub mod summary_view;
pub mod wizard;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use rolemine_common::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::wizard::WizardController;

/// Headroom for multipart framing on top of the file contents
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<WizardController>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(controller: WizardController) -> Self {
        let event_bus = controller.events().clone();
        Self {
            controller: Arc::new(controller),
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.controller.settings().max_file_size
        * ingest::REQUIRED_FILE_COUNT as u64
        + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .merge(api::wizard_routes())
        .route("/wizard/events", get(api::wizard_event_stream))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

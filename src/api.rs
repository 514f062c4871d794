use std::time::Instant;

use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::notify::SubscriberRegistry;
use crate::scheduler::{trigger_now, SharedJob, TriggerOutcome};

#[derive(Clone)]
pub struct AppState {
    pub job: SharedJob,
    pub subscribers: SubscriberRegistry,
    pub ai_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(job: SharedJob, subscribers: SubscriberRegistry, ai_enabled: bool) -> Self {
        Self {
            job,
            subscribers,
            ai_enabled,
            started_at: Instant::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/run", post(run_now))
        .fallback(not_found)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Trend Scout is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "ai": if state.ai_enabled { "enabled" } else { "disabled" },
        "subscribers": state.subscribers.len(),
    }))
}

/// Manual trigger. Runs inline and answers with the report.
async fn run_now(State(state): State<AppState>) -> Response {
    match trigger_now(&state.job).await {
        TriggerOutcome::Completed(Ok(report)) => {
            (StatusCode::ACCEPTED, Json(json!({ "status": "success", "report": report })))
                .into_response()
        }
        TriggerOutcome::Completed(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": e.to_string() })),
        )
            .into_response(),
        TriggerOutcome::Busy => (
            StatusCode::CONFLICT,
            Json(json!({ "status": "error", "message": "A run is already in progress" })),
        )
            .into_response(),
    }
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Route not found" })),
    )
}

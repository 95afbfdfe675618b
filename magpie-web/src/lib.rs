//! Web routes: health, job listing, and manual triggers.
//!
//! Inbound requests are unauthenticated; this listens on localhost unless
//! someone deliberately binds it wider.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use magpie_scheduler::Scheduler;

/// Shared state for the web server.
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Create the web router.
pub fn create_router(scheduler: Arc<Scheduler>) -> Router {
    let state = Arc::new(AppState { scheduler });

    Router::new()
        .route("/healthz", get(health))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/{name}/run", post(run_job))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.scheduler.descriptors().await)
}

/// Optional body for a manual trigger. `text` skips content fetching and
/// prompt generation entirely and publishes as-is.
#[derive(Debug, Default, Deserialize)]
struct TriggerBody {
    #[serde(default)]
    text: Option<String>,
}

async fn run_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Option<Json<TriggerBody>>,
) -> impl IntoResponse {
    let override_text = body.and_then(|Json(body)| body.text);

    match state.scheduler.trigger(&name, override_text).await {
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown job: {name}") })),
        ),
        Some(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "job": name, "outcome": "completed" })),
        ),
        Some(Err(err)) => {
            tracing::warn!(job = %name, error = %err, "manual trigger failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "job": name, "outcome": "failed", "error": err.to_string() })),
            )
        }
    }
}

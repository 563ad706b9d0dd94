//! HTTP surface: `POST /v1/jobs`, `GET /v1/jobs`, `GET /v1/jobs/{id}`,
//! `POST /v1/jobs/{id}/stop`, `GET /healthz`. Mirrors the override shape the
//! CLI also accepts, so the same JSON works from either surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::registry::StartError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobOverrides {
    pub concurrency: Option<usize>,
    pub max_downloads: Option<u64>,
    pub max_depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub start_url: String,
    #[serde(default)]
    pub overrides: JobOverrides,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/jobs", get(list_jobs).post(start_job))
        .route("/v1/jobs/{id}", get(job_detail))
        .route("/v1/jobs/{id}/stop", post(stop_job))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.list().await)
}

async fn job_detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    match state.registry.get(&id).await {
        Some(job) => (StatusCode::OK, Json(json!(job))).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "job not found" }))).into_response(),
    }
}

async fn start_job(State(state): State<Arc<AppState>>, Json(req): Json<StartJobRequest>) -> impl IntoResponse {
    let mut config = state.base_config.clone();
    if let Some(concurrency) = req.overrides.concurrency {
        config.concurrency = concurrency;
    }
    if req.overrides.max_downloads.is_some() {
        config.max_downloads = req.overrides.max_downloads;
    }
    if req.overrides.max_depth.is_some() {
        config.max_depth = req.overrides.max_depth;
    }

    match state.registry.start(req.start_url, config).await {
        Ok(job_id) => (StatusCode::ACCEPTED, Json(json!({ "id": job_id }))).into_response(),
        Err(StartError::AlreadyRunning) => {
            (StatusCode::CONFLICT, Json(json!({ "error": "a job is already running" }))).into_response()
        }
    }
}

async fn stop_job(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    if state.registry.stop(&id).await {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

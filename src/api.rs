// src/api.rs
//! JSON presentation surface over the orchestrator and the schedule view.

use std::sync::{Arc, PoisonError};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::fetcher::prompt::{TargetSource, PRIORITY_SOURCES};
use crate::orchestrator::{EmailOutcome, Orchestrator};
use crate::schedule::SharedScheduleView;
use crate::types::{BriefingData, Notification, RunStatus, Trigger};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub schedule: SharedScheduleView,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/status", get(status))
        .route("/api/briefing", get(briefing))
        .route("/api/run", post(run_now))
        .route("/api/email", post(email_now))
        .route("/api/sources", get(sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct StatusResp {
    status: RunStatus,
    trigger: Option<Trigger>,
    generation: u64,
    error: Option<String>,
    notification: Option<Notification>,
    has_briefing: bool,
    generated_at: Option<DateTime<Utc>>,
    next_run_in: Option<String>,
    ran_today: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResp> {
    let snap = state.orchestrator.snapshot();
    let view = state
        .schedule
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(StatusResp {
        status: snap.status,
        trigger: snap.trigger,
        generation: snap.generation,
        // The error banner only belongs to the Error state.
        error: snap.error.filter(|_| snap.status == RunStatus::Error),
        notification: snap.notification,
        has_briefing: snap.briefing.is_some(),
        generated_at: snap.briefing.as_ref().map(|b| b.timestamp()),
        next_run_in: view.countdown.map(|c| c.to_string()),
        ran_today: view.ran_today,
    })
}

async fn briefing(State(state): State<AppState>) -> Result<Json<BriefingData>, StatusCode> {
    state
        .orchestrator
        .current_briefing()
        .map(|b| Json(b.as_ref().clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(serde::Serialize)]
struct RunAccepted {
    generation: u64,
}

#[derive(serde::Serialize)]
struct ApiError {
    error: String,
}

async fn run_now(State(state): State<AppState>) -> Response {
    match state.orchestrator.begin_run(Trigger::Manual) {
        Ok(ticket) => {
            let orch = Arc::clone(&state.orchestrator);
            tokio::spawn(async move {
                orch.execute(ticket).await;
            });
            (
                StatusCode::ACCEPTED,
                Json(RunAccepted {
                    generation: ticket.generation(),
                }),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

#[derive(serde::Serialize)]
struct EmailResp {
    outcome: EmailOutcome,
}

async fn email_now(State(state): State<AppState>) -> Result<Json<EmailResp>, StatusCode> {
    state
        .orchestrator
        .email_current()
        .await
        .map(|outcome| Json(EmailResp { outcome }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn sources() -> Json<&'static [TargetSource]> {
    Json(PRIORITY_SOURCES)
}

//! Event submission and visibility-guarded reads.
//!
//! Submissions are stored Draft/Pending and a moderation job is queued;
//! the background worker applies the AI verdict. Edits reset moderation to
//! Pending and re-queue a review.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use eventa_core::models::{CreateEventRequest, Event};
use eventa_core::traits::{EventRepository, ModerationJobRepository};

use crate::error::ApiError;
use crate::state::AppState;

fn validate(req: &CreateEventRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "description must not be empty".to_string(),
        ));
    }
    if let Some(ends_at) = req.ends_at {
        if ends_at < req.starts_at {
            return Err(ApiError::BadRequest(
                "ends_at must not precede starts_at".to_string(),
            ));
        }
    }
    Ok(())
}

/// `POST /api/events`: submit an event for review.
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let id = state.db.events.insert(&req).await?;
    let job_id = state.db.jobs.queue(id).await?;

    info!(
        subsystem = "api",
        component = "events",
        op = "create",
        event_id = %id,
        job_queued = job_id.is_some(),
        "Event submitted for review"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "status": "pending_review" })),
    ))
}

/// `PUT /api/events/:id`: edit a submission. Resets moderation to
/// Pending and re-queues a review.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    state.db.events.update(id, &req).await?;
    let job_id = state.db.jobs.queue(id).await?;

    info!(
        subsystem = "api",
        component = "events",
        op = "update",
        event_id = %id,
        job_queued = job_id.is_some(),
        "Event edited, moderation reset to pending"
    );

    Ok(Json(serde_json::json!({ "id": id, "status": "pending_review" })))
}

/// `GET /api/events/:id`: public read. Only published and approved
/// events are visible.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    match state.db.events.get_public(id).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::NotFound(format!("Event not found: {}", id))),
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::applications::{ApplicationEntry, ApplicationLog, ApplicationStatus, NewApplication};
use crate::drafts::handlers::WorkspaceQuery;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

fn log_for(state: &AppState, query: &WorkspaceQuery) -> Result<ApplicationLog, AppError> {
    Ok(ApplicationLog::new(state.storage.clone(), query.validated()?))
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<ApplicationEntry>>, AppError> {
    Ok(Json(log_for(&state, &query)?.load().await))
}

/// POST /api/v1/applications
pub async fn handle_add_application(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<NewApplication>,
) -> Result<(StatusCode, Json<ApplicationEntry>), AppError> {
    if req.company.trim().is_empty() || req.role.trim().is_empty() {
        return Err(AppError::Validation(
            "company and role are required".to_string(),
        ));
    }
    let entry = log_for(&state, &query)?.add(req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/v1/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<ApplicationEntry>, AppError> {
    let entry = log_for(&state, &query)?
        .update_status(&id, req.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    Ok(Json(entry))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<StatusCode, AppError> {
    if !log_for(&state, &query)?.remove(&id).await? {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use crate::drafts::interchange::{export_as_file, import_into_history};
use crate::drafts::models::{Draft, DraftId, DraftInput};
use crate::drafts::store::DraftStore;
use crate::errors::AppError;
use crate::export::artifact::Artifact;
use crate::state::AppState;

const DEFAULT_WORKSPACE: &str = "default";
const MAX_WORKSPACE_LEN: usize = 64;

/// `?workspace=` selects an isolated pair of draft slots.
#[derive(Debug, Deserialize)]
pub struct WorkspaceQuery {
    #[serde(default)]
    pub workspace: Option<String>,
}

impl WorkspaceQuery {
    /// Letters, digits, `-` and `_` only, so the value can be embedded in storage keys.
    pub fn validated(&self) -> Result<&str, AppError> {
        let workspace = self
            .workspace
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .unwrap_or(DEFAULT_WORKSPACE);

        let valid = workspace.len() <= MAX_WORKSPACE_LEN
            && workspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::Validation(format!(
                "workspace must be 1-{MAX_WORKSPACE_LEN} characters of [A-Za-z0-9_-]"
            )));
        }
        Ok(workspace)
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub label: String,
}

fn store_for(state: &AppState, query: &WorkspaceQuery) -> Result<DraftStore, AppError> {
    Ok(DraftStore::new(state.storage.clone(), query.validated()?))
}

/// GET /api/v1/drafts/current
pub async fn handle_get_current(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Option<Draft>>, AppError> {
    let store = store_for(&state, &query)?;
    Ok(Json(store.load_current().await))
}

/// PUT /api/v1/drafts/current
pub async fn handle_save_current(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Draft>, AppError> {
    input
        .customisation
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let store = store_for(&state, &query)?;
    Ok(Json(store.save_current(input).await?))
}

/// GET /api/v1/drafts/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<Draft>>, AppError> {
    let store = store_for(&state, &query)?;
    Ok(Json(store.load_all_history().await))
}

/// POST /api/v1/drafts/history
pub async fn handle_save_to_history(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(draft): Json<Draft>,
) -> Result<Json<Vec<Draft>>, AppError> {
    let store = store_for(&state, &query)?;
    Ok(Json(store.save_to_history(draft).await?))
}

/// DELETE /api/v1/drafts/history/:id
pub async fn handle_delete_from_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<Draft>>, AppError> {
    let store = store_for(&state, &query)?;
    Ok(Json(store.delete_from_history(&DraftId::from(id)).await?))
}

/// PATCH /api/v1/drafts/history/:id
pub async fn handle_rename_in_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Vec<Draft>>, AppError> {
    let store = store_for(&state, &query)?;
    let history = store
        .rename_in_history(&DraftId::from(id), &req.label)
        .await?;
    Ok(Json(history))
}

/// GET /api/v1/drafts/history/:id/export
pub async fn handle_export_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Artifact, AppError> {
    let store = store_for(&state, &query)?;
    let draft = store
        .find_in_history(&DraftId::from(id.as_str()))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Draft {id} not found")))?;
    Ok(export_as_file(&draft)?)
}

/// POST /api/v1/drafts/import
pub async fn handle_import_draft(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    body: Bytes,
) -> Result<Json<Draft>, AppError> {
    let store = store_for(&state, &query)?;
    let draft = import_into_history(&store, &body[..]).await?;
    Ok(Json(draft))
}

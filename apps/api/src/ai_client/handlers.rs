use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::header,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ai_client::AtsResult;
use crate::drafts::handlers::WorkspaceQuery;
use crate::errors::AppError;
use crate::models::{hydrate, Document};
use crate::state::AppState;
use crate::upload::{extract_text, UploadedFile};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    #[serde(default, alias = "cvData", deserialize_with = "hydrate::document")]
    pub document: Document,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchRequest {
    #[serde(default, alias = "cvData", deserialize_with = "hydrate::document")]
    pub document: Document,
    #[serde(default, alias = "jobDescriptionText")]
    pub job_description: String,
}

impl JobMatchRequest {
    fn job_description(&self) -> Result<&str, AppError> {
        let text = self.job_description.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Paste a job description first".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    #[serde(default)]
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub body: String,
}

/// POST /api/v1/ai/polish
pub async fn handle_polish(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<DocumentRequest>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(state.ai.polish(query.validated()?, &req.document).await?))
}

/// POST /api/v1/ai/ats-score
pub async fn handle_ats_score(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<JobMatchRequest>,
) -> Result<Json<AtsResult>, AppError> {
    let result = state
        .ai
        .ats_score(query.validated()?, &req.document, req.job_description()?)
        .await?;
    info!(score = result.score, "ATS score computed");
    Ok(Json(result))
}

/// POST /api/v1/ai/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    Json(req): Json<JobMatchRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let body = state
        .ai
        .generate_cover_letter(
            query.validated()?,
            &req.document,
            req.job_description()?,
        )
        .await?;
    Ok(Json(CoverLetterResponse { body }))
}

/// POST /api/v1/ai/parse
///
/// Accepts either a multipart CV upload (`file` part) or JSON `{ "rawText": "..." }`.
pub async fn handle_parse(
    State(state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
    request: Request,
) -> Result<Json<Document>, AppError> {
    let workspace = query.validated()?;
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let raw_text = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        read_upload(multipart, state.config.max_upload_bytes).await?
    } else {
        let Json(req) = Json::<ParseRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        req.raw_text
    };

    if raw_text.trim().is_empty() {
        return Err(AppError::Validation("No CV text to parse".to_string()));
    }
    Ok(Json(state.ai.parse_raw_text(workspace, &raw_text).await?))
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Unreadable upload: {e}")))?;

        let file = UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        };
        return Ok(extract_text(file, max_bytes).await?);
    }
    Err(AppError::Validation("Missing 'file' part".to_string()))
}

use axum::{extract::Multipart, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::drafts::models::default_label;
use crate::errors::AppError;
use crate::export::artifact::Artifact;
use crate::export::capture::UploadedCapture;
use crate::export::{export_docx, export_pdf, ArtifactKind, DocxSource};
use crate::models::{hydrate, Customisation, Document, Letter};

const FALLBACK_LABEL: &str = "document";

/// The `meta` part of a PDF export upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfExportMeta {
    pub kind: ArtifactKind,
    #[serde(default)]
    pub label: Option<String>,
    /// CSS width of the captured element, used to sanity-check capture density.
    #[serde(default)]
    pub css_width_px: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocxExportRequest {
    pub kind: ArtifactKind,
    #[serde(default)]
    pub label: Option<String>,
    /// Rendered markup. When absent, blocks are built from `document` / `letter`.
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default, alias = "cvData", deserialize_with = "hydrate::document")]
    pub document: Document,
    #[serde(default, alias = "coverLetter", deserialize_with = "hydrate::letter")]
    pub letter: Letter,
    #[serde(default, deserialize_with = "hydrate::customisation")]
    pub customisation: Customisation,
}

/// POST /api/v1/export/pdf
///
/// Multipart: `meta` (JSON) and `capture` (PNG or JPEG raster at 2x density).
pub async fn handle_export_pdf(mut multipart: Multipart) -> Result<Artifact, AppError> {
    let mut meta: Option<PdfExportMeta> = None;
    let mut capture: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("meta") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable 'meta' part: {e}")))?;
                meta = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::Validation(format!("Invalid 'meta' JSON: {e}")))?,
                );
            }
            Some("capture") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable 'capture' part: {e}")))?;
                capture = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let meta = meta.ok_or_else(|| AppError::Validation("Missing 'meta' part".to_string()))?;
    let label = meta.label.as_deref().unwrap_or(FALLBACK_LABEL);
    let surface = UploadedCapture::new(capture, meta.css_width_px);

    let artifact = export_pdf(&surface, meta.kind, label, Utc::now().date_naive()).await?;
    Ok(artifact)
}

/// POST /api/v1/export/docx
pub async fn handle_export_docx(Json(req): Json<DocxExportRequest>) -> Result<Artifact, AppError> {
    let label = default_label(req.label.as_deref(), &req.document, FALLBACK_LABEL);
    let source = match req.html.as_deref() {
        Some(html) => DocxSource::Markup {
            html,
            selector: req.selector.as_deref(),
        },
        None => DocxSource::Model {
            document: &req.document,
            letter: &req.letter,
        },
    };

    let artifact = export_docx(
        source,
        req.kind,
        &label,
        &req.customisation.font_family,
        Utc::now().date_naive(),
    )?;
    Ok(artifact)
}

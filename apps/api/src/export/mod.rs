//! Export Orchestrator: turns the rendered document into a downloadable file.
//!
//! Two strategies. The PDF path rasterises through a `RenderSurface` and places that
//! one image onto A4 pages (shrunk onto a single page for the cover letter, sliced into
//! bands for the CV). The DOCX path writes structural blocks and lets the word processor
//! paginate. Both assemble the whole file in memory and return it only when complete.

pub mod artifact;
pub mod capture;
pub mod docx;
pub mod handlers;
pub mod markup;
pub mod paginate;
pub mod pdf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::export::artifact::{artifact_file_name, Artifact};
use crate::export::capture::{RenderSurface, CAPTURE_MULTIPLIER};
use crate::export::markup::{blocks_from_document, blocks_from_html, blocks_from_letter, select_root};
use crate::export::paginate::{plan_pages, PagePolicy};
use crate::layout::page::A4;
use crate::models::{Document, Letter};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the document is not currently rendered")]
    TargetNotFound,

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Could not assemble the file: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Cv,
    CoverLetter,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Cv => "cv",
            ArtifactKind::CoverLetter => "cover-letter",
        }
    }

    /// The letter is always one page; the CV flows onto as many as it needs.
    pub fn page_policy(&self) -> PagePolicy {
        match self {
            ArtifactKind::Cv => PagePolicy::Slice,
            ArtifactKind::CoverLetter => PagePolicy::FitToOnePage,
        }
    }
}

/// Captures the surface and assembles an image-based PDF.
pub async fn export_pdf(
    surface: &dyn RenderSurface,
    kind: ArtifactKind,
    label: &str,
    date: NaiveDate,
) -> Result<Artifact, ExportError> {
    let image = surface.capture(CAPTURE_MULTIPLIER).await?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::CaptureFailed(format!(
            "capture is {}x{} pixels",
            image.width(),
            image.height()
        )));
    }

    let placements = plan_pages(image.width(), image.height(), &A4, kind.page_policy());
    let page_count = placements.len();

    // JPEG encoding of a 2x A4 raster is CPU-bound; keep it off the async workers.
    let bytes = tokio::task::spawn_blocking(move || pdf::render_pdf(&image, &placements, &A4))
        .await
        .map_err(|e| ExportError::Encode(format!("PDF task failed: {e}")))??;

    let file_name = artifact_file_name(label, kind.as_str(), date, "pdf");
    info!(kind = kind.as_str(), pages = page_count, bytes = bytes.len(), file = %file_name, "Exported PDF");
    Ok(Artifact {
        file_name,
        content_type: "application/pdf",
        bytes,
    })
}

/// Where DOCX blocks come from.
pub enum DocxSource<'a> {
    /// Rendered markup, optionally narrowed to the element matching `selector`.
    Markup {
        html: &'a str,
        selector: Option<&'a str>,
    },
    Model {
        document: &'a Document,
        letter: &'a Letter,
    },
}

pub fn export_docx(
    source: DocxSource<'_>,
    kind: ArtifactKind,
    label: &str,
    font: &str,
    date: NaiveDate,
) -> Result<Artifact, ExportError> {
    let blocks = match source {
        DocxSource::Markup { html, selector } => {
            let root = match selector {
                Some(selector) => select_root(html, selector).ok_or(ExportError::TargetNotFound)?,
                None => html.to_string(),
            };
            blocks_from_html(&root)
        }
        DocxSource::Model { document, letter } => match kind {
            ArtifactKind::Cv => blocks_from_document(document),
            ArtifactKind::CoverLetter => blocks_from_letter(letter, document),
        },
    };
    if blocks.is_empty() {
        return Err(ExportError::TargetNotFound);
    }

    let bytes = docx::render_docx(&blocks, font)?;
    let file_name = artifact_file_name(label, kind.as_str(), date, "docx");
    info!(kind = kind.as_str(), blocks = blocks.len(), file = %file_name, "Exported DOCX");
    Ok(Artifact {
        file_name,
        content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        bytes,
    })
}

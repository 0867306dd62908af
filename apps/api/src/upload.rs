//! Text extraction from an uploaded CV, feeding the parse-raw-text AI action.

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("File is empty")]
    Empty,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Could not read text from the file: {0}")]
    Unreadable(String),
}

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text", "rtf"];

#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
enum FileKind {
    Pdf,
    Text,
}

impl UploadedFile {
    fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    fn kind(&self) -> Result<FileKind, UploadError> {
        if self.bytes.starts_with(b"%PDF")
            || self.content_type.as_deref() == Some("application/pdf")
            || self.extension().as_deref() == Some("pdf")
        {
            return Ok(FileKind::Pdf);
        }
        match self.extension() {
            Some(ext) if !TEXT_EXTENSIONS.contains(&ext.as_str()) => {
                Err(UploadError::UnsupportedType(format!(".{ext}")))
            }
            _ => Ok(FileKind::Text),
        }
    }
}

/// Returns the file's text. PDFs go through `pdf-extract`; everything else must be UTF-8.
pub async fn extract_text(file: UploadedFile, max_bytes: usize) -> Result<String, UploadError> {
    if file.bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: file.bytes.len(),
            limit: max_bytes,
        });
    }
    if file.bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let text = match file.kind()? {
        FileKind::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&file.bytes)
                .map_err(|e| UploadError::Unreadable(e.to_string()))
        })
        .await
        .map_err(|e| UploadError::Unreadable(format!("extraction task failed: {e}")))??,
        FileKind::Text => String::from_utf8(file.bytes)
            .map_err(|_| UploadError::Unreadable("file is not UTF-8 text".to_string()))?,
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(UploadError::Unreadable("no text found".to_string()));
    }
    debug!(chars = text.len(), "Extracted upload text");
    Ok(text)
}

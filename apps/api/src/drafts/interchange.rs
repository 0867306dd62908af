//! Draft file interchange: pretty-printed JSON out, hydrated drafts in.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use crate::drafts::models::{default_label, Draft, DraftId, IMPORTED_LABEL};
use crate::drafts::store::DraftStore;
use crate::export::artifact::{sanitize_label, Artifact};
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Invalid draft file: {0}")]
    InvalidFormat(String),

    #[error("Failed to read draft file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Serializes `draft` as an attachment named `{label}-{YYYY-MM-DD}.json`.
pub fn export_as_file(draft: &Draft) -> Result<Artifact, DraftError> {
    export_dated(draft, Utc::now().date_naive())
}

fn export_dated(draft: &Draft, date: NaiveDate) -> Result<Artifact, DraftError> {
    let bytes = serde_json::to_vec_pretty(draft)
        .map_err(|e| DraftError::InvalidFormat(e.to_string()))?;
    Ok(Artifact {
        file_name: format!(
            "{}-{}.json",
            sanitize_label(&draft.label, "draft"),
            date.format("%Y-%m-%d")
        ),
        content_type: "application/json",
        bytes,
    })
}

/// Reads a draft file to the end and hydrates it. See [`import_from_str`].
pub async fn import_from_file<R>(mut reader: R) -> Result<Draft, DraftError>
where
    R: AsyncRead + Unpin,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                DraftError::InvalidFormat("file is not UTF-8 text".to_string())
            }
            _ => DraftError::ReadFailed(e),
        })?;
    import_from_str(&text)
}

/// Hydrates a draft of any schema version. The result always gets a fresh id and
/// `savedAt`, so it never collides with an existing history entry.
pub fn import_from_str(text: &str) -> Result<Draft, DraftError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DraftError::InvalidFormat(e.to_string()))?;
    let stored = Draft::from_stored(&value)
        .ok_or_else(|| DraftError::InvalidFormat("expected a JSON object".to_string()))?;

    let mut draft = stored.draft;
    draft.id = DraftId::generate();
    draft.saved_at = Utc::now();
    draft.label = default_label(
        value.get("label").and_then(Value::as_str),
        &draft.document,
        IMPORTED_LABEL,
    );
    Ok(draft)
}

/// Imports a file and records it as the newest history snapshot.
pub async fn import_into_history<R>(store: &DraftStore, reader: R) -> Result<Draft, DraftError>
where
    R: AsyncRead + Unpin,
{
    let draft = import_from_file(reader).await?;
    store.save_to_history(draft.clone()).await?;
    info!(draft_id = %draft.id, label = %draft.label, "Imported draft into history");
    Ok(draft)
}

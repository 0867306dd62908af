use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::hydrate::{self, field};
use crate::models::{
    hydrate_customisation, hydrate_document, hydrate_letter, Customisation, Document, Letter,
};

/// Schema version written by this build. Older current-slot drafts are discarded on load.
pub const DRAFT_VERSION: u32 = 3;
/// Maximum number of snapshots kept in history.
pub const HISTORY_LIMIT: usize = 20;
pub const UNTITLED_LABEL: &str = "Untitled Draft";
pub const IMPORTED_LABEL: &str = "Imported Draft";

/// Opaque draft identity. Fresh ids are UUID v4 strings; ids from older data are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for DraftId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DraftId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted envelope: a named, timestamped, versioned snapshot of the editor state.
///
/// Field names on the wire match the browser storage format (`cvData`, `coverLetter`,
/// `jobDescription`, `version`). Deserializing always hydrates, so a `Draft` value is
/// complete and carries `DRAFT_VERSION`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: DraftId,
    pub label: String,
    #[serde(rename = "cvData")]
    pub document: Document,
    pub customisation: Customisation,
    #[serde(rename = "coverLetter")]
    pub letter: Letter,
    #[serde(rename = "jobDescription")]
    pub job_description: String,
    pub saved_at: DateTime<Utc>,
    #[serde(rename = "version")]
    pub schema_version: u32,
}

/// A hydrated draft plus the schema version it was stored under.
pub(crate) struct StoredDraft {
    pub draft: Draft,
    pub stored_version: u32,
}

impl Draft {
    /// Hydrates a stored JSON object of any schema version. Returns `None` only when the
    /// value is not an object at all.
    pub(crate) fn from_stored(value: &Value) -> Option<StoredDraft> {
        let object = value.as_object()?;
        let text = |names: &[&str]| non_blank(object, names);

        let document = hydrate_document(field(object, &["cvData", "document"]));
        let label = default_label(text(&["label"]), &document, UNTITLED_LABEL);
        let id = text(&["id"]).map(DraftId::from).unwrap_or_else(DraftId::generate);
        let saved_at = text(&["savedAt"])
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default();
        let stored_version = field(object, &["version", "schemaVersion"])
            .and_then(Value::as_u64)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(0);

        let draft = Draft {
            id,
            label,
            customisation: hydrate_customisation(object.get("customisation")),
            letter: hydrate_letter(field(object, &["coverLetter", "letter"])),
            job_description: text(&["jobDescription", "jobDescriptionText"])
                .unwrap_or_default()
                .to_string(),
            document,
            saved_at,
            schema_version: DRAFT_VERSION,
        };

        Some(StoredDraft {
            draft,
            stored_version,
        })
    }
}

impl<'de> Deserialize<'de> for Draft {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Draft::from_stored(&value)
            .map(|stored| stored.draft)
            .ok_or_else(|| de::Error::custom("draft must be a JSON object"))
    }
}

/// Editor state handed to `save_current`: a draft without its stamped fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    #[serde(default)]
    pub id: Option<DraftId>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(
        default,
        rename = "cvData",
        alias = "document",
        deserialize_with = "hydrate::document"
    )]
    pub document: Document,
    #[serde(default, deserialize_with = "hydrate::customisation")]
    pub customisation: Customisation,
    #[serde(
        default,
        rename = "coverLetter",
        alias = "letter",
        deserialize_with = "hydrate::letter"
    )]
    pub letter: Letter,
    #[serde(
        default,
        rename = "jobDescription",
        alias = "jobDescriptionText",
        deserialize_with = "hydrate::text"
    )]
    pub job_description: String,
}

impl From<Draft> for DraftInput {
    fn from(draft: Draft) -> Self {
        Self {
            id: Some(draft.id),
            label: Some(draft.label),
            document: draft.document,
            customisation: draft.customisation,
            letter: draft.letter,
            job_description: draft.job_description,
        }
    }
}

fn non_blank<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    field(object, names)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Explicit label, else the profile name, else `fallback`.
pub fn default_label(label: Option<&str>, document: &Document, fallback: &str) -> String {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .or_else(|| Some(document.personal.full_name.trim()).filter(|n| !n.is_empty()))
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_stored_rejects_non_objects() {
        assert!(Draft::from_stored(&json!([])).is_none());
        assert!(Draft::from_stored(&json!("draft")).is_none());
        assert!(Draft::from_stored(&json!(null)).is_none());
    }

    #[test]
    fn test_from_stored_hydrates_old_shape() {
        let stored = Draft::from_stored(&json!({
            "id": "legacy-1",
            "cvData": { "personal": { "fullName": "Grace Hopper" },
                        "education": [{ "id": "e1", "institution": "Yale" }] },
            "savedAt": "2024-03-01T10:00:00Z",
            "version": 2
        }))
        .unwrap();
        assert_eq!(stored.stored_version, 2);
        let draft = stored.draft;
        assert_eq!(draft.id.as_str(), "legacy-1");
        assert_eq!(draft.label, "Grace Hopper");
        assert_eq!(draft.schema_version, DRAFT_VERSION);
        assert_eq!(draft.document.education[0].grade, "");
        assert_eq!(draft.customisation, Customisation::default());
        assert_eq!(draft.saved_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_from_stored_accepts_spec_field_names() {
        let stored = Draft::from_stored(&json!({
            "document": { "personal": { "title": "Engineer" } },
            "letter": { "body": "Hi" },
            "jobDescriptionText": "Rust role",
            "schemaVersion": 3
        }))
        .unwrap();
        assert_eq!(stored.stored_version, 3);
        assert_eq!(stored.draft.document.personal.title, "Engineer");
        assert_eq!(stored.draft.letter.body, "Hi");
        assert_eq!(stored.draft.job_description, "Rust role");
        assert_eq!(stored.draft.label, UNTITLED_LABEL);
        assert!(!stored.draft.id.is_blank());
    }

    #[test]
    fn test_missing_version_reads_as_zero() {
        let stored = Draft::from_stored(&json!({ "id": "x" })).unwrap();
        assert_eq!(stored.stored_version, 0);
    }

    #[test]
    fn test_default_label_order() {
        let mut doc = Document::default();
        assert_eq!(default_label(None, &doc, UNTITLED_LABEL), UNTITLED_LABEL);
        doc.personal.full_name = "Ada".to_string();
        assert_eq!(default_label(Some("  "), &doc, UNTITLED_LABEL), "Ada");
        assert_eq!(default_label(Some("My CV"), &doc, UNTITLED_LABEL), "My CV");
    }

    #[test]
    fn test_draft_serializes_storage_field_names() {
        let stored = Draft::from_stored(&json!({ "id": "d1", "version": 3 })).unwrap();
        let value = serde_json::to_value(&stored.draft).unwrap();
        assert_eq!(value["id"], "d1");
        assert_eq!(value["version"], DRAFT_VERSION);
        assert!(value.get("cvData").is_some());
        assert!(value.get("coverLetter").is_some());
        assert!(value.get("jobDescription").is_some());
        assert!(value.get("savedAt").is_some());
    }

    #[test]
    fn test_draft_input_hydrates_partial_body() {
        let input: DraftInput = serde_json::from_value(json!({
            "cvData": { "education": [{ "id": "e1" }] },
            "customisation": { "template": "modern" }
        }))
        .unwrap();
        assert!(input.id.is_none());
        assert_eq!(input.document.education[0].grade, "");
        assert_eq!(input.customisation.template, crate::models::TemplateName::Modern);
        assert_eq!(input.letter.sign_off, "Yours sincerely,");
        assert_eq!(input.job_description, "");
    }
}

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

/// A finished file, fully assembled in memory before anything is handed to the client.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl IntoResponse for Artifact {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Makes a label safe to use as a file stem. Path separators, quotes and control
/// characters become `_`; a blank label becomes `fallback`.
pub fn sanitize_label(label: &str, fallback: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// `{label}-{artifact}-{YYYY-MM-DD}.{extension}`
pub fn artifact_file_name(label: &str, artifact: &str, date: NaiveDate, extension: &str) -> String {
    format!(
        "{}-{artifact}-{}.{extension}",
        sanitize_label(label, "document"),
        date.format("%Y-%m-%d")
    )
}

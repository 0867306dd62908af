//! AI collaborator boundary, the only module that talks to the AI gateway.
//!
//! Requests go to an OpenAI-compatible chat completions endpoint. Failures are
//! classified (rate limit, quota, unavailable, malformed) and surfaced as-is; nothing
//! here retries. Each action type admits one request at a time through `InFlightGuard`.

pub mod guard;
pub mod handlers;
pub mod prompts;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ai_client::guard::InFlightGuard;
use crate::models::{hydrate_document, Document};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAction {
    Polish,
    AtsScore,
    GenerateCoverLetter,
    ParseRawText,
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AiAction::Polish => "polish",
            AiAction::AtsScore => "ats-score",
            AiAction::GenerateCoverLetter => "generate-cover-letter",
            AiAction::ParseRawText => "parse-raw-text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Rate limit exceeded. Please try again shortly.")]
    RateLimited,

    #[error("AI credits exhausted. Please top up your plan.")]
    QuotaExhausted,

    #[error("AI service error (status {status})")]
    ServiceUnavailable { status: u16 },

    #[error("Failed to parse AI response: {0}")]
    MalformedResponse(String),

    #[error("A {0} request is already in progress")]
    AlreadyInFlight(AiAction),

    #[error("AI gateway unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result of the ats-score action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsResult {
    pub score: u8,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct AiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    in_flight: InFlightGuard,
}

impl AiClient {
    pub fn new(api_key: String, endpoint: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
            model,
            in_flight: InFlightGuard::default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Rewrites CV text. Ids, ordering, and anything the model drops are restored
    /// from the input.
    pub async fn polish(
        &self,
        workspace: &str,
        document: &Document,
    ) -> Result<Document, AiError> {
        let _permit = self.in_flight.acquire(workspace, AiAction::Polish)?;
        let user = serde_json::to_string(document)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        let value: Value = self
            .complete_json(AiAction::Polish, &prompts::polish_system(), &user)
            .await?;
        Ok(merge_polished(document, &value))
    }

    pub async fn ats_score(
        &self,
        workspace: &str,
        document: &Document,
        job_description: &str,
    ) -> Result<AtsResult, AiError> {
        let _permit = self.in_flight.acquire(workspace, AiAction::AtsScore)?;
        let user = json!({ "cv": document, "jobDescription": job_description }).to_string();
        let value: Value = self
            .complete_json(AiAction::AtsScore, &prompts::ats_system(), &user)
            .await?;
        parse_ats(&value)
    }

    /// Returns the letter body only; greeting and sign-off belong to the Letter.
    pub async fn generate_cover_letter(
        &self,
        workspace: &str,
        document: &Document,
        job_description: &str,
    ) -> Result<String, AiError> {
        let _permit = self.in_flight.acquire(workspace, AiAction::GenerateCoverLetter)?;
        let user = json!({ "cv": document, "jobDescription": job_description }).to_string();
        let value: Value = self
            .complete_json(
                AiAction::GenerateCoverLetter,
                &prompts::cover_letter_system(),
                &user,
            )
            .await?;
        value
            .get("body")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AiError::MalformedResponse("missing 'body'".to_string()))
    }

    /// Structures free CV text into a hydrated Document.
    pub async fn parse_raw_text(
        &self,
        workspace: &str,
        raw_text: &str,
    ) -> Result<Document, AiError> {
        let _permit = self.in_flight.acquire(workspace, AiAction::ParseRawText)?;
        let value: Value = self
            .complete_json(AiAction::ParseRawText, &prompts::parse_system(), raw_text)
            .await?;
        if !value.is_object() {
            return Err(AiError::MalformedResponse("expected a JSON object".to_string()));
        }
        Ok(hydrate_document(Some(&value)))
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        action: AiAction,
        system: &str,
        user: &str,
    ) -> Result<T, AiError> {
        let content = self.complete(action, system, user).await?;
        let cleaned = strip_json_fences(&content);
        serde_json::from_str(cleaned).map_err(|e| {
            warn!(%action, "Unparseable AI response: {e}");
            AiError::MalformedResponse(e.to_string())
        })
    }

    /// One chat completion round trip, no retries.
    async fn complete(&self, action: AiAction, system: &str, user: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%action, status = status.as_u16(), "AI gateway error: {body}");
            return Err(classify_status(status));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!(%action, chars = content.len(), "AI call succeeded");
        Ok(content)
    }
}

fn classify_status(status: StatusCode) -> AiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AiError::QuotaExhausted,
        other => AiError::ServiceUnavailable {
            status: other.as_u16(),
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(stripped.trim()),
        None => text,
    }
}

/// The score is clamped to 0..=100 whatever the model returns.
fn parse_ats(value: &Value) -> Result<AtsResult, AiError> {
    let score = value
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| AiError::MalformedResponse("missing numeric 'score'".to_string()))?;
    let strings = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };
    Ok(AtsResult {
        score: score.round().clamp(0.0, 100.0) as u8,
        matched_keywords: strings("matchedKeywords"),
        missing_keywords: strings("missingKeywords"),
        suggestions: strings("suggestions"),
    })
}

/// Hydrates the polished value, then keeps the original entry ids and photo: the model
/// may rewrite text but not identity.
fn merge_polished(original: &Document, polished: &Value) -> Document {
    let mut merged = hydrate_document(Some(polished));
    merged.personal.photo = original.personal.photo.clone();

    if merged.experiences.len() == original.experiences.len() {
        for (new, old) in merged.experiences.iter_mut().zip(&original.experiences) {
            new.id = old.id.clone();
        }
    } else {
        warn!("Polished CV changed the number of experiences; keeping the original list");
        merged.experiences = original.experiences.clone();
    }

    if merged.education.len() == original.education.len() {
        for (new, old) in merged.education.iter_mut().zip(&original.education) {
            new.id = old.id.clone();
            new.in_progress = old.in_progress;
            new.normalize_in_progress();
        }
    } else {
        warn!("Polished CV changed the number of education entries; keeping the original list");
        merged.education = original.education.clone();
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Education, Experience};

    fn make_document() -> Document {
        let mut doc = Document::default();
        doc.personal.full_name = "Ada".to_string();
        doc.personal.photo = "data:image/png;base64,AAAA".to_string();
        doc.experiences.push(Experience {
            description: "did stuff".to_string(),
            ..Experience::new()
        });
        let mut edu = Education::new();
        edu.set_in_progress(true);
        doc.education.push(edu);
        doc
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            AiError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::PAYMENT_REQUIRED),
            AiError::QuotaExhausted
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            AiError::ServiceUnavailable { status: 502 }
        ));
    }

    #[test]
    fn test_ats_score_is_clamped() {
        let high = parse_ats(&json!({ "score": 140, "matchedKeywords": ["Rust"] })).unwrap();
        assert_eq!(high.score, 100);
        assert_eq!(high.matched_keywords, vec!["Rust"]);
        assert!(high.suggestions.is_empty());

        let low = parse_ats(&json!({ "score": -3.2 })).unwrap();
        assert_eq!(low.score, 0);

        assert!(matches!(
            parse_ats(&json!({ "score": "high" })),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_polish_keeps_identity_fields() {
        let original = make_document();
        let polished = json!({
            "personal": { "fullName": "Ada Lovelace", "photo": "" },
            "experiences": [{ "id": "model-made-up", "description": "Delivered results" }],
            "education": [{ "id": "x", "inProgress": false, "endDate": "2020" }]
        });
        let merged = merge_polished(&original, &polished);

        assert_eq!(merged.personal.full_name, "Ada Lovelace");
        assert_eq!(merged.personal.photo, original.personal.photo);
        assert_eq!(merged.experiences[0].id, original.experiences[0].id);
        assert_eq!(merged.experiences[0].description, "Delivered results");
        assert_eq!(merged.education[0].id, original.education[0].id);
        assert_eq!(merged.education[0].end_date, "In Progress");
    }

    #[test]
    fn test_polish_that_drops_entries_keeps_originals() {
        let original = make_document();
        let merged = merge_polished(&original, &json!({ "experiences": [] }));
        assert_eq!(merged.experiences, original.experiences);
    }

    #[tokio::test]
    async fn test_in_flight_action_fails_fast() {
        let client = AiClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:9/unused".to_string(),
            DEFAULT_MODEL.to_string(),
        );
        let _permit = client.in_flight.acquire("alice", AiAction::AtsScore).unwrap();
        let result = client
            .ats_score("alice", &Document::default(), "Rust role")
            .await;
        assert!(matches!(
            result,
            Err(AiError::AlreadyInFlight(AiAction::AtsScore))
        ));

        // Another workspace gets through the guard and fails on the dead gateway instead.
        let other = client
            .ats_score("bob", &Document::default(), "Rust role")
            .await;
        assert!(matches!(other, Err(AiError::Http(_))));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(AiAction::GenerateCoverLetter.to_string(), "generate-cover-letter");
        assert_eq!(
            serde_json::to_value(AiAction::ParseRawText).unwrap(),
            "parse-raw-text"
        );
    }
}

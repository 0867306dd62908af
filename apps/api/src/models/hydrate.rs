//! Hydration: merges partial or older-shaped JSON over current defaults.
//!
//! Every persisted or imported value passes through here before the rest of the
//! service sees it. Hydration never fails: a missing key takes its default, a `null`
//! or wrong-typed key is ignored, and a malformed sequence entry is dropped.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::customisation::Customisation;
use crate::models::document::{Document, Education, Experience, PersonalInfo, SkillSet};
use crate::models::letter::{Letter, Signature};

// ────────────────────────────────────────────────────────────────────────────
// Generic shallow merge
// ────────────────────────────────────────────────────────────────────────────

/// Shallow-merges `raw` over `T::default()`, key by key.
///
/// A key is only accepted if the merged object still deserializes as `T`, so a
/// single bad field cannot poison the others.
pub fn merge_over_defaults<T>(raw: Option<&Value>) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    let defaults = T::default();
    let Some(Value::Object(partial)) = raw else {
        return defaults;
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
        return defaults;
    };

    for (key, value) in partial {
        if value.is_null() {
            continue;
        }
        let previous = merged.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            match previous {
                Some(previous) => merged.insert(key.clone(), previous),
                None => merged.remove(key),
            };
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
}

// ────────────────────────────────────────────────────────────────────────────
// Document / Customisation / Letter
// ────────────────────────────────────────────────────────────────────────────

/// Produces a complete `Document` from any partial JSON value.
///
/// Education entries written before `grade` existed come back with `grade == ""`.
/// Entry ids that are missing, empty, or duplicated get a fresh id.
pub fn hydrate_document(raw: Option<&Value>) -> Document {
    let Some(Value::Object(raw)) = raw else {
        return Document::default();
    };

    let personal: PersonalInfo = merge_over_defaults(raw.get("personal"));

    let mut experiences: Vec<Experience> = entries(raw.get("experiences"))
        .map(|entry| merge_over_defaults(Some(entry)))
        .collect();
    let mut education: Vec<Education> = entries(raw.get("education"))
        .map(|entry| merge_over_defaults::<Education>(Some(entry)))
        .map(|mut edu| {
            edu.normalize_in_progress();
            edu
        })
        .collect();

    let skills = raw
        .get("skills")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<SkillSet>()
        })
        .unwrap_or_default();

    reassign_ids(experiences.iter_mut().map(|e| &mut e.id));
    reassign_ids(education.iter_mut().map(|e| &mut e.id));

    Document {
        personal,
        experiences,
        education,
        skills,
    }
}

pub fn hydrate_customisation(raw: Option<&Value>) -> Customisation {
    merge_over_defaults(raw)
}

/// Produces a complete `Letter`. A legacy `signatureImage` string becomes an image
/// signature when no structured `signature` is present.
pub fn hydrate_letter(raw: Option<&Value>) -> Letter {
    let mut letter: Letter = merge_over_defaults(raw);

    let has_structured = raw
        .and_then(|r| r.get("signature"))
        .is_some_and(|s| !s.is_null());
    if !has_structured {
        if let Some(data_url) = raw
            .and_then(|r| r.get("signatureImage"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            letter.signature = Signature::Image {
                data_url: data_url.to_string(),
            };
        }
    }
    letter
}

// ────────────────────────────────────────────────────────────────────────────
// serde adapters for `#[serde(deserialize_with = "...")]`
// ────────────────────────────────────────────────────────────────────────────

pub fn document<'de, D>(deserializer: D) -> Result<Document, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(hydrate_document(raw.as_ref()))
}

pub fn customisation<'de, D>(deserializer: D) -> Result<Customisation, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(hydrate_customisation(raw.as_ref()))
}

pub fn letter<'de, D>(deserializer: D) -> Result<Letter, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(hydrate_letter(raw.as_ref()))
}

/// Accepts any scalar as text; `null` and containers become an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn entries(raw: Option<&Value>) -> impl Iterator<Item = &Value> {
    raw.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|entry| entry.is_object())
}

fn reassign_ids<'a>(ids: impl Iterator<Item = &'a mut String>) {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if id.is_empty() || !seen.insert(id.clone()) {
            *id = crate::models::document::new_entry_id();
            seen.insert(id.clone());
        }
    }
}

/// Convenience for callers holding a JSON object map rather than a `Value`.
pub fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customisation::TemplateName;
    use crate::models::document::IN_PROGRESS;
    use serde_json::json;

    #[test]
    fn test_hydrate_document_from_empty_object() {
        let doc = hydrate_document(Some(&json!({})));
        assert_eq!(doc, Document::default());
        assert_eq!(doc.personal.full_name, "");
        assert!(doc.experiences.is_empty());
        assert!(doc.education.is_empty());
        assert!(doc.skills.is_empty());
    }

    #[test]
    fn test_hydrate_document_from_none_and_non_object() {
        assert_eq!(hydrate_document(None), Document::default());
        assert_eq!(hydrate_document(Some(&json!([1, 2]))), Document::default());
        assert_eq!(hydrate_document(Some(&json!("cv"))), Document::default());
    }

    #[test]
    fn test_hydrate_document_fills_partial_personal() {
        let doc = hydrate_document(Some(&json!({
            "personal": { "fullName": "Ada Lovelace", "email": null }
        })));
        assert_eq!(doc.personal.full_name, "Ada Lovelace");
        assert_eq!(doc.personal.email, "");
        assert_eq!(doc.personal.linkedin, "");
    }

    #[test]
    fn test_hydrate_education_without_grade_gets_empty_grade() {
        let doc = hydrate_document(Some(&json!({
            "education": [
                { "id": "e1", "institution": "UCL", "degree": "BSc", "field": "CS",
                  "startDate": "2015", "endDate": "2018" },
                { "id": "e2", "institution": "KCL", "degree": "MSc", "field": "AI",
                  "grade": "First Class", "startDate": "2018", "endDate": "2019" }
            ]
        })));
        assert_eq!(doc.education.len(), 2);
        assert_eq!(doc.education[0].grade, "");
        assert_eq!(doc.education[1].grade, "First Class");
        assert_eq!(doc.education[1].institution, "KCL");
    }

    #[test]
    fn test_hydrate_in_progress_entry_forces_sentinel() {
        let doc = hydrate_document(Some(&json!({
            "education": [{ "id": "e1", "inProgress": true, "endDate": "2030" }]
        })));
        assert_eq!(doc.education[0].end_date, IN_PROGRESS);
    }

    #[test]
    fn test_hydrate_wrong_typed_field_is_ignored() {
        let doc = hydrate_document(Some(&json!({
            "personal": { "fullName": 42, "title": "Engineer" },
            "experiences": "not a list",
            "skills": ["Rust", 7, "Rust", "rust"]
        })));
        assert_eq!(doc.personal.title, "Engineer");
        assert!(doc.experiences.is_empty());
        let skills: Vec<&str> = doc.skills.iter().collect();
        assert_eq!(skills, vec!["Rust", "rust"]);
    }

    #[test]
    fn test_hydrate_assigns_missing_and_duplicate_ids() {
        let doc = hydrate_document(Some(&json!({
            "experiences": [
                { "id": "x", "company": "A" },
                { "id": "x", "company": "B" },
                { "company": "C" }
            ]
        })));
        assert_eq!(doc.experiences.len(), 3);
        assert_eq!(doc.experiences[0].id, "x");
        assert_ne!(doc.experiences[1].id, "x");
        assert!(!doc.experiences[2].id.is_empty());
        assert_ne!(doc.experiences[1].id, doc.experiences[2].id);
        assert_eq!(doc.experiences[1].company, "B");
    }

    #[test]
    fn test_hydrate_customisation_shallow_merge() {
        let c = hydrate_customisation(Some(&json!({
            "template": "executive",
            "fontSize": "huge",
            "primaryColour": "210 50% 40%"
        })));
        assert_eq!(c.template, TemplateName::Executive);
        assert_eq!(c.font_size, 11.0);
        assert_eq!(c.primary_colour.as_str(), "210 50% 40%");
        assert_eq!(c.font_family, "Inter");
    }

    #[test]
    fn test_hydrate_customisation_unknown_template_keeps_default() {
        let c = hydrate_customisation(Some(&json!({ "template": "brutalist" })));
        assert_eq!(c.template, TemplateName::Minimal);
    }

    #[test]
    fn test_hydrate_letter_defaults() {
        let letter = hydrate_letter(Some(&json!({})));
        assert_eq!(letter.recipient_name, "Dear Hiring Manager,");
        assert_eq!(letter.sign_off, "Yours sincerely,");
        assert_eq!(letter.signature, Signature::None);
        assert_eq!(letter.signature_size, 30.0);
    }

    #[test]
    fn test_hydrate_letter_legacy_signature_image() {
        let letter = hydrate_letter(Some(&json!({
            "body": "Hello",
            "signatureImage": "data:image/png;base64,AAAA"
        })));
        assert_eq!(letter.body, "Hello");
        assert_eq!(
            letter.signature,
            Signature::Image {
                data_url: "data:image/png;base64,AAAA".to_string()
            }
        );
    }

    #[test]
    fn test_hydrate_letter_structured_signature_wins() {
        let letter = hydrate_letter(Some(&json!({
            "signatureImage": "data:image/png;base64,AAAA",
            "signature": { "kind": "typed", "text": "Ada", "font": "Dancing Script" }
        })));
        assert_eq!(
            letter.signature,
            Signature::Typed {
                text: "Ada".to_string(),
                font: "Dancing Script".to_string()
            }
        );
    }

    #[test]
    fn test_text_adapter_accepts_scalars() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "text")]
            value: String,
        }
        let p: Wrapper = serde_json::from_value(json!({ "value": 12 })).unwrap();
        assert_eq!(p.value, "12");
        let p: Wrapper = serde_json::from_value(json!({ "value": null })).unwrap();
        assert_eq!(p.value, "");
    }
}

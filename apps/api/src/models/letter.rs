use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::document::Document;

/// Advisory word limit for the letter body. Shown as a warning, never enforced on save.
pub const LETTER_WORD_LIMIT: usize = 500;

/// How the letter is signed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Signature {
    #[default]
    None,
    /// Uploaded or drawn signature/seal as a data URL.
    #[serde(rename_all = "camelCase")]
    Image { data_url: String },
    /// Typed name rendered in a script font.
    Typed { text: String, font: String },
}

/// The cover letter that travels with a CV draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Letter {
    pub recipient_name: String,
    /// ISO date, date only.
    pub date: String,
    pub job_title: String,
    pub body: String,
    pub sign_off: String,
    pub signature: Signature,
    /// Signature box size in mm.
    pub signature_size: f32,
    pub signature_offset_x: f32,
    pub signature_offset_y: f32,
    pub override_full_name: String,
    pub override_email: String,
    pub override_phone: String,
    pub override_linkedin: String,
    pub override_github: String,
    pub override_location: String,
}

impl Default for Letter {
    fn default() -> Self {
        Self {
            recipient_name: "Dear Hiring Manager,".to_string(),
            date: Utc::now().date_naive().to_string(),
            job_title: String::new(),
            body: String::new(),
            sign_off: "Yours sincerely,".to_string(),
            signature: Signature::None,
            signature_size: 30.0,
            signature_offset_x: 0.0,
            signature_offset_y: 0.0,
            override_full_name: String::new(),
            override_email: String::new(),
            override_phone: String::new(),
            override_linkedin: String::new(),
            override_github: String::new(),
            override_location: String::new(),
        }
    }
}

/// Sender details printed on the letter after overrides are applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterContact {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub location: String,
}

impl Letter {
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    pub fn exceeds_word_limit(&self) -> bool {
        self.word_count() > LETTER_WORD_LIMIT
    }

    /// Non-empty overrides win; everything else comes from the CV profile.
    pub fn effective_contact(&self, document: &Document) -> LetterContact {
        let pick = |over: &str, base: &str| {
            if over.trim().is_empty() {
                base.to_string()
            } else {
                over.to_string()
            }
        };
        let p = &document.personal;
        LetterContact {
            full_name: pick(&self.override_full_name, &p.full_name),
            email: pick(&self.override_email, &p.email),
            phone: pick(&self.override_phone, &p.phone),
            linkedin: pick(&self.override_linkedin, &p.linkedin),
            github: pick(&self.override_github, &p.github),
            location: pick(&self.override_location, &p.location),
        }
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Sentinel stored in `Education::end_date` while a course is still running.
pub const IN_PROGRESS: &str = "In Progress";

/// Fresh opaque identifier for an experience or education entry.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// The CV content: profile, work history, education, and skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub personal: PersonalInfo,
    /// Display order is significant.
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: SkillSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub linkedin: String,
    pub github: String,
    /// Profile photo as a data URL.
    pub photo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

impl Experience {
    pub fn new() -> Self {
        Self {
            id: new_entry_id(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub grade: String,
    pub start_date: String,
    pub end_date: String,
    pub in_progress: bool,
}

impl Education {
    pub fn new() -> Self {
        Self {
            id: new_entry_id(),
            ..Self::default()
        }
    }

    /// Toggles the in-progress flag, keeping `end_date` consistent with it.
    ///
    /// Turning the flag off only clears `end_date` when it still holds the sentinel.
    pub fn set_in_progress(&mut self, in_progress: bool) {
        self.in_progress = in_progress;
        if in_progress {
            self.end_date = IN_PROGRESS.to_string();
        } else if self.end_date == IN_PROGRESS {
            self.end_date.clear();
        }
    }

    pub(crate) fn normalize_in_progress(&mut self) {
        if self.in_progress {
            self.end_date = IN_PROGRESS.to_string();
        }
    }
}

impl Document {
    /// Appends a blank experience and returns its id.
    pub fn add_experience(&mut self) -> String {
        let entry = Experience::new();
        let id = entry.id.clone();
        self.experiences.push(entry);
        id
    }

    pub fn remove_experience(&mut self, id: &str) -> bool {
        let before = self.experiences.len();
        self.experiences.retain(|e| e.id != id);
        self.experiences.len() != before
    }

    pub fn experience_mut(&mut self, id: &str) -> Option<&mut Experience> {
        self.experiences.iter_mut().find(|e| e.id == id)
    }

    /// Appends a blank education entry and returns its id.
    pub fn add_education(&mut self) -> String {
        let entry = Education::new();
        let id = entry.id.clone();
        self.education.push(entry);
        id
    }

    pub fn remove_education(&mut self, id: &str) -> bool {
        let before = self.education.len();
        self.education.retain(|e| e.id != id);
        self.education.len() != before
    }

    pub fn education_mut(&mut self, id: &str) -> Option<&mut Education> {
        self.education.iter_mut().find(|e| e.id == id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SkillSet
// ────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered, case-sensitive set of skill names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet(Vec<String>);

impl SkillSet {
    /// Adds a skill; duplicates are silently rejected. Returns whether it was added.
    pub fn insert(&mut self, skill: impl Into<String>) -> bool {
        let skill = skill.into();
        if self.0.contains(&skill) {
            return false;
        }
        self.0.push(skill);
        true
    }

    pub fn remove(&mut self, skill: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|s| s != skill);
        self.0.len() != before
    }

    /// Replaces the set from the editor's comma-separated input.
    pub fn set_from_csv(&mut self, input: &str) {
        self.0.clear();
        for skill in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            self.insert(skill);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for SkillSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = SkillSet::default();
        for skill in iter {
            set.insert(skill);
        }
        set
    }
}

impl Serialize for SkillSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SkillSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Application log: a per-workspace list of job applications and where each one stands.

pub mod handlers;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::{StorageError, StoragePort};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Sent,
    Interview,
    Rejected,
    Offered,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEntry {
    pub id: String,
    pub company: String,
    pub role: String,
    /// ISO date, date only.
    pub date_sent: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub notes: String,
}

pub struct ApplicationLog {
    storage: Arc<dyn StoragePort>,
    key: String,
}

impl ApplicationLog {
    pub fn new(storage: Arc<dyn StoragePort>, workspace: &str) -> Self {
        Self {
            storage,
            key: format!("resumeforge:{workspace}:applications"),
        }
    }

    /// Most recent first. Absent or corrupt data reads as an empty log; malformed
    /// entries are skipped.
    pub async fn load(&self) -> Vec<ApplicationEntry> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, "Application log read failed: {e}");
                return Vec::new();
            }
        };
        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = %self.key, "Ignoring corrupt application log: {e}");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    /// Records a new application sent today with status `sent`.
    pub async fn add(&self, new: NewApplication) -> Result<ApplicationEntry, StorageError> {
        let entry = ApplicationEntry {
            id: Uuid::new_v4().to_string(),
            company: new.company.trim().to_string(),
            role: new.role.trim().to_string(),
            date_sent: Utc::now().date_naive().to_string(),
            status: ApplicationStatus::Sent,
            notes: new.notes,
        };
        let mut entries = self.load().await;
        entries.insert(0, entry.clone());
        self.persist(&entries).await?;
        debug!(application_id = %entry.id, "Recorded application");
        Ok(entry)
    }

    /// Returns the updated entry, or `None` if no entry has `id`.
    pub async fn update_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationEntry>, StorageError> {
        let mut entries = self.load().await;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        entry.status = status;
        let updated = entry.clone();
        self.persist(&entries).await?;
        Ok(Some(updated))
    }

    /// Returns whether an entry was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let mut entries = self.load().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.persist(&entries).await?;
        Ok(true)
    }

    async fn persist(&self, entries: &[ApplicationEntry]) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries).unwrap_or_default();
        self.storage.set(&self.key, &json).await
    }
}

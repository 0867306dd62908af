//! Draft Store: one "current" draft plus a bounded, most-recent-first history.
//!
//! Two slots live behind the storage port, namespaced per workspace. Reads fail soft:
//! an absent, unreadable, or corrupt slot looks exactly like a first run. Writes
//! propagate storage errors.
//!
//! The current slot and history treat old schema versions differently. A stale current
//! draft is discarded, while history entries are hydrated into the current shape.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::drafts::models::{
    default_label, Draft, DraftId, DraftInput, DRAFT_VERSION, HISTORY_LIMIT, UNTITLED_LABEL,
};
use crate::storage::{StorageError, StoragePort};

pub struct DraftStore {
    storage: Arc<dyn StoragePort>,
    current_key: String,
    history_key: String,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn StoragePort>, workspace: &str) -> Self {
        Self {
            storage,
            current_key: format!("cleancv:{workspace}:draft"),
            history_key: format!("cleancv:{workspace}:drafts"),
        }
    }

    // ── Current slot ─────────────────────────────────────────────────────────

    /// Reads the current draft. Stale schema versions are removed and read as absent.
    pub async fn load_current(&self) -> Option<Draft> {
        let raw = self.read_slot(&self.current_key).await?;
        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %self.current_key, "Ignoring corrupt current draft: {e}");
                return None;
            }
        };
        let Some(stored) = Draft::from_stored(&value) else {
            warn!(key = %self.current_key, "Ignoring current draft that is not an object");
            return None;
        };

        if stored.stored_version < DRAFT_VERSION {
            info!(
                stored_version = stored.stored_version,
                current_version = DRAFT_VERSION,
                "Discarding stale current draft"
            );
            if let Err(e) = self.storage.remove(&self.current_key).await {
                warn!(key = %self.current_key, "Failed to remove stale current draft: {e}");
            }
            return None;
        }

        Some(stored.draft)
    }

    /// Completes `input` (id, label, `savedAt`, version) and overwrites the current slot.
    pub async fn save_current(&self, input: DraftInput) -> Result<Draft, StorageError> {
        let id = input
            .id
            .filter(|id| !id.is_blank())
            .unwrap_or_else(DraftId::generate);
        let label = default_label(input.label.as_deref(), &input.document, UNTITLED_LABEL);

        let draft = Draft {
            id,
            label,
            document: input.document,
            customisation: input.customisation,
            letter: input.letter,
            job_description: input.job_description,
            saved_at: Utc::now(),
            schema_version: DRAFT_VERSION,
        };

        self.write_json(&self.current_key, &draft).await?;
        debug!(draft_id = %draft.id, "Saved current draft");
        Ok(draft)
    }

    // ── History ──────────────────────────────────────────────────────────────

    /// All history snapshots, most recent first, each hydrated to the current shape.
    pub async fn load_all_history(&self) -> Vec<Draft> {
        let Some(raw) = self.read_slot(&self.history_key).await else {
            return Vec::new();
        };
        let entries: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = %self.history_key, "Ignoring corrupt draft history: {e}");
                return Vec::new();
            }
        };

        entries
            .iter()
            .filter_map(|entry| {
                let stored = Draft::from_stored(entry);
                if stored.is_none() {
                    warn!(key = %self.history_key, "Skipping history entry that is not an object");
                }
                stored.map(|s| s.draft)
            })
            .collect()
    }

    pub async fn find_in_history(&self, id: &DraftId) -> Option<Draft> {
        self.load_all_history()
            .await
            .into_iter()
            .find(|d| &d.id == id)
    }

    /// Replaces the entry with the same id in place, or prepends a new one, then keeps
    /// the `HISTORY_LIMIT` most recent entries.
    pub async fn save_to_history(&self, draft: Draft) -> Result<Vec<Draft>, StorageError> {
        let mut history = self.load_all_history().await;

        match history.iter().position(|d| d.id == draft.id) {
            Some(idx) => history[idx] = draft,
            None => history.insert(0, draft),
        }
        if history.len() > HISTORY_LIMIT {
            let dropped = history.len() - HISTORY_LIMIT;
            history.truncate(HISTORY_LIMIT);
            debug!(dropped, "Trimmed draft history");
        }

        self.write_json(&self.history_key, &history).await?;
        Ok(history)
    }

    /// Removes every entry with `id`. Unknown ids leave the history untouched.
    pub async fn delete_from_history(&self, id: &DraftId) -> Result<Vec<Draft>, StorageError> {
        let mut history = self.load_all_history().await;
        let before = history.len();
        history.retain(|d| &d.id != id);

        if history.len() != before {
            self.write_json(&self.history_key, &history).await?;
        }
        Ok(history)
    }

    /// Relabels the matching entry in place. A blank label falls back to the profile name.
    pub async fn rename_in_history(
        &self,
        id: &DraftId,
        new_label: &str,
    ) -> Result<Vec<Draft>, StorageError> {
        let mut history = self.load_all_history().await;
        let Some(entry) = history.iter_mut().find(|d| &d.id == id) else {
            return Ok(history);
        };

        entry.label = default_label(Some(new_label), &entry.document, UNTITLED_LABEL);
        self.write_json(&self.history_key, &history).await?;
        Ok(history)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    async fn read_slot(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, "Draft storage read failed, treating slot as empty: {e}");
                None
            }
        }
    }

    async fn write_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        // Serializing plain data structures cannot fail.
        let json = serde_json::to_string(value).unwrap_or_default();
        self.storage.set(key, &json).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hydrate_document;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn make_storage() -> Arc<dyn StoragePort> {
        Arc::new(MemoryStorage::default())
    }

    fn make_store(storage: &Arc<dyn StoragePort>) -> DraftStore {
        DraftStore::new(storage.clone(), "test")
    }

    fn make_input(name: &str) -> DraftInput {
        let mut input = DraftInput::default();
        input.document.personal.full_name = name.to_string();
        input
    }

    async fn make_saved(store: &DraftStore, name: &str) -> Draft {
        store.save_current(make_input(name)).await.unwrap()
    }

    // ── current slot ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_current_absent_on_first_run() {
        let storage = make_storage();
        assert!(make_store(&storage).load_current().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_current_round_trip() {
        let storage = make_storage();
        let store = make_store(&storage);
        let mut input = make_input("Ada Lovelace");
        input.document.add_experience();
        input.job_description = "Analytical engines".to_string();

        let saved = store.save_current(input).await.unwrap();
        let loaded = store.load_current().await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.schema_version, DRAFT_VERSION);
        assert_eq!(loaded.document.experiences.len(), 1);
    }

    #[tokio::test]
    async fn test_save_current_assigns_id_and_label() {
        let storage = make_storage();
        let store = make_store(&storage);

        let named = store.save_current(make_input("Grace Hopper")).await.unwrap();
        assert!(!named.id.is_blank());
        assert_eq!(named.label, "Grace Hopper");

        let unnamed = store.save_current(DraftInput::default()).await.unwrap();
        assert_eq!(unnamed.label, UNTITLED_LABEL);
        assert_ne!(unnamed.id, named.id);
    }

    #[tokio::test]
    async fn test_save_current_keeps_given_id() {
        let storage = make_storage();
        let store = make_store(&storage);
        let first = make_saved(&store, "Ada").await;

        let mut again = make_input("Ada");
        again.id = Some(first.id.clone());
        again.label = Some("Renamed".to_string());
        let second = store.save_current(again).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(store.load_current().await.unwrap().label, "Renamed");
    }

    #[tokio::test]
    async fn test_stale_current_slot_is_discarded() {
        let storage = make_storage();
        let store = make_store(&storage);
        let stale = json!({ "id": "old", "label": "Old", "cvData": {}, "version": 2 });
        storage
            .set("cleancv:test:draft", &stale.to_string())
            .await
            .unwrap();

        assert!(store.load_current().await.is_none());
        assert_eq!(storage.get("cleancv:test:draft").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unversioned_current_slot_is_discarded() {
        let storage = make_storage();
        let store = make_store(&storage);
        storage
            .set("cleancv:test:draft", r#"{"id":"x","cvData":{}}"#)
            .await
            .unwrap();
        assert!(store.load_current().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_current_slot_reads_as_absent() {
        let storage = make_storage();
        let store = make_store(&storage);
        storage.set("cleancv:test:draft", "{not json").await.unwrap();
        assert!(store.load_current().await.is_none());
    }

    #[tokio::test]
    async fn test_current_slot_hydrates_missing_fields() {
        let storage = make_storage();
        let store = make_store(&storage);
        let stored = json!({
            "id": "d1",
            "cvData": { "education": [{ "id": "e1", "degree": "BA" }] },
            "savedAt": "2025-01-01T00:00:00Z",
            "version": 3
        });
        storage
            .set("cleancv:test:draft", &stored.to_string())
            .await
            .unwrap();

        let draft = store.load_current().await.unwrap();
        assert_eq!(draft.label, UNTITLED_LABEL);
        assert_eq!(draft.document.education[0].grade, "");
        assert_eq!(draft.letter.recipient_name, "Dear Hiring Manager,");
    }

    // ── history ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_history_empty_and_corrupt_read_as_empty() {
        let storage = make_storage();
        let store = make_store(&storage);
        assert!(store.load_all_history().await.is_empty());

        storage.set("cleancv:test:drafts", "[{").await.unwrap();
        assert!(store.load_all_history().await.is_empty());

        storage.set("cleancv:test:drafts", r#"{"a":1}"#).await.unwrap();
        assert!(store.load_all_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_migrates_old_entries() {
        let storage = make_storage();
        let store = make_store(&storage);
        let old = json!([{ "id": "h1", "label": "Old CV", "cvData": {
            "education": [{ "id": "e1" }] }, "version": 1 }]);
        storage
            .set("cleancv:test:drafts", &old.to_string())
            .await
            .unwrap();

        let history = store.load_all_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].label, "Old CV");
        assert_eq!(history[0].schema_version, DRAFT_VERSION);
        assert_eq!(history[0].document.education[0].grade, "");
    }

    #[tokio::test]
    async fn test_save_to_history_prepends_new_entries() {
        let storage = make_storage();
        let store = make_store(&storage);
        let a = make_saved(&store, "A").await;
        let b = make_saved(&store, "B").await;

        store.save_to_history(a.clone()).await.unwrap();
        let history = store.save_to_history(b.clone()).await.unwrap();
        assert_eq!(history[0].id, b.id);
        assert_eq!(history[1].id, a.id);
        assert_eq!(store.load_all_history().await, history);
    }

    #[tokio::test]
    async fn test_history_is_bounded_to_twenty() {
        let storage = make_storage();
        let store = make_store(&storage);
        let mut first = None;
        for i in 0..21 {
            let draft = make_saved(&store, &format!("Draft {i}")).await;
            if i == 0 {
                first = Some(draft.id.clone());
            }
            store.save_to_history(draft).await.unwrap();
        }

        let history = store.load_all_history().await;
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].label, "Draft 20");
        assert!(history.iter().all(|d| Some(&d.id) != first.as_ref()));
    }

    #[tokio::test]
    async fn test_save_to_history_replaces_in_place() {
        let storage = make_storage();
        let store = make_store(&storage);
        let a = make_saved(&store, "A").await;
        let b = make_saved(&store, "B").await;
        store.save_to_history(a.clone()).await.unwrap();
        store.save_to_history(b.clone()).await.unwrap();

        let mut updated = a.clone();
        updated.document.personal.title = "Countess".to_string();
        let history = store.save_to_history(updated).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|d| d.id == a.id).count(), 1);
        assert_eq!(history[1].id, a.id);
        assert_eq!(history[1].document.personal.title, "Countess");
    }

    #[tokio::test]
    async fn test_history_entries_are_snapshots() {
        let storage = make_storage();
        let store = make_store(&storage);
        let mut draft = make_saved(&store, "A").await;
        store.save_to_history(draft.clone()).await.unwrap();

        draft.document.personal.title = "edited after snapshot".to_string();
        let history = store.load_all_history().await;
        assert_eq!(history[0].document.personal.title, "");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let storage = make_storage();
        let store = make_store(&storage);
        let a = make_saved(&store, "A").await;
        store.save_to_history(a.clone()).await.unwrap();

        let history = store
            .delete_from_history(&DraftId::from("missing"))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, a.id);
    }

    #[tokio::test]
    async fn test_rename_unknown_id_is_noop() {
        let storage = make_storage();
        let store = make_store(&storage);
        let a = make_saved(&store, "A").await;
        store.save_to_history(a).await.unwrap();

        let history = store
            .rename_in_history(&DraftId::from("missing"), "New")
            .await
            .unwrap();
        assert_eq!(history[0].label, "A");
    }

    #[tokio::test]
    async fn test_workspaces_are_isolated() {
        let storage = make_storage();
        let one = DraftStore::new(storage.clone(), "one");
        let two = DraftStore::new(storage.clone(), "two");
        let draft = one.save_current(make_input("One")).await.unwrap();
        one.save_to_history(draft).await.unwrap();

        assert!(two.load_current().await.is_none());
        assert!(two.load_all_history().await.is_empty());
    }

    // ── end to end ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_run_edit_save_rename_delete() {
        let storage = make_storage();
        let store = make_store(&storage);
        assert!(store.load_current().await.is_none());

        let mut document = hydrate_document(Some(&json!({})));
        assert!(document.experiences.is_empty());
        document.add_experience();

        let input = DraftInput {
            document,
            ..DraftInput::default()
        };
        let saved = store.save_current(input).await.unwrap();
        let current = store.load_current().await.unwrap();
        assert_eq!(current.document.experiences.len(), 1);
        assert_eq!(current.schema_version, DRAFT_VERSION);

        store.save_to_history(current.clone()).await.unwrap();
        let history = store.load_all_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, saved.id);

        store.rename_in_history(&saved.id, "My CV").await.unwrap();
        assert_eq!(store.load_all_history().await[0].label, "My CV");

        store.delete_from_history(&saved.id).await.unwrap();
        assert!(store.load_all_history().await.is_empty());
    }
}

use super::backend::StorageBackend;
use super::{
    best_score_key, capsule_key, known_key, legacy_progress_key, DataStore, DoctorReport,
    CAPSULE_KEY_PREFIX, INDEX_KEY,
};
use crate::error::{ClassroomError, Result};
use crate::model::{Capsule, CapsuleId, IndexEntry};
use crate::normalize::{self, normalize};
use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

pub struct CapsuleStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> CapsuleStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Parsed index. Unreadable JSON counts as an empty index; entries without an
    /// id are skipped, and only the first entry per id is kept.
    fn load_index(&self) -> Result<Vec<IndexEntry>> {
        let Some(raw) = self.backend.get_item(INDEX_KEY)? else {
            return Ok(Vec::new());
        };
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                warn!("capsule index is unreadable, treating it as empty");
                return Ok(Vec::new());
            }
        };

        let mut seen = HashSet::new();
        Ok(items
            .iter()
            .filter_map(normalize::index_entry)
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect())
    }

    fn save_index(&self, index: &[IndexEntry]) -> Result<()> {
        let raw = serde_json::to_string(index)?;
        self.backend.set_item(INDEX_KEY, &raw)
    }

    /// Raw document for `key`, or None when absent or not a JSON object.
    fn read_document(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if value.is_object() => Ok(Some(value)),
            _ => {
                warn!("{} does not hold a readable capsule", key);
                Ok(None)
            }
        }
    }

    fn merge_index_entry(&self, capsule: &Capsule) -> Result<()> {
        let mut index = self.load_index()?;
        match index.iter_mut().find(|entry| entry.id == capsule.id) {
            Some(entry) => entry.merge_from(capsule),
            None => index.push(capsule.index_entry()),
        }
        self.save_index(&index)
    }

    /// Best-effort restore of a key to its previous value after a failed pair write.
    fn restore(&self, key: &str, previous: Option<&str>) {
        let outcome = match previous {
            Some(value) => self.backend.set_item(key, value),
            None => self.backend.remove_item(key),
        };
        if let Err(e) = outcome {
            warn!("could not roll back {}: {}", key, e);
        }
    }
}

impl<B: StorageBackend> DataStore for CapsuleStore<B> {
    fn get_capsule(&self, id: &CapsuleId) -> Result<Capsule> {
        let raw = self
            .read_document(&capsule_key(id))?
            .ok_or_else(|| ClassroomError::NotFound(id.clone()))?;

        let mut capsule = normalize(&raw);
        // The key is authoritative over whatever id the document embeds.
        capsule.id = id.clone();
        Ok(capsule)
    }

    fn put_capsule(&mut self, capsule: &Capsule) -> Result<()> {
        if capsule.meta.title.trim().is_empty() {
            return Err(ClassroomError::InvalidFormat("Title is required".to_string()));
        }

        let key = capsule_key(&capsule.id);
        let previous = self.backend.get_item(&key)?;
        let doc = serde_json::to_string(capsule)?;

        // 1. Document
        self.backend.set_item(&key, &doc)?;

        // 2. Index, undoing the document write if this fails
        if let Err(e) = self.merge_index_entry(capsule) {
            self.restore(&key, previous.as_deref());
            return Err(e);
        }

        debug!("saved capsule {}", capsule.id);
        Ok(())
    }

    fn delete_capsule(&mut self, id: &CapsuleId) -> Result<()> {
        let key = capsule_key(id);
        // An id the backend cannot store has no document or records, only maybe an entry
        let storable = self.backend.accepts_key(&key);
        let previous = if storable {
            self.backend.get_item(&key)?
        } else {
            None
        };

        // 1. Document
        if previous.is_some() {
            self.backend.remove_item(&key)?;
        }

        // 2. Index, restoring the document if this fails
        let mut index = self.load_index()?;
        let before = index.len();
        index.retain(|entry| &entry.id != id);
        if index.len() != before {
            if let Err(e) = self.save_index(&index) {
                if previous.is_some() {
                    self.restore(&key, previous.as_deref());
                }
                return Err(e);
            }
        }

        // 3. Auxiliary records
        if storable {
            self.backend.remove_item(&known_key(id))?;
            self.backend.remove_item(&best_score_key(id))?;
            self.backend.remove_item(&legacy_progress_key(id))?;
        }

        debug!("deleted capsule {}", id);
        Ok(())
    }

    fn list_index(&self) -> Result<Vec<IndexEntry>> {
        self.load_index()
    }

    fn update_index_entry(
        &mut self,
        id: &CapsuleId,
        update: &mut dyn FnMut(&mut IndexEntry),
    ) -> Result<bool> {
        let mut index = self.load_index()?;
        let Some(entry) = index.iter_mut().find(|entry| &entry.id == id) else {
            return Ok(false);
        };
        update(entry);
        self.save_index(&index)?;
        Ok(true)
    }

    fn load_known_set(&self, id: &CapsuleId) -> Result<BTreeSet<usize>> {
        let key = known_key(id);
        let Some(raw) = self.backend.get_item(&key)? else {
            return Ok(BTreeSet::new());
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(items) => Ok(items
                .iter()
                .filter_map(Value::as_u64)
                .map(|n| n as usize)
                .collect()),
            Err(_) => {
                warn!("{} is unreadable, treating it as empty", key);
                Ok(BTreeSet::new())
            }
        }
    }

    fn save_known_set(&mut self, id: &CapsuleId, known: &BTreeSet<usize>) -> Result<()> {
        let raw = serde_json::to_string(known)?;
        self.backend.set_item(&known_key(id), &raw)
    }

    fn load_best_score(&self, id: &CapsuleId) -> Result<Option<u8>> {
        let key = best_score_key(id);
        let Some(raw) = self.backend.get_item(&key)? else {
            return Ok(None);
        };
        let score = serde_json::from_str::<Value>(&raw)
            .ok()
            .as_ref()
            .and_then(normalize::percent);
        if score.is_none() {
            warn!("{} is unreadable, ignoring it", key);
        }
        Ok(score)
    }

    fn save_best_score(&mut self, id: &CapsuleId, score: u8) -> Result<()> {
        self.backend
            .set_item(&best_score_key(id), &score.min(100).to_string())
    }

    fn doctor(&mut self) -> Result<DoctorReport> {
        let mut report = DoctorReport::default();
        let mut index = self.load_index()?;
        let mut changes = false;

        // 1. Readable documents by id; unreadable ones stay where they are
        let mut documents = Vec::new();
        for key in self.backend.keys()? {
            let Some(suffix) = key.strip_prefix(CAPSULE_KEY_PREFIX) else {
                continue;
            };
            match self.read_document(&key)? {
                Some(_) => documents.push(CapsuleId::from(suffix)),
                None => report.unreadable_documents.push(key),
            }
        }

        // 2. Entries without a document
        let before = index.len();
        index.retain(|entry| documents.contains(&entry.id));
        if index.len() != before {
            report.removed_entries = before - index.len();
            changes = true;
        }

        // 3. Documents without an entry
        for id in documents {
            if index.iter().any(|entry| entry.id == id) {
                continue;
            }
            let capsule = self.get_capsule(&id)?;
            let mut entry = capsule.index_entry();
            entry.best_score = self.load_best_score(&id)?;
            let known = self.load_known_set(&id)?;
            if !known.is_empty() {
                entry.known_cards = Some(known.len());
            }
            index.push(entry);
            report.recovered_documents += 1;
            changes = true;
        }

        if changes {
            self.save_index(&index)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flashcard, Level, Meta, QuizQuestion};
    use crate::store::mem_backend::MemBackend;
    use chrono::Utc;
    use serde_json::json;

    fn make_store() -> CapsuleStore<MemBackend> {
        CapsuleStore::with_backend(MemBackend::new())
    }

    fn capsule(title: &str) -> Capsule {
        let mut capsule = Capsule::new(Meta {
            title: title.to_string(),
            subject: "General".to_string(),
            level: Level::Intermediate,
            description: String::new(),
        });
        capsule.notes = vec!["first note".into()];
        capsule.flashcards = vec![Flashcard::new("front", "back")];
        capsule.quiz = vec![QuizQuestion::new(
            "question",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            2,
            "because",
        )];
        capsule
    }

    // --- Basic CRUD Tests ---

    #[test]
    fn test_put_and_get_round_trip() {
        let mut store = make_store();
        let c = capsule("Round Trip");
        store.put_capsule(&c).unwrap();

        let fetched = store.get_capsule(&c.id).unwrap();
        assert_eq!(fetched, c);
    }

    #[test]
    fn test_put_appends_index_in_insertion_order() {
        let mut store = make_store();
        let titles = ["Zebra", "Apple", "Mango"];
        for title in titles {
            store.put_capsule(&capsule(title)).unwrap();
        }

        let index = store.list_index().unwrap();
        let listed: Vec<&str> = index.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(listed, titles);
    }

    #[test]
    fn test_put_updates_entry_in_place_and_carries_progress() {
        let mut store = make_store();
        let first = capsule("First");
        let mut second = capsule("Second");
        store.put_capsule(&first).unwrap();
        store.put_capsule(&second).unwrap();

        store
            .update_index_entry(&second.id, &mut |entry| {
                entry.best_score = Some(90);
                entry.known_cards = Some(1);
            })
            .unwrap();

        second.meta.title = "Second, renamed".into();
        second.touch();
        store.put_capsule(&second).unwrap();

        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[1].title, "Second, renamed");
        assert_eq!(index[1].best_score, Some(90));
        assert_eq!(index[1].known_cards, Some(1));
        assert_eq!(index[1].updated_at, second.updated_at);
    }

    #[test]
    fn test_put_refuses_blank_title() {
        let mut store = make_store();
        let result = store.put_capsule(&capsule("   "));
        assert!(matches!(result, Err(ClassroomError::InvalidFormat(_))));
        assert!(store.list_index().unwrap().is_empty());
        assert!(store.backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = make_store();
        let id = CapsuleId::from("nope");
        match store.get_capsule(&id) {
            Err(ClassroomError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_get_corrupt_document_is_not_found() {
        let store = make_store();
        let id = CapsuleId::from("7");
        store
            .backend
            .set_item(&capsule_key(&id), "{ not json")
            .unwrap();
        assert!(matches!(
            store.get_capsule(&id),
            Err(ClassroomError::NotFound(_))
        ));

        store.backend.set_item(&capsule_key(&id), "[1, 2]").unwrap();
        assert!(matches!(
            store.get_capsule(&id),
            Err(ClassroomError::NotFound(_))
        ));
    }

    #[test]
    fn test_get_normalizes_legacy_documents() {
        let store = make_store();
        let id = CapsuleId::from("1700000000000");
        let legacy = json!({
            "id": 1700000000000u64,
            "meta": { "title": "Legacy" },
            "quiz": [{ "q": "?", "options": ["x", "y"], "answer": 1 }]
        });
        store
            .backend
            .set_item(&capsule_key(&id), &legacy.to_string())
            .unwrap();

        let capsule = store.get_capsule(&id).unwrap();
        assert_eq!(capsule.id, id);
        assert_eq!(capsule.quiz[0].choices.len(), 4);
        assert_eq!(capsule.quiz[0].correct, 1);
    }

    #[test]
    fn test_delete_removes_everything() {
        let mut store = make_store();
        let c = capsule("To Delete");
        store.put_capsule(&c).unwrap();
        store
            .save_known_set(&c.id, &BTreeSet::from([0]))
            .unwrap();
        store.save_best_score(&c.id, 80).unwrap();
        store
            .backend
            .set_item(&legacy_progress_key(&c.id), "{}")
            .unwrap();

        store.delete_capsule(&c.id).unwrap();

        assert!(matches!(
            store.get_capsule(&c.id),
            Err(ClassroomError::NotFound(_))
        ));
        assert!(store.list_index().unwrap().is_empty());
        assert_eq!(store.backend.keys().unwrap(), vec![INDEX_KEY]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = make_store();
        let keep = capsule("Keep");
        store.put_capsule(&keep).unwrap();

        store.delete_capsule(&CapsuleId::from("ghost")).unwrap();
        store.delete_capsule(&keep.id).unwrap();
        store.delete_capsule(&keep.id).unwrap();
        assert!(store.list_index().unwrap().is_empty());
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = make_store();
        assert!(store.list_index().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_index_reads_as_empty() {
        let store = make_store();
        store.backend.set_item(INDEX_KEY, "{{{").unwrap();
        assert!(store.list_index().unwrap().is_empty());
    }

    #[test]
    fn test_index_duplicates_are_collapsed() {
        let store = make_store();
        store
            .backend
            .set_item(
                INDEX_KEY,
                &json!([{ "id": 1, "title": "a" }, { "id": "1", "title": "b" }, { "title": "x" }])
                    .to_string(),
            )
            .unwrap();
        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "a");
    }

    // --- Atomic Pair Tests ---

    #[test]
    fn test_failed_index_write_rolls_back_new_document() {
        let mut store = make_store();
        store.backend.set_failing_key(Some(INDEX_KEY));

        let c = capsule("Doomed");
        let result = store.put_capsule(&c);
        assert!(result.unwrap_err().is_storage_failure());
        assert_eq!(store.backend.get_item(&capsule_key(&c.id)).unwrap(), None);
    }

    #[test]
    fn test_failed_index_write_restores_previous_document() {
        let mut store = make_store();
        let mut c = capsule("Original");
        store.put_capsule(&c).unwrap();

        store.backend.set_failing_key(Some(INDEX_KEY));
        c.meta.title = "Changed".into();
        assert!(store.put_capsule(&c).is_err());

        store.backend.set_failing_key(None);
        assert_eq!(store.get_capsule(&c.id).unwrap().meta.title, "Original");
    }

    #[test]
    fn test_failed_index_write_keeps_document_on_delete() {
        let mut store = make_store();
        let c = capsule("Survivor");
        store.put_capsule(&c).unwrap();

        store.backend.set_failing_key(Some(INDEX_KEY));
        assert!(store.delete_capsule(&c.id).is_err());

        store.backend.set_failing_key(None);
        assert!(store.get_capsule(&c.id).is_ok());
        assert_eq!(store.list_index().unwrap().len(), 1);
    }

    #[test]
    fn test_save_fails_on_write_error() {
        let mut store = make_store();
        store.backend.set_simulate_write_error(true);
        assert!(store.put_capsule(&capsule("Nope")).is_err());
    }

    // --- Auxiliary Record Tests ---

    #[test]
    fn test_known_set_round_trip_and_corruption() {
        let mut store = make_store();
        let id = CapsuleId::from("k");
        assert!(store.load_known_set(&id).unwrap().is_empty());

        store
            .save_known_set(&id, &BTreeSet::from([3, 0, 2]))
            .unwrap();
        assert_eq!(
            store.load_known_set(&id).unwrap(),
            BTreeSet::from([0, 2, 3])
        );

        store.backend.set_item(&known_key(&id), "oops").unwrap();
        assert!(store.load_known_set(&id).unwrap().is_empty());
    }

    #[test]
    fn test_best_score_reads_legacy_text() {
        let mut store = make_store();
        let id = CapsuleId::from("b");
        assert_eq!(store.load_best_score(&id).unwrap(), None);

        store.save_best_score(&id, 70).unwrap();
        assert_eq!(store.load_best_score(&id).unwrap(), Some(70));

        store.backend.set_item(&best_score_key(&id), "\"55\"").unwrap();
        assert_eq!(store.load_best_score(&id).unwrap(), Some(55));

        store.backend.set_item(&best_score_key(&id), "NaN").unwrap();
        assert_eq!(store.load_best_score(&id).unwrap(), None);
    }

    // --- Import / Export Tests ---

    #[test]
    fn test_import_assigns_fresh_id_and_normalizes() {
        let mut store = make_store();
        let raw = json!({
            "id": "foreign",
            "schema": "pocket-classroom/v1",
            "meta": { "title": "", "subject": "Maths" },
            "flashcards": [{ "front": "1+1", "back": "2", "known": true }],
            "quiz": [{ "question": "2+2", "choices": ["4"], "correct": "0" }],
            "progress": { "total": 1, "correct": 1, "knownCards": 1, "lastScore": 100 },
            "updatedAt": "2001-01-01T00:00:00Z"
        })
        .to_string();

        let before = Utc::now();
        let id = store.import_document(&raw).unwrap();
        assert_ne!(id.as_str(), "foreign");

        let capsule = store.get_capsule(&id).unwrap();
        assert_eq!(capsule.meta.title, crate::store::IMPORTED_TITLE);
        assert!(capsule.updated_at >= before);
        assert!(capsule.progress.is_none());
        assert_eq!(capsule.flashcards[0].known, None);
        assert_eq!(capsule.quiz[0].choices.len(), 4);

        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, id);
    }

    #[test]
    fn test_import_without_schema_changes_nothing() {
        let mut store = make_store();
        store.put_capsule(&capsule("Existing")).unwrap();
        let keys_before = store.backend.keys().unwrap();

        for raw in [
            r#"{ "meta": { "title": "x" } }"#,
            r#"{ "schema": "pocket-classroom/v1" }"#,
            r#"{ "meta": null, "schema": "pocket-classroom/v1" }"#,
            r#"[1, 2, 3]"#,
            "not json",
        ] {
            let result = store.import_document(raw);
            assert!(
                matches!(result, Err(ClassroomError::InvalidFormat(_))),
                "accepted {}",
                raw
            );
        }

        assert_eq!(store.list_index().unwrap().len(), 1);
        assert_eq!(store.backend.keys().unwrap(), keys_before);
    }

    #[test]
    fn test_export_is_pretty_canonical_json() {
        let mut store = make_store();
        let c = capsule("Exported");
        store.put_capsule(&c).unwrap();

        let text = store.export_document(&c.id).unwrap();
        assert!(text.contains("\n  \"schema\": \"pocket-classroom/v1\""));
        let parsed: Capsule = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, c);

        assert!(matches!(
            store.export_document(&CapsuleId::from("missing")),
            Err(ClassroomError::NotFound(_))
        ));
    }

    // --- Doctor Tests ---

    #[test]
    fn test_doctor_adopts_orphan_documents() {
        let mut store = make_store();
        let orphan = capsule("Orphan");
        store
            .backend
            .set_item(&capsule_key(&orphan.id), &serde_json::to_string(&orphan).unwrap())
            .unwrap();
        store.save_best_score(&orphan.id, 60).unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.recovered_documents, 1);

        let index = store.list_index().unwrap();
        assert_eq!(index[0].title, "Orphan");
        assert_eq!(index[0].best_score, Some(60));
    }

    #[test]
    fn test_doctor_removes_dangling_entries_and_keeps_corrupt_documents() {
        let mut store = make_store();
        let kept = capsule("Kept");
        let gone = capsule("Gone");
        store.put_capsule(&kept).unwrap();
        store.put_capsule(&gone).unwrap();
        store.backend.remove_item(&capsule_key(&gone.id)).unwrap();
        let bad_key = capsule_key(&CapsuleId::from("bad"));
        store.backend.set_item(&bad_key, "garbage").unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.removed_entries, 1);
        assert_eq!(report.unreadable_documents, vec![bad_key.clone()]);
        assert_eq!(report.recovered_documents, 0);
        assert!(report.repaired());

        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].id, kept.id);
        assert_eq!(
            store.backend.get_item(&bad_key).unwrap().as_deref(),
            Some("garbage")
        );

        // Nothing left to repair, the unreadable document is reported again
        let again = store.doctor().unwrap();
        assert!(!again.repaired());
        assert_eq!(again.unreadable_documents, vec![bad_key]);
    }

    #[test]
    fn test_doctor_drops_entry_of_corrupt_document_but_keeps_the_bytes() {
        let mut store = make_store();
        let broken = capsule("Broken");
        store.put_capsule(&broken).unwrap();
        let key = capsule_key(&broken.id);
        store.backend.set_item(&key, "{ truncated").unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.removed_entries, 1);
        assert_eq!(report.unreadable_documents, vec![key.clone()]);
        assert!(store.list_index().unwrap().is_empty());
        assert_eq!(
            store.backend.get_item(&key).unwrap().as_deref(),
            Some("{ truncated")
        );
    }
}

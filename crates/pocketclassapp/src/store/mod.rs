//! # Storage Layer
//!
//! All persistence goes through the [`DataStore`] trait. Nothing else in the crate
//! touches the underlying key-value storage.
//!
//! ## Dual Storage
//!
//! Every capsule lives in two places:
//! 1. **Document**: the full canonical capsule under `pc_capsule_<id>`.
//! 2. **Index**: a summary [`IndexEntry`] inside the ordered array under
//!    `pc_capsules_index`, used by list views.
//!
//! The pair is created and destroyed together. When the second write of a pair
//! fails, the first one is rolled back so neither a document without an entry nor
//! an entry without a document is left behind. [`DataStore::doctor`] repairs
//! layouts damaged by crashes or external edits.
//!
//! ## Auxiliary Records
//!
//! Progress tracking keeps two small records per capsule, independent of the
//! document:
//! - `known_<id>`: JSON array of flashcard positions marked known.
//! - `quiz_best_<id>`: best quiz percent.
//!
//! Both are removed with the capsule.
//!
//! ## Storage Layout
//!
//! ```text
//! pc_capsules_index      -> [IndexEntry, …]   (insertion order)
//! pc_capsule_<id>        -> Capsule
//! known_<id>             -> [0, 3, 4]
//! quiz_best_<id>         -> 70
//! ```
//!
//! ## Implementations
//!
//! - [`capsule_store::CapsuleStore`]: the logic, generic over a [`backend::StorageBackend`].
//! - [`fs::FileStore`]: one JSON file per key in a data directory.
//! - [`memory::InMemoryStore`]: for tests.
//!
//! Writes are last-writer-wins. The store assumes a single process owns the data.

use crate::error::{ClassroomError, Result};
use crate::model::{Capsule, CapsuleId, IndexEntry};
use crate::normalize::normalize;
use chrono::Utc;
use log::info;
use serde_json::Value;
use std::collections::BTreeSet;

pub mod backend;
pub mod capsule_store;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;

pub const INDEX_KEY: &str = "pc_capsules_index";
pub(crate) const CAPSULE_KEY_PREFIX: &str = "pc_capsule_";

/// Title given to imported capsules that carry none.
pub const IMPORTED_TITLE: &str = "Imported Capsule";

/// Subject given to imported capsules that carry none.
pub const IMPORTED_SUBJECT: &str = "General";

pub fn capsule_key(id: &CapsuleId) -> String {
    format!("{}{}", CAPSULE_KEY_PREFIX, id)
}

pub fn known_key(id: &CapsuleId) -> String {
    format!("known_{}", id)
}

pub fn best_score_key(id: &CapsuleId) -> String {
    format!("quiz_best_{}", id)
}

/// Progress record written by older versions; only ever deleted.
pub(crate) fn legacy_progress_key(id: &CapsuleId) -> String {
    format!("pc_progress_{}", id)
}

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Documents that had no index entry and were added to the index.
    pub recovered_documents: usize,
    /// Index entries whose document was missing or unreadable.
    pub removed_entries: usize,
    /// Keys of unreadable documents. They are left in the store untouched.
    pub unreadable_documents: Vec<String>,
}

impl DoctorReport {
    /// True when the index was rewritten.
    pub fn repaired(&self) -> bool {
        self.recovered_documents > 0 || self.removed_entries > 0
    }
}

/// The Capsule Store.
///
/// Implementations own consistency between documents, the index and the
/// auxiliary progress records.
pub trait DataStore {
    /// Fetch a capsule. Missing and undecodable documents are both `NotFound`.
    fn get_capsule(&self, id: &CapsuleId) -> Result<Capsule>;

    /// Write a capsule and merge its index entry (update in place, else append).
    /// Progress fields of an existing entry are carried forward.
    /// Refused with `InvalidFormat` when the title is blank.
    fn put_capsule(&mut self, capsule: &Capsule) -> Result<()>;

    /// Remove the document, its index entry and its auxiliary records.
    /// Deleting an unknown id is a no-op.
    fn delete_capsule(&mut self, id: &CapsuleId) -> Result<()>;

    /// The index in insertion order. An absent or unreadable index is empty.
    fn list_index(&self) -> Result<Vec<IndexEntry>>;

    /// Apply `update` to the entry for `id` and persist it.
    /// Returns false when the index has no such entry.
    fn update_index_entry(
        &mut self,
        id: &CapsuleId,
        update: &mut dyn FnMut(&mut IndexEntry),
    ) -> Result<bool>;

    fn load_known_set(&self, id: &CapsuleId) -> Result<BTreeSet<usize>>;

    fn save_known_set(&mut self, id: &CapsuleId, known: &BTreeSet<usize>) -> Result<()>;

    fn load_best_score(&self, id: &CapsuleId) -> Result<Option<u8>>;

    fn save_best_score(&mut self, id: &CapsuleId, score: u8) -> Result<()>;

    /// Reconcile the index with the stored documents. Unreadable documents are
    /// reported, never deleted.
    fn doctor(&mut self) -> Result<DoctorReport>;

    /// Pretty-printed canonical document, as written to export files.
    fn export_document(&self, id: &CapsuleId) -> Result<String> {
        let capsule = self.get_capsule(id)?;
        Ok(serde_json::to_string_pretty(&capsule)?)
    }

    /// Store a capsule from an interchange file under a fresh id.
    ///
    /// The file must declare both `meta` and `schema`; otherwise it is rejected
    /// with `InvalidFormat` and nothing is written. Embedded ids and progress are
    /// discarded.
    fn import_document(&mut self, raw_json: &str) -> Result<CapsuleId> {
        let raw: Value = serde_json::from_str(raw_json)
            .map_err(|e| ClassroomError::InvalidFormat(format!("not valid JSON: {}", e)))?;

        let declared = |key: &str| {
            raw.get(key).is_some_and(|v| {
                !(v.is_null() || v == &Value::Bool(false) || v.as_str() == Some(""))
            })
        };
        if !raw.is_object() || !declared("meta") || !declared("schema") {
            return Err(ClassroomError::InvalidFormat(
                "capsule files must declare both `meta` and `schema`".to_string(),
            ));
        }

        let mut capsule = normalize(&raw);
        capsule.id = CapsuleId::generate();
        capsule.updated_at = Utc::now();
        if capsule.meta.title.is_empty() {
            capsule.meta.title = IMPORTED_TITLE.to_string();
        }
        if capsule.meta.subject.is_empty() {
            capsule.meta.subject = IMPORTED_SUBJECT.to_string();
        }
        capsule.progress = None;
        for card in &mut capsule.flashcards {
            card.known = None;
        }

        self.put_capsule(&capsule)?;
        info!("imported capsule {} ({})", capsule.id, capsule.meta.title);
        Ok(capsule.id)
    }
}

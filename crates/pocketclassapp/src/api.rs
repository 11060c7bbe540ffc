//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the progress
//! tracker. It is the single entry point for every UI: the CLI, or any other shell
//! that renders capsules.
//!
//! The facade:
//! - **Dispatches** to the appropriate command function
//! - **Resolves** capsule references (listing positions or ids)
//! - **Owns** the progress tracker, so study interactions and their listeners are
//!   wired once per process
//!
//! It holds no business logic and performs no presentation.
//!
//! ## Generic Over DataStore
//!
//! `ClassroomApi<S: DataStore>` is generic over the storage backend:
//! - Production: `ClassroomApi<FileStore>`
//! - Testing: `ClassroomApi<InMemoryStore>`

use crate::commands::{self, CmdResult};
use crate::error::Result;
use crate::model::{Capsule, CapsuleId};
use crate::progress::{AnswerOutcome, KnownToggle, ProgressEvent, ProgressTracker, QuizSession};
use crate::store::DataStore;
use std::path::{Path, PathBuf};

pub struct ClassroomApi<S: DataStore> {
    store: S,
    tracker: ProgressTracker,
}

impl<S: DataStore> ClassroomApi<S> {
    pub fn new(store: S, tracker: ProgressTracker) -> Self {
        Self { store, tracker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Library ---

    pub fn list_capsules(&self) -> Result<CmdResult> {
        commands::list::run(&self.store)
    }

    pub fn view_capsule(&self, selector: &str, search: Option<&str>) -> Result<CmdResult> {
        commands::view::run(&self.store, selector, search)
    }

    pub fn save_capsule(&mut self, draft: commands::save::CapsuleDraft) -> Result<CmdResult> {
        commands::save::run(&mut self.store, draft)
    }

    pub fn delete_capsule(&mut self, selector: &str) -> Result<CmdResult> {
        commands::delete::run(&mut self.store, selector)
    }

    pub fn export_capsule(&self, selector: &str, out_dir: &Path) -> Result<CmdResult> {
        commands::export::run(&self.store, selector, out_dir)
    }

    pub fn import_capsules(&mut self, paths: Vec<PathBuf>) -> Result<CmdResult> {
        commands::import::run(&mut self.store, paths)
    }

    pub fn doctor(&mut self) -> Result<CmdResult> {
        commands::doctor::run(&mut self.store)
    }

    // --- Study ---

    pub fn resolve(&self, selector: &str) -> Result<CapsuleId> {
        commands::helpers::resolve_capsule(&self.store, selector)
    }

    pub fn get_capsule(&self, id: &CapsuleId) -> Result<Capsule> {
        self.store.get_capsule(id)
    }

    pub fn on_progress_changed(&mut self, listener: impl Fn(&ProgressEvent) + 'static) {
        self.tracker.on_progress_changed(listener);
    }

    pub fn toggle_known(&mut self, id: &CapsuleId, card: usize) -> Option<KnownToggle> {
        self.tracker.toggle_known(&mut self.store, id, card)
    }

    pub fn start_quiz(&self, id: &CapsuleId) -> Result<QuizSession> {
        let capsule = self.store.get_capsule(id)?;
        Ok(QuizSession::start(&capsule))
    }

    pub fn record_answer(
        &mut self,
        session: &mut QuizSession,
        question_index: usize,
        chosen: usize,
    ) -> Option<AnswerOutcome> {
        self.tracker
            .record_answer(&mut self.store, session, question_index, chosen)
    }

    /// Finalizes a finished pass and returns the new best score.
    pub fn complete_pass(&mut self, session: &QuizSession) -> Option<u8> {
        let id = session.capsule_id().clone();
        self.tracker
            .complete_pass(&mut self.store, &id, session.percent())
    }
}

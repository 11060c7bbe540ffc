//! # Progress Tracking
//!
//! Study progress lives in three places that are kept in step:
//! - the capsule document (`flashcards[i].known`, `progress`),
//! - the auxiliary records (`known_<id>`, `quiz_best_<id>`),
//! - the capsule's index entry (`knownCards`, `bestScore`, `progress`), so list views
//!   never load documents.
//!
//! [`ProgressTracker`] performs every such update through the [`DataStore`]. Progress
//! is best-effort: a storage failure is logged and the operation becomes a no-op
//! returning `None`. Listeners registered with
//! [`ProgressTracker::on_progress_changed`] run synchronously before the triggering
//! call returns.
//!
//! [`QuizSession`] holds the transient state of one quiz pass and [`ScorePolicy`]
//! the best-score ratchet.
//!
//! [`DataStore`]: crate::store::DataStore

pub mod policy;
pub mod session;
pub mod tracker;

pub use policy::{score_percent, ScorePolicy, DEFAULT_PENALTY};
pub use session::{AnswerOutcome, QuizSession};
pub use tracker::{KnownToggle, ProgressTracker};

use crate::model::CapsuleId;

/// Progress-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    KnownToggled {
        capsule_id: CapsuleId,
        card: usize,
        known: bool,
        known_cards: usize,
    },
    AnswerRecorded {
        capsule_id: CapsuleId,
        question: usize,
        is_correct: bool,
        last_score: u8,
    },
    PassCompleted {
        capsule_id: CapsuleId,
        percent: u8,
        best_score: u8,
    },
}

impl ProgressEvent {
    pub fn capsule_id(&self) -> &CapsuleId {
        match self {
            ProgressEvent::KnownToggled { capsule_id, .. }
            | ProgressEvent::AnswerRecorded { capsule_id, .. }
            | ProgressEvent::PassCompleted { capsule_id, .. } => capsule_id,
        }
    }
}

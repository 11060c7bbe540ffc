use super::policy::{score_percent, ScorePolicy};
use super::session::{AnswerOutcome, QuizSession};
use super::ProgressEvent;
use crate::error::{ClassroomError, Result};
use crate::model::{Capsule, CapsuleId, IndexEntry};
use crate::store::DataStore;
use log::{debug, warn};

/// State of a flashcard after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownToggle {
    pub card: usize,
    pub known: bool,
    pub known_cards: usize,
}

type Listener = Box<dyn Fn(&ProgressEvent)>;

pub struct ProgressTracker {
    policy: ScorePolicy,
    listeners: Vec<Listener>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(ScorePolicy::default())
    }
}

impl ProgressTracker {
    pub fn new(policy: ScorePolicy) -> Self {
        Self {
            policy,
            listeners: Vec::new(),
        }
    }

    pub fn on_progress_changed(&mut self, listener: impl Fn(&ProgressEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: ProgressEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Flips card `card` in the known set and mirrors it into the document and
    /// the index entry.
    pub fn toggle_known<S: DataStore>(
        &self,
        store: &mut S,
        id: &CapsuleId,
        card: usize,
    ) -> Option<KnownToggle> {
        let toggle = best_effort("toggle known card", id, persist_toggle(store, id, card))?;
        self.notify(ProgressEvent::KnownToggled {
            capsule_id: id.clone(),
            card: toggle.card,
            known: toggle.known,
            known_cards: toggle.known_cards,
        });
        Some(toggle)
    }

    /// Evaluates an answer in `session` and stores the running score as the
    /// capsule's last score. The best score is left alone.
    ///
    /// Returns None when the session ignores the answer. A storage failure does
    /// not undo the evaluation, it only skips persistence and the notification.
    pub fn record_answer<S: DataStore>(
        &self,
        store: &mut S,
        session: &mut QuizSession,
        question_index: usize,
        chosen: usize,
    ) -> Option<AnswerOutcome> {
        let outcome = session.answer(question_index, chosen)?;
        let id = session.capsule_id().clone();

        let persisted = persist_answer(store, &id, session.correct());
        if let Some(last_score) = best_effort("record answer", &id, persisted) {
            self.notify(ProgressEvent::AnswerRecorded {
                capsule_id: id,
                question: question_index,
                is_correct: outcome.is_correct,
                last_score,
            });
        }
        Some(outcome)
    }

    /// Applies the ratchet to the best score after a finished pass and returns
    /// the new best score.
    pub fn complete_pass<S: DataStore>(
        &self,
        store: &mut S,
        id: &CapsuleId,
        percent: u8,
    ) -> Option<u8> {
        let percent = percent.min(100);
        let best = best_effort(
            "complete quiz pass",
            id,
            self.persist_pass(store, id, percent),
        )?;
        self.notify(ProgressEvent::PassCompleted {
            capsule_id: id.clone(),
            percent,
            best_score: best,
        });
        Some(best)
    }

    /// Writes the index entry, then the document, then the best-score record.
    /// A failed write undoes the earlier ones so a failed pass changes nothing.
    fn persist_pass<S: DataStore>(&self, store: &mut S, id: &CapsuleId, percent: u8) -> Result<u8> {
        let original = store.get_capsule(id)?;
        let (entry_best, entry_progress) = indexed_entry(store, id)?
            .map(|entry| (entry.best_score, entry.progress))
            .unwrap_or_default();

        let previous = store.load_best_score(id)?.or(entry_best);
        let best = self.policy.apply(previous, percent);

        store.update_index_entry(id, &mut |entry| {
            entry.best_score = Some(best);
            entry.progress = Some(percent);
        })?;
        let restore_entry = |store: &mut S| {
            let restored = store.update_index_entry(id, &mut |entry| {
                entry.best_score = entry_best;
                entry.progress = entry_progress;
            });
            if let Err(undo) = restored {
                warn!("could not restore index entry of {}: {}", id, undo);
            }
        };

        let mut capsule = original.clone();
        let total = capsule.quiz.len();
        let progress = capsule.progress_mut();
        progress.total = total;
        progress.last_score = percent;
        capsule.touch();
        if let Err(e) = store.put_capsule(&capsule) {
            restore_entry(store);
            return Err(e);
        }

        if let Err(e) = store.save_best_score(id, best) {
            restore_document(store, &original);
            restore_entry(store);
            return Err(e);
        }

        debug!("quiz pass on {}: {}%, best {}%", id, percent, best);
        Ok(best)
    }
}

fn indexed_entry<S: DataStore>(store: &S, id: &CapsuleId) -> Result<Option<IndexEntry>> {
    Ok(store.list_index()?.into_iter().find(|entry| &entry.id == id))
}

/// Puts `original` back. Only called while the index is writable.
fn restore_document<S: DataStore>(store: &mut S, original: &Capsule) {
    if let Err(undo) = store.put_capsule(original) {
        warn!("could not restore capsule {}: {}", original.id, undo);
    }
}

/// Writes the index entry, then the known set, then the document, undoing
/// earlier writes when a later one fails.
fn persist_toggle<S: DataStore>(store: &mut S, id: &CapsuleId, card: usize) -> Result<KnownToggle> {
    let original = store.get_capsule(id)?;
    let count = original.flashcards.len();
    if card >= count {
        return Err(ClassroomError::InvalidFormat(format!(
            "Card {} is out of range ({} cards)",
            card, count
        )));
    }
    let entry_known = indexed_entry(store, id)?.and_then(|entry| entry.known_cards);

    let previous = store.load_known_set(id)?;
    let mut known = previous.clone();
    known.retain(|&i| i < count);
    let now_known = if known.remove(&card) {
        false
    } else {
        known.insert(card);
        true
    };
    let known_cards = known.len();

    store.update_index_entry(id, &mut |entry| {
        entry.known_cards = Some(known_cards);
    })?;
    let restore_entry = |store: &mut S| {
        let restored = store.update_index_entry(id, &mut |entry| {
            entry.known_cards = entry_known;
        });
        if let Err(undo) = restored {
            warn!("could not restore index entry of {}: {}", id, undo);
        }
    };

    if let Err(e) = store.save_known_set(id, &known) {
        restore_entry(store);
        return Err(e);
    }

    let mut capsule = original;
    capsule.flashcards[card].known = Some(now_known);
    capsule.progress_mut().known_cards = known_cards;
    capsule.touch();
    if let Err(e) = store.put_capsule(&capsule) {
        if let Err(undo) = store.save_known_set(id, &previous) {
            warn!("could not restore known cards of {}: {}", id, undo);
        }
        restore_entry(store);
        return Err(e);
    }

    Ok(KnownToggle {
        card,
        known: now_known,
        known_cards,
    })
}

fn persist_answer<S: DataStore>(store: &mut S, id: &CapsuleId, correct: usize) -> Result<u8> {
    let mut capsule = store.get_capsule(id)?;
    let total = capsule.quiz.len();
    let last_score = score_percent(correct, total);

    let progress = capsule.progress_mut();
    progress.total = total;
    progress.correct = correct;
    progress.last_score = last_score;
    capsule.touch();
    store.put_capsule(&capsule)?;

    store.update_index_entry(id, &mut |entry| {
        entry.progress = Some(last_score);
    })?;
    Ok(last_score)
}

fn best_effort<T>(operation: &str, id: &CapsuleId, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} on capsule {} skipped: {}", operation, id, e);
            None
        }
    }
}

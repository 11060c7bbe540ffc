use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ClassroomError, Result};
use crate::model::{Capsule, CapsuleId, Flashcard, Level, Meta, QuizQuestion};
use crate::store::DataStore;

/// Editor form contents.
#[derive(Debug, Clone, Default)]
pub struct CapsuleDraft {
    /// Id of the capsule being edited; None creates a new one.
    pub id: Option<CapsuleId>,
    pub title: String,
    pub subject: String,
    pub level: String,
    pub description: String,
    /// Free text, one note per line.
    pub notes: String,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
}

/// Builds the canonical capsule for `draft` and writes it as a full rewrite.
///
/// Progress of an edited capsule is not kept in the document; the index entry's
/// progress fields and the auxiliary records are.
pub fn run<S: DataStore>(store: &mut S, draft: CapsuleDraft) -> Result<CmdResult> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(ClassroomError::InvalidFormat("Title is required".to_string()));
    }
    let level = if draft.level.trim().is_empty() {
        Level::default()
    } else {
        draft
            .level
            .parse::<Level>()
            .map_err(ClassroomError::InvalidFormat)?
    };

    let meta = Meta {
        title: title.to_string(),
        subject: draft.subject.trim().to_string(),
        level,
        description: draft.description.trim().to_string(),
    };

    let mut capsule = Capsule::new(meta);
    let editing = match draft.id {
        Some(id) => {
            // Keep an existing timestamp monotonic across edits.
            if let Ok(existing) = store.get_capsule(&id) {
                capsule.updated_at = existing.updated_at;
            }
            capsule.id = id;
            true
        }
        None => false,
    };
    capsule.notes = draft
        .notes
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    capsule.flashcards = draft.flashcards;
    capsule.quiz = draft
        .quiz
        .into_iter()
        .map(|q| QuizQuestion::new(q.question, q.choices, q.correct, q.explanation))
        .collect();
    capsule.touch();

    store.put_capsule(&capsule)?;

    let mut result = CmdResult::default();
    let verb = if editing { "Updated" } else { "Created" };
    result.add_message(CmdMessage::success(format!(
        "{} capsule: {}",
        verb, capsule.meta.title
    )));
    Ok(result.with_capsules(vec![capsule]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn draft(title: &str) -> CapsuleDraft {
        CapsuleDraft {
            title: title.to_string(),
            subject: " Science ".to_string(),
            level: "advanced".to_string(),
            notes: "  atoms \n\n molecules\n   \n".to_string(),
            flashcards: vec![Flashcard::new("H2O", "water")],
            quiz: vec![QuizQuestion {
                question: "Protons in He?".into(),
                choices: vec!["1".into(), "2".into()],
                correct: 9,
                explanation: String::new(),
            }],
            ..CapsuleDraft::default()
        }
    }

    #[test]
    fn creates_canonical_capsule() {
        let mut store = InMemoryStore::new();
        let result = run(&mut store, draft("  Chemistry  ")).unwrap();

        let capsule = &result.capsules[0];
        assert_eq!(capsule.meta.title, "Chemistry");
        assert_eq!(capsule.meta.subject, "Science");
        assert_eq!(capsule.meta.level, Level::Advanced);
        assert_eq!(capsule.notes, vec!["atoms", "molecules"]);
        assert_eq!(capsule.quiz[0].choices, vec!["1", "2", "", ""]);
        assert_eq!(capsule.quiz[0].correct, 0);
        assert!(result.messages[0].content.contains("Created"));

        assert_eq!(store.get_capsule(&capsule.id).unwrap(), *capsule);
        assert_eq!(store.list_index().unwrap().len(), 1);
    }

    #[test]
    fn blank_title_is_refused() {
        let mut store = InMemoryStore::new();
        match run(&mut store, draft("   ")) {
            Err(ClassroomError::InvalidFormat(msg)) => assert_eq!(msg, "Title is required"),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
        assert!(store.list_index().unwrap().is_empty());
    }

    #[test]
    fn non_standard_level_is_refused() {
        let mut store = InMemoryStore::new();
        let mut d = draft("Levels");
        d.level = "Expert".into();
        assert!(matches!(
            run(&mut store, d),
            Err(ClassroomError::InvalidFormat(_))
        ));
    }

    #[test]
    fn missing_level_defaults_to_beginner() {
        let mut store = InMemoryStore::new();
        let mut d = draft("Levels");
        d.level = String::new();
        let result = run(&mut store, d).unwrap();
        assert_eq!(result.capsules[0].meta.level, Level::Beginner);
    }

    #[test]
    fn editing_rewrites_in_place_and_keeps_index_progress() {
        let mut store = InMemoryStore::new();
        let created = run(&mut store, draft("Original")).unwrap().capsules[0].clone();
        store.save_best_score(&created.id, 70).unwrap();
        store
            .update_index_entry(&created.id, &mut |entry| entry.best_score = Some(70))
            .unwrap();

        let mut edit = draft("Renamed");
        edit.id = Some(created.id.clone());
        edit.notes = String::new();
        let result = run(&mut store, edit).unwrap();
        assert!(result.messages[0].content.contains("Updated"));

        let stored = store.get_capsule(&created.id).unwrap();
        assert_eq!(stored.meta.title, "Renamed");
        assert!(stored.notes.is_empty());
        assert!(stored.updated_at >= created.updated_at);

        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "Renamed");
        assert_eq!(index[0].best_score, Some(70));
    }
}

use super::capsule_store::CapsuleStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore = CapsuleStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        CapsuleStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Capsule, Flashcard, Level, Meta, QuizQuestion};
    use crate::store::DataStore;

    fn choices() -> Vec<String> {
        ["a", "b", "c", "d"].map(String::from).to_vec()
    }

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        fn meta(title: &str) -> Meta {
            Meta {
                title: title.to_string(),
                subject: "General".to_string(),
                level: Level::Beginner,
                description: String::new(),
            }
        }

        /// Adds `count` capsules titled "Test Capsule N" with two cards and two questions each.
        pub fn with_capsules(mut self, count: usize) -> Self {
            for i in 0..count {
                let mut capsule = Capsule::new(Self::meta(&format!("Test Capsule {}", i + 1)));
                capsule.notes = vec![format!("Notes for capsule {}", i + 1)];
                capsule.flashcards = vec![
                    Flashcard::new("front 1", "back 1"),
                    Flashcard::new("front 2", "back 2"),
                ];
                capsule.quiz = vec![
                    QuizQuestion::new("first?", choices(), 0, ""),
                    QuizQuestion::new("second?", choices(), 1, ""),
                ];
                self.store.put_capsule(&capsule).unwrap();
            }
            self
        }

        /// Adds a capsule with the given flashcards and no quiz.
        pub fn with_flashcards(mut self, title: &str, cards: &[(&str, &str)]) -> Self {
            let mut capsule = Capsule::new(Self::meta(title));
            capsule.flashcards = cards
                .iter()
                .map(|(front, back)| Flashcard::new(*front, *back))
                .collect();
            self.store.put_capsule(&capsule).unwrap();
            self
        }

        /// Adds a capsule whose questions all have the first choice correct.
        pub fn with_quiz(mut self, title: &str, questions: usize) -> Self {
            let mut capsule = Capsule::new(Self::meta(title));
            capsule.quiz = (0..questions)
                .map(|n| {
                    QuizQuestion::new(
                        format!("Question {}", n + 1),
                        vec!["right".into(), "wrong".into(), "wrong".into(), "wrong".into()],
                        0,
                        "",
                    )
                })
                .collect();
            self.store.put_capsule(&capsule).unwrap();
            self
        }

        /// Id of the capsule with `title`.
        pub fn id_of(&self, title: &str) -> crate::model::CapsuleId {
            self.store
                .list_index()
                .unwrap()
                .into_iter()
                .find(|entry| entry.title == title)
                .map(|entry| entry.id)
                .unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use crate::store::DataStore;

    #[test]
    fn test_fixtures_coverage() {
        let fixture = StoreFixture::default()
            .with_capsules(2)
            .with_flashcards("Cards", &[("hola", "hello")])
            .with_quiz("Quiz", 3);

        let index = fixture.store.list_index().unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index[0].title, "Test Capsule 1");

        let cards = fixture.store.get_capsule(&fixture.id_of("Cards")).unwrap();
        assert_eq!(cards.flashcards.len(), 1);
        assert!(cards.quiz.is_empty());

        let quiz = fixture.store.get_capsule(&fixture.id_of("Quiz")).unwrap();
        assert_eq!(quiz.quiz.len(), 3);
    }
}

//! # Domain Model: Capsules and Index Entries
//!
//! A [`Capsule`] is a self-contained unit of study content: meta data, notes,
//! flashcards and quiz questions, plus optional learning progress.
//!
//! Each capsule is persisted twice:
//! - **Document**: the full capsule under its own key.
//! - **Index Entry**: a lightweight [`IndexEntry`] inside the shared index, so list
//!   views never need to load full documents.
//!
//! ## Canonical Shape
//!
//! ```text
//! {
//!   "id": "…",
//!   "schema": "pocket-classroom/v1",
//!   "meta": { "title", "subject", "level", "description" },
//!   "notes": ["…"],
//!   "flashcards": [{ "front", "back", "known"? }],
//!   "quiz": [{ "question", "choices": [4 strings], "correct": 0..=3, "explanation" }],
//!   "progress"?: { "total", "correct", "knownCards", "lastScore" },
//!   "updatedAt": "2026-10-18T09:30:00Z"
//! }
//! ```
//!
//! Documents of any other shape go through [`crate::normalize`] before they reach
//! these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Schema tag written on every capsule.
pub const SCHEMA_V1: &str = "pocket-classroom/v1";

/// Every quiz question carries exactly this many choices.
pub const CHOICES_PER_QUESTION: usize = 4;

/// Opaque, stable capsule identifier.
///
/// Older data used millisecond timestamps (JSON numbers), newer data uses uuids.
/// Both are accepted on read and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CapsuleId(String);

impl CapsuleId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapsuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapsuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CapsuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for CapsuleId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for CapsuleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => CapsuleId(text),
            RawId::Integer(n) => CapsuleId(n.to_string()),
        })
    }
}

/// Difficulty level. Values outside the three known ones are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Other(String),
}

impl Level {
    /// Whether this is one of the levels the editor offers.
    pub fn is_standard(&self) -> bool {
        !matches!(self, Level::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Other(other) => other,
        }
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Beginner" => Level::Beginner,
            "Intermediate" => Level::Intermediate,
            "Advanced" => Level::Advanced,
            _ => Level::Other(value),
        }
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        match level {
            Level::Other(other) => other,
            standard => standard.as_str().to_string(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one of the three standard levels, ignoring case.
impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            _ => Err(format!(
                "Unknown level '{}': expected Beginner, Intermediate or Advanced",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub title: String,
    pub subject: String,
    pub level: Level,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    /// Mirror of the capsule's known set, written by the progress tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known: Option<bool>,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            known: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub choices: Vec<String>,
    pub correct: usize,
    pub explanation: String,
}

impl QuizQuestion {
    /// Builds a question, fitting `choices` to four entries and resetting an
    /// out-of-range `correct` to the first choice.
    pub fn new(
        question: impl Into<String>,
        choices: Vec<String>,
        correct: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            choices: fit_choices(choices),
            correct: if correct < CHOICES_PER_QUESTION {
                correct
            } else {
                0
            },
            explanation: explanation.into(),
        }
    }

    pub fn is_correct(&self, chosen: usize) -> bool {
        chosen == self.correct
    }
}

/// Pads with empty strings or truncates so exactly four choices remain.
pub(crate) fn fit_choices(mut choices: Vec<String>) -> Vec<String> {
    choices.truncate(CHOICES_PER_QUESTION);
    choices.resize(CHOICES_PER_QUESTION, String::new());
    choices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub correct: usize,
    pub known_cards: usize,
    /// Percent of the last (possibly partial) quiz pass.
    pub last_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capsule {
    pub id: CapsuleId,
    pub schema: String,
    pub meta: Meta,
    pub notes: Vec<String>,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    pub updated_at: DateTime<Utc>,
}

impl Capsule {
    pub fn new(meta: Meta) -> Self {
        Self {
            id: CapsuleId::generate(),
            schema: SCHEMA_V1.to_string(),
            meta,
            notes: Vec::new(),
            flashcards: Vec::new(),
            quiz: Vec::new(),
            progress: None,
            updated_at: Utc::now(),
        }
    }

    /// Refreshes `updated_at`. The timestamp never moves backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Progress record, created on first study interaction.
    pub fn progress_mut(&mut self) -> &mut Progress {
        let total = self.quiz.len();
        self.progress.get_or_insert(Progress {
            total,
            ..Progress::default()
        })
    }

    /// Notes containing `term`, ignoring case. An empty term matches every note.
    pub fn search_notes(&self, term: &str) -> Vec<&str> {
        let needle = term.to_lowercase();
        self.notes
            .iter()
            .filter(|note| note.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// Fresh summary for this capsule, without any progress fields.
    pub fn index_entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            title: self.meta.title.clone(),
            subject: self.meta.subject.clone(),
            level: self.meta.level.clone(),
            updated_at: self.updated_at,
            best_score: None,
            known_cards: None,
            progress: None,
        }
    }
}

/// Summary record kept in the shared index for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: CapsuleId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_cards: Option<usize>,
    /// Last quiz score percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl IndexEntry {
    /// Refreshes the summary fields from `capsule`, leaving progress fields untouched.
    pub fn merge_from(&mut self, capsule: &Capsule) {
        self.title = capsule.meta.title.clone();
        self.subject = capsule.meta.subject.clone();
        self.level = capsule.meta.level.clone();
        self.updated_at = capsule.updated_at;
    }

    /// Bumps `updated_at` to now unless it is already later.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Capsule {
        let mut capsule = Capsule::new(Meta {
            title: "Rust Basics".into(),
            subject: "Programming".into(),
            level: Level::Beginner,
            description: String::new(),
        });
        capsule.notes = vec![
            "Ownership moves values".into(),
            "Borrowing lends them".into(),
            "Lifetimes bound borrows".into(),
        ];
        capsule
    }

    #[test]
    fn level_keeps_unknown_values() {
        let level: Level = serde_json::from_str("\"Expert\"").unwrap();
        assert_eq!(level, Level::Other("Expert".into()));
        assert!(!level.is_standard());
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"Expert\"");
    }

    #[test]
    fn level_parses_standard_names_case_insensitively() {
        assert_eq!("advanced".parse::<Level>().unwrap(), Level::Advanced);
        assert_eq!(" Intermediate ".parse::<Level>().unwrap(), Level::Intermediate);
        assert!("expert".parse::<Level>().is_err());
    }

    #[test]
    fn capsule_id_accepts_numbers_and_strings() {
        let numeric: CapsuleId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(numeric.as_str(), "1700000000000");

        let text: CapsuleId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(text, CapsuleId::from("abc"));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"1700000000000\"");
    }

    #[test]
    fn quiz_question_fits_choices() {
        let q = QuizQuestion::new("2+2?", vec!["3".into(), "4".into()], 7, "");
        assert_eq!(q.choices, vec!["3", "4", "", ""]);
        assert_eq!(q.correct, 0);

        let many: Vec<String> = (0..6).map(|n| n.to_string()).collect();
        let q = QuizQuestion::new("pick", many, 3, "");
        assert_eq!(q.choices.len(), CHOICES_PER_QUESTION);
        assert_eq!(q.correct, 3);
        assert!(q.is_correct(3));
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut capsule = sample();
        let future = Utc::now() + Duration::hours(2);
        capsule.updated_at = future;
        capsule.touch();
        assert_eq!(capsule.updated_at, future);

        capsule.updated_at = Utc::now() - Duration::hours(2);
        let before = capsule.updated_at;
        capsule.touch();
        assert!(capsule.updated_at > before);
    }

    #[test]
    fn search_notes_ignores_case() {
        let capsule = sample();
        assert_eq!(capsule.search_notes("BORROW").len(), 2);
        assert_eq!(capsule.search_notes("").len(), 3);
        assert!(capsule.search_notes("traits").is_empty());
    }

    #[test]
    fn progress_is_created_on_demand() {
        let mut capsule = sample();
        capsule.quiz.push(QuizQuestion::new("q", vec![], 0, ""));
        assert!(capsule.progress.is_none());
        capsule.progress_mut().known_cards = 2;
        let progress = capsule.progress.unwrap();
        assert_eq!(progress.total, 1);
        assert_eq!(progress.known_cards, 2);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_progress() {
        let capsule = sample();
        let json = serde_json::to_value(&capsule).unwrap();
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("progress").is_none());
        assert_eq!(json["schema"], SCHEMA_V1);

        let mut entry = capsule.index_entry();
        entry.best_score = Some(70);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["bestScore"], 70);
        assert!(json.get("knownCards").is_none());
    }

    #[test]
    fn index_merge_keeps_progress_fields() {
        let mut capsule = sample();
        let mut entry = capsule.index_entry();
        entry.best_score = Some(80);
        entry.known_cards = Some(3);

        capsule.meta.title = "Rust Intermediate".into();
        capsule.touch();
        entry.merge_from(&capsule);

        assert_eq!(entry.title, "Rust Intermediate");
        assert_eq!(entry.updated_at, capsule.updated_at);
        assert_eq!(entry.best_score, Some(80));
        assert_eq!(entry.known_cards, Some(3));
    }
}

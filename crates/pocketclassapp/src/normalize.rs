//! # Capsule Normalization
//!
//! Capsules arrive in many shapes: freshly authored, imported from files written by
//! other tools, or stored by older versions that used different field names. There
//! is no migration step beyond the `schema` tag, so every read goes through
//! [`normalize`] and every legacy shape stays accepted.
//!
//! ## Rules
//!
//! | Field        | Accepted input                                   | Canonical result                         |
//! |--------------|--------------------------------------------------|------------------------------------------|
//! | `id`         | string or integer                                | text id; fresh uuid when absent          |
//! | `meta.title` | `meta.title`, falling back to top-level `title`  | trimmed string                           |
//! | `meta.level` | any string                                       | unknown levels kept verbatim             |
//! | `notes`      | array (non-strings dropped) or one string        | trimmed, blank lines dropped             |
//! | `flashcards` | `{front, back, known?}`                          | missing sides become `""`                |
//! | `quiz`       | `{question\|q, choices\|options, correct\|answer, explanation\|expl}` | 4 choices, `correct` in `0..=3` |
//! | `updatedAt`  | RFC 3339 string or epoch milliseconds            | UTC timestamp; now when unreadable       |
//!
//! Unknown top-level fields are ignored. Normalizing a canonical capsule again
//! yields the same capsule.

use crate::error::Result;
use crate::model::{
    fit_choices, Capsule, CapsuleId, Flashcard, IndexEntry, Level, Meta, Progress, QuizQuestion,
    CHOICES_PER_QUESTION, SCHEMA_V1,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Maps a document of unknown shape to the canonical capsule.
pub fn normalize(raw: &Value) -> Capsule {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let id = obj
        .get("id")
        .and_then(id_from_value)
        .unwrap_or_else(CapsuleId::generate);

    let schema = obj
        .get("schema")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(SCHEMA_V1)
        .to_string();

    Capsule {
        id,
        schema,
        meta: normalize_meta(obj),
        notes: obj.get("notes").map(normalize_notes).unwrap_or_default(),
        flashcards: array(obj.get("flashcards"))
            .iter()
            .map(normalize_flashcard)
            .collect(),
        quiz: array(obj.get("quiz"))
            .iter()
            .map(normalize_question)
            .collect(),
        progress: obj.get("progress").and_then(normalize_progress),
        updated_at: obj
            .get("updatedAt")
            .and_then(timestamp)
            .unwrap_or_else(Utc::now),
    }
}

/// Runs an already typed capsule through the same rules.
pub fn normalize_capsule(capsule: &Capsule) -> Result<Capsule> {
    let raw = serde_json::to_value(capsule)?;
    Ok(normalize(&raw))
}

/// Reads one index entry leniently. Entries without a usable id are rejected.
pub(crate) fn index_entry(raw: &Value) -> Option<IndexEntry> {
    let obj = raw.as_object()?;
    let id = obj.get("id").and_then(id_from_value)?;

    Some(IndexEntry {
        id,
        title: text(obj.get("title")).trim().to_string(),
        subject: text(obj.get("subject")).trim().to_string(),
        level: level(obj.get("level")),
        updated_at: obj
            .get("updatedAt")
            .and_then(timestamp)
            .unwrap_or_default(),
        best_score: obj.get("bestScore").and_then(percent),
        known_cards: obj.get("knownCards").and_then(count),
        progress: obj.get("progress").and_then(percent),
    })
}

pub(crate) fn id_from_value(value: &Value) -> Option<CapsuleId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(CapsuleId::from(s.trim())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(CapsuleId::from(i.to_string()))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| CapsuleId::from(format!("{:.0}", f)))
            }
        }
        _ => None,
    }
}

/// Parses a stored percent: JSON number or numeric string, clamped to `0..=100`.
pub(crate) fn percent(value: &Value) -> Option<u8> {
    number(value).map(|n| n.round().clamp(0.0, 100.0) as u8)
}

fn normalize_meta(obj: &Map<String, Value>) -> Meta {
    let empty = Map::new();
    let meta = obj.get("meta").and_then(Value::as_object).unwrap_or(&empty);

    let mut title = text(meta.get("title")).trim().to_string();
    if title.is_empty() {
        title = text(obj.get("title")).trim().to_string();
    }

    Meta {
        title,
        subject: text(meta.get("subject")).trim().to_string(),
        level: level(meta.get("level")),
        description: text(meta.get("description")).trim().to_string(),
    }
}

fn normalize_notes(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(s) => s
            .lines()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_flashcard(value: &Value) -> Flashcard {
    let Some(card) = value.as_object() else {
        return Flashcard::default();
    };
    Flashcard {
        front: text(card.get("front")),
        back: text(card.get("back")),
        known: card.get("known").and_then(Value::as_bool),
    }
}

fn normalize_question(value: &Value) -> QuizQuestion {
    let empty = Map::new();
    let q = value.as_object().unwrap_or(&empty);

    let choices = array(first_present(q, &["choices", "options"]))
        .iter()
        .map(|choice| text(Some(choice)))
        .collect();

    QuizQuestion {
        question: text(first_present(q, &["question", "q"])),
        choices: fit_choices(choices),
        correct: first_present(q, &["correct", "answer"])
            .map(choice_index)
            .unwrap_or(0),
        explanation: text(first_present(q, &["explanation", "expl"])),
    }
}

fn normalize_progress(value: &Value) -> Option<Progress> {
    let p = value.as_object()?;
    Some(Progress {
        total: p.get("total").and_then(count).unwrap_or(0),
        correct: p.get("correct").and_then(count).unwrap_or(0),
        known_cards: p.get("knownCards").and_then(count).unwrap_or(0),
        last_score: p.get("lastScore").and_then(percent).unwrap_or(0),
    })
}

/// Integer choice index in range, or 0 when the value cannot be read as one.
fn choice_index(value: &Value) -> usize {
    number(value)
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n < CHOICES_PER_QUESTION as f64)
        .map(|n| n as usize)
        .unwrap_or(0)
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn array(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Scalars become text; anything else becomes an empty string.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn level(value: Option<&Value>) -> Level {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Level::from(s.to_string()),
        _ => Level::default(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn count(value: &Value) -> Option<usize> {
    number(value).filter(|n| *n >= 0.0).map(|n| n.round() as usize)
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

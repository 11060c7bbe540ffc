//! # Rendering
//!
//! Turns command results into terminal text. Every function here returns a
//! `String` so the output can be asserted on in tests; the `print_*` helpers are
//! the only ones writing to stdout.
//!
//! ## List Layout
//!
//! Each library row has:
//! - `index` (4 chars): listing position ("1.", "12.")
//! - `title` (fill): capsule title, truncated to fit
//! - `level` and `subject`, muted
//! - `score` (5 chars): best quiz score, or blank
//! - `time_ago` (14 chars, right-aligned): relative update time

use super::styles;
use chrono::{DateTime, Utc};
use pocketclassapp::commands::{CmdMessage, MessageLevel};
use pocketclassapp::model::{Capsule, IndexEntry, QuizQuestion};
use pocketclassapp::progress::AnswerOutcome;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
pub const COL_INDEX: usize = 4;
pub const COL_SCORE: usize = 5;
pub const TIME_WIDTH: usize = 14;
pub const CHOICE_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn render_capsule_list(entries: &[IndexEntry]) -> String {
    if entries.is_empty() {
        return "No capsules yet, create one with `pocketclass create` or import a file.\n"
            .to_string();
    }

    let mut out = String::new();
    for (pos, entry) in entries.iter().enumerate() {
        let index = format!("{}.", pos + 1);
        let detail = match (entry.level.as_str(), entry.subject.as_str()) {
            (level, "") => level.to_string(),
            (level, subject) => format!("{} · {}", level, subject),
        };
        let score = entry
            .best_score
            .map(|s| format!("{}%", s))
            .unwrap_or_default();

        let fixed = COL_INDEX + 1 + detail.width() + 2 + COL_SCORE + 1 + TIME_WIDTH;
        let title_width = LINE_WIDTH.saturating_sub(fixed).max(10);
        let title = pad_to_width(&truncate_to_width(&entry.title, title_width), title_width);

        out.push_str(&format!(
            "{} {}  {} {} {}\n",
            styles::index().apply_to(format!("{:>width$}", index, width = COL_INDEX)),
            styles::title().apply_to(title),
            styles::muted().apply_to(detail),
            styles::score().apply_to(format!("{:>width$}", score, width = COL_SCORE)),
            styles::time().apply_to(format_time_ago(entry.updated_at)),
        ));
    }
    out
}

/// Full capsule view. With `matching_notes`, only those notes are shown and
/// flashcards and quiz are omitted.
pub fn render_capsule(capsule: &Capsule, matching_notes: Option<&[String]>) -> String {
    let mut out = String::new();
    let meta = &capsule.meta;

    out.push_str(&format!("{}\n", styles::title().apply_to(&meta.title)));
    let mut detail = vec![meta.level.as_str().to_string()];
    if !meta.subject.is_empty() {
        detail.push(meta.subject.clone());
    }
    detail.push(format!("updated {}", format_time_ago(capsule.updated_at).trim()));
    out.push_str(&format!("{}\n", styles::muted().apply_to(detail.join(" · "))));
    if !meta.description.is_empty() {
        out.push_str(&format!("\n{}\n", meta.description));
    }

    if let Some(notes) = matching_notes {
        if !notes.is_empty() {
            out.push_str(&format!("\n{}\n", styles::title().apply_to("Matching notes")));
            for note in notes {
                out.push_str(&format!("  • {}\n", note));
            }
        }
        return out;
    }

    if !capsule.notes.is_empty() {
        out.push_str(&format!("\n{}\n", styles::title().apply_to("Notes")));
        for note in &capsule.notes {
            out.push_str(&format!("  • {}\n", note));
        }
    }

    if !capsule.flashcards.is_empty() {
        let known = capsule
            .flashcards
            .iter()
            .filter(|card| card.known == Some(true))
            .count();
        out.push_str(&format!(
            "\n{} {}\n",
            styles::title().apply_to("Flashcards"),
            styles::muted().apply_to(format!("({}/{} known)", known, capsule.flashcards.len()))
        ));
        for (pos, card) in capsule.flashcards.iter().enumerate() {
            let marker = if card.known == Some(true) { "✓" } else { " " };
            out.push_str(&format!(
                "{} {} {} {} {}\n",
                styles::success().apply_to(marker),
                styles::index().apply_to(format!("{:>3}.", pos + 1)),
                card.front,
                styles::muted().apply_to("→"),
                card.back
            ));
        }
    }

    if !capsule.quiz.is_empty() {
        out.push_str(&format!(
            "\n{} {}\n",
            styles::title().apply_to("Quiz"),
            styles::muted().apply_to(format!("({} questions)", capsule.quiz.len()))
        ));
        if let Some(progress) = &capsule.progress {
            out.push_str(&format!(
                "  Last score: {}\n",
                styles::score().apply_to(format!("{}%", progress.last_score))
            ));
        }
    }

    out
}

/// A question with lettered choices. Empty choices are skipped.
pub fn render_question(question: &QuizQuestion, number: usize, total: usize) -> String {
    let mut out = format!(
        "\n{} {}\n",
        styles::muted().apply_to(format!("[{}/{}]", number, total)),
        styles::title().apply_to(&question.question)
    );
    for (label, choice) in CHOICE_LABELS.iter().zip(&question.choices) {
        if choice.is_empty() {
            continue;
        }
        out.push_str(&format!("  {} {}\n", styles::index().apply_to(format!("{})", label)), choice));
    }
    out
}

pub fn render_outcome(outcome: &AnswerOutcome, question: &QuizQuestion) -> String {
    let mut out = if outcome.is_correct {
        format!("{}\n", styles::success().apply_to("Correct!"))
    } else {
        let label = CHOICE_LABELS
            .get(outcome.correct_index)
            .copied()
            .unwrap_or('?');
        format!(
            "{} The answer was {}) {}\n",
            styles::error().apply_to("Wrong."),
            label,
            question
                .choices
                .get(outcome.correct_index)
                .map(String::as_str)
                .unwrap_or_default()
        )
    };
    if !question.explanation.is_empty() {
        out.push_str(&format!("{}\n", styles::muted().apply_to(&question.explanation)));
    }
    out
}

pub fn render_pass_summary(correct: usize, total: usize, percent: u8, best: Option<u8>) -> String {
    let mut out = format!(
        "\nScore: {} ({}/{})\n",
        styles::score().apply_to(format!("{}%", percent)),
        correct,
        total
    );
    if let Some(best) = best {
        out.push_str(&format!("Best score: {}\n", styles::score().apply_to(format!("{}%", best))));
    }
    out
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let styled = match message.level {
            MessageLevel::Info => styles::muted().apply_to(&message.content),
            MessageLevel::Success => styles::success().apply_to(&message.content),
            MessageLevel::Warning => styles::warning().apply_to(&message.content),
            MessageLevel::Error => styles::error().apply_to(&message.content),
        };
        out.push_str(&format!("{}\n", styled));
    }
    out
}

/// Prints command messages to stdout.
pub fn print_messages(messages: &[CmdMessage]) {
    let output = render_messages(messages);
    if !output.is_empty() {
        print!("{}", output);
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

/// Truncates to `max_width` display columns, ending with "…" when cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(pad))
}

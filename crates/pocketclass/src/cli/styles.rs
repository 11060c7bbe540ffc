//! Terminal styles.
//!
//! Renderers use semantic names (a title, a time, a muted hint) instead of raw
//! colors, so the look can change in one place. `console` drops the escape codes
//! when stdout is not a terminal.

use console::Style;

pub fn title() -> Style {
    Style::new().bold()
}

pub fn muted() -> Style {
    Style::new().color256(245)
}

pub fn time() -> Style {
    muted().italic()
}

pub fn index() -> Style {
    Style::new().yellow()
}

pub fn score() -> Style {
    Style::new().cyan()
}

pub fn success() -> Style {
    Style::new().green()
}

pub fn warning() -> Style {
    Style::new().yellow().bold()
}

pub fn error() -> Style {
    Style::new().red().bold()
}

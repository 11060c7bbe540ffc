//! # CLI Behavior
//!
//! This is **one possible UI client** for Pocket Classroom, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes and output formatting.
//!
//! ## Naked Execution (`pocketclass`)
//!
//! Running `pocketclass` with no arguments lists the library, like `pocketclass list`.
//!
//! ## Capsule References
//!
//! Commands taking a `<CAPSULE>` accept either the 1-based position shown by `list`
//! or the capsule id. Positions follow the stored library order.
//!
//! ## Studying
//!
//! - `pocketclass known <CAPSULE> <CARD>` flips the known flag of a flashcard.
//! - `pocketclass quiz <CAPSULE>` runs one pass over the quiz, reading answers from
//!   stdin (`A`-`D` or `1`-`4`, `q` to abandon). Finishing a pass updates the best score.
//!
//! ## Modules
//!
//! - [`setup`]: clap definitions
//! - [`commands`]: dispatch and the quiz loop
//! - [`render`]: text output for capsules, lists and messages
//! - [`styles`]: terminal styles

pub mod commands;
pub mod render;
pub mod setup;
pub mod styles;

pub use commands::run;

//! # Pocket Classroom
//!
//! A local study-content manager: users author **capsules** (a title, notes,
//! flashcards and quiz questions), keep them in a key-value store, and study them
//! while per-capsule progress is tracked.
//!
//! This crate is the UI-agnostic core. Rendering, prompts and terminal concerns
//! belong to clients such as the `pocketclass` CLI.
//!
//! ## Architecture
//!
//! ```text
//! UI client  ->  api::ClassroomApi  ->  commands/*        ->  store::DataStore
//!                                   \-> progress::ProgressTracker -/
//! ```
//!
//! - [`model`]: Capsules, index entries and their canonical shape.
//! - [`normalize`]: Maps legacy and foreign documents to the canonical shape.
//! - [`store`]: The Capsule Store: documents, the summary index, progress records.
//! - [`progress`]: Known cards, quiz sessions and the best-score ratchet.
//! - [`commands`]: One module per user-facing operation, returning [`commands::CmdResult`].
//! - [`api`]: The facade every client talks to.
//! - [`config`] and [`init`]: Data directory and configuration loading.
//!
//! ## Failure Policy
//!
//! Reads of missing or corrupt documents yield [`error::ClassroomError::NotFound`].
//! Invalid imports and editor saves yield `InvalidFormat`. Storage failures surface
//! from explicit saves, imports and deletes, but progress tracking swallows them with
//! a logged warning. Nothing here is fatal to the process.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod store;

//! # Command Layer
//!
//! The business logic behind each user-facing operation. Every command lives in its
//! own submodule as a plain function over a [`DataStore`](crate::store::DataStore).
//!
//! Commands:
//! - Operate on [`Capsule`] and [`IndexEntry`] values
//! - Return a structured [`CmdResult`] with the capsules involved and messages
//! - Never print, prompt, or pick exit codes
//!
//! The only file access lives in [`import`] and [`export`], which read and write
//! interchange files. The UI layer decides how to render everything else.
//!
//! Study interactions (known cards, quiz answers) are not commands: they go through
//! the [`ProgressTracker`](crate::progress::ProgressTracker) and never fail.
//!
//! ## Testing Strategy
//!
//! Command tests run against `InMemoryStore`, or a `tempfile` directory where files are
//! involved.
//!
//! ## Command Modules
//!
//! - [`save`]: Create or rewrite a capsule from the editor's draft
//! - [`list`]: The library listing
//! - [`view`]: One capsule, with optional notes search
//! - [`delete`]: Remove a capsule and its progress
//! - [`export`]: Write a capsule to a `.json` file
//! - [`import`]: Read capsules from `.json` files
//! - [`doctor`]: Reconcile the index with stored documents
//! - [`helpers`]: Capsule reference resolution shared by the commands

use crate::model::{Capsule, IndexEntry};
use serde::Serialize;
use std::path::PathBuf;

pub mod delete;
pub mod doctor;
pub mod export;
pub mod helpers;
pub mod import;
pub mod list;
pub mod save;
pub mod view;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Capsules created, changed or shown by the command.
    pub capsules: Vec<Capsule>,
    /// Index entries for list views.
    pub listed_entries: Vec<IndexEntry>,
    /// Notes matching a search.
    pub matching_notes: Vec<String>,
    /// Files written by the command.
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_capsules(mut self, capsules: Vec<Capsule>) -> Self {
        self.capsules = capsules;
        self
    }

    pub fn with_listed_entries(mut self, entries: Vec<IndexEntry>) -> Self {
        self.listed_entries = entries;
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }
}

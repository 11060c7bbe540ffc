//! # Data Directory and Context
//!
//! All capsules of a user live in a single data directory, one JSON file per
//! storage key (see [`crate::store`]).
//!
//! ## Resolution Order
//!
//! [`initialize`] picks the directory in this order:
//! 1. An explicit override (the CLI's `--data` flag).
//! 2. The `POCKETCLASS_DATA` environment variable, mainly used to isolate tests.
//! 3. The OS-appropriate data directory via the `directories` crate.
//!
//! The directory is created lazily on the first write, and the configuration is
//! read from `pocketclass.toml` inside it.

use crate::api::ClassroomApi;
use crate::config::ClassroomConfig;
use crate::error::{ClassroomError, Result};
use crate::progress::ProgressTracker;
use crate::store::fs::FileStore;
use directories::ProjectDirs;
use log::debug;
use std::path::PathBuf;

pub const DATA_ENV_VAR: &str = "POCKETCLASS_DATA";

pub struct ClassroomContext {
    pub api: ClassroomApi<FileStore>,
    pub config: ClassroomConfig,
    pub data_dir: PathBuf,
}

/// Resolves the data directory without touching the filesystem.
pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("org", "pocketclass", "pocketclass")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            ClassroomError::StorageFailure(format!(
                "Could not determine a data directory; set {}",
                DATA_ENV_VAR
            ))
        })
}

/// Builds the context: data directory, configuration, file store and API.
pub fn initialize(data_override: Option<PathBuf>) -> Result<ClassroomContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let config = ClassroomConfig::load(&data_dir)?;
    let store = FileStore::new_fs(data_dir.clone());
    debug!(
        "data directory {}, best score penalty {}",
        store.backend().root().display(),
        config.best_score_penalty
    );

    let api = ClassroomApi::new(store, ProgressTracker::new(config.score_policy()));

    Ok(ClassroomContext {
        api,
        config,
        data_dir,
    })
}

//! # Configuration
//!
//! Pocket Classroom configuration is loaded with [`confique`] from layered sources.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `POCKETCLASS_BEST_SCORE_PENALTY`, `POCKETCLASS_ANSWER_FEEDBACK_MS`.
//! 2. **Config file**: `<data dir>/pocketclass.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `best_score_penalty` | `10` | Points taken off the best score after a worse quiz pass |
//! | `answer_feedback_ms` | `800` | Pause between a quiz answer and the next question |

use crate::error::Result;
use crate::progress::ScorePolicy;
use confique::Config;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "pocketclass.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClassroomConfig {
    /// Points taken off the best score when a quiz pass scores below it.
    #[config(default = 10, env = "POCKETCLASS_BEST_SCORE_PENALTY")]
    pub best_score_penalty: u8,

    /// Milliseconds between answering a question and moving on.
    #[config(default = 800, env = "POCKETCLASS_ANSWER_FEEDBACK_MS")]
    pub answer_feedback_ms: u64,
}

impl ClassroomConfig {
    /// The `#[config(default = ...)]` values alone.
    pub fn defaults() -> Result<Self> {
        Ok(Self::builder().load()?)
    }

    /// Loads the configuration for a data directory. A broken file or variable is
    /// logged and the defaults are used instead.
    pub fn load(data_dir: &Path) -> Result<Self> {
        match Self::builder().env().file(data_dir.join(CONFIG_FILE)).load() {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("ignoring configuration: {}", e);
                Self::defaults()
            }
        }
    }

    pub fn score_policy(&self) -> ScorePolicy {
        ScorePolicy::new(self.best_score_penalty)
    }

    pub fn answer_feedback(&self) -> Duration {
        Duration::from_millis(self.answer_feedback_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ClassroomConfig::defaults().unwrap();
        assert_eq!(config.best_score_penalty, 10);
        assert_eq!(config.answer_feedback(), Duration::from_millis(800));
        assert_eq!(config.score_policy(), ScorePolicy::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = ClassroomConfig::load(dir.path()).unwrap();
        assert_eq!(config.answer_feedback_ms, 800);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "best_score_penalty = 5\nanswer_feedback_ms = 0\n",
        )
        .unwrap();
        let config = ClassroomConfig::load(dir.path()).unwrap();
        assert_eq!(config.best_score_penalty, 5);
        assert_eq!(config.answer_feedback_ms, 0);
        assert_eq!(config.score_policy().apply(Some(50), 0), 45);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "best_score_penalty = \"lots\"").unwrap();
        assert_eq!(
            ClassroomConfig::load(dir.path()).unwrap(),
            ClassroomConfig::defaults().unwrap()
        );
    }
}

use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ClassroomError, Result};
use crate::model::CapsuleId;
use crate::store::DataStore;
use log::info;
use std::fs;
use std::path::Path;

use super::helpers::resolve_capsule;

/// Writes the canonical document of a capsule, pretty-printed, to
/// `<out_dir>/<safe title>.json`. An existing file of that name is replaced.
pub fn run<S: DataStore>(store: &S, selector: &str, out_dir: &Path) -> Result<CmdResult> {
    let id = resolve_capsule(store, selector)?;
    let capsule = store.get_capsule(&id)?;
    let document = store.export_document(&id)?;

    if !out_dir.exists() {
        fs::create_dir_all(out_dir).map_err(ClassroomError::Io)?;
    }
    let path = out_dir.join(export_filename(&capsule.meta.title, &id));
    fs::write(&path, document).map_err(ClassroomError::Io)?;
    info!("exported capsule {} to {}", id, path.display());

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported to {}",
        path.display()
    )));
    Ok(result.with_paths(vec![path]))
}

/// File name for an exported capsule.
///
/// The title is trimmed, stripped of everything but ASCII letters, digits and
/// `_-. `, and whitespace runs become `_`. An empty result falls back to
/// `capsule_<id>`.
pub fn export_filename(title: &str, id: &CapsuleId) -> String {
    let kept: String = title
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
        .collect();
    let safe = kept.split_whitespace().collect::<Vec<_>>().join("_");

    if safe.is_empty() {
        format!("capsule_{}.json", id)
    } else {
        format!("{}.json", safe)
    }
}

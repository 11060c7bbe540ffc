use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ClassroomError, Result};
use crate::store::DataStore;
use std::fs;
use std::path::{Path, PathBuf};

const IMPORT_EXT: &str = "json";

/// Imports capsule files. Directories contribute every `.json` file directly inside them.
///
/// Unreadable files are reported as errors and invalid ones as warnings; both are
/// skipped. A storage failure aborts
/// the import.
pub fn run<S: DataStore>(store: &mut S, paths: Vec<PathBuf>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut imported = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&path)
                .map_err(ClassroomError::Io)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == IMPORT_EXT))
                .collect();
            files.sort();
            for file in files {
                import_file(store, &file, &mut result, &mut imported)?;
            }
        } else if path.is_file() {
            import_file(store, &path, &mut result, &mut imported)?;
        } else {
            result.add_message(CmdMessage::warning(format!(
                "Path not found: {}",
                path.display()
            )));
        }
    }

    result.add_message(CmdMessage::success(format!(
        "Total imported: {}",
        imported.len()
    )));
    Ok(result.with_capsules(imported))
}

fn import_file<S: DataStore>(
    store: &mut S,
    path: &Path,
    result: &mut CmdResult,
    imported: &mut Vec<crate::model::Capsule>,
) -> Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            result.add_message(CmdMessage::error(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )));
            return Ok(());
        }
    };

    match store.import_document(&raw) {
        Ok(id) => {
            let capsule = store.get_capsule(&id)?;
            result.add_message(CmdMessage::info(format!(
                "Imported: {} ({})",
                capsule.meta.title,
                path.display()
            )));
            imported.push(capsule);
            Ok(())
        }
        Err(ClassroomError::InvalidFormat(reason)) => {
            result.add_message(CmdMessage::warning(format!(
                "Invalid capsule file {}: {}",
                path.display(),
                reason
            )));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

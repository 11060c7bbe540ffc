use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ClassroomError, Result};
use crate::store::DataStore;

use super::helpers::resolve_capsule;

/// Deletes a capsule with its index entry and progress records.
///
/// Unknown references are reported, not treated as failures.
pub fn run<S: DataStore>(store: &mut S, selector: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    let id = match resolve_capsule(store, selector) {
        Ok(id) => id,
        Err(ClassroomError::NotFound(id)) => {
            // Clear leftovers of a capsule that is no longer listed.
            store.delete_capsule(&id)?;
            result.add_message(CmdMessage::info(format!("No capsule {} to delete.", id)));
            return Ok(result);
        }
        Err(e) => return Err(e),
    };

    let title = store
        .list_index()?
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.title)
        .unwrap_or_default();
    store.delete_capsule(&id)?;

    result.add_message(CmdMessage::success(format!("Capsule deleted: {}", title)));
    Ok(result)
}

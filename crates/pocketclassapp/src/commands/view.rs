use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DataStore;

use super::helpers::resolve_capsule;

/// Loads one capsule. With `search`, the notes containing the term are collected too.
pub fn run<S: DataStore>(store: &S, selector: &str, search: Option<&str>) -> Result<CmdResult> {
    let id = resolve_capsule(store, selector)?;
    let capsule = store.get_capsule(&id)?;
    let mut result = CmdResult::default();

    if let Some(term) = search {
        result.matching_notes = capsule
            .search_notes(term)
            .into_iter()
            .map(str::to_string)
            .collect();
        if result.matching_notes.is_empty() {
            result.add_message(CmdMessage::info(format!("No notes match \"{}\".", term)));
        }
    }

    Ok(result.with_capsules(vec![capsule]))
}

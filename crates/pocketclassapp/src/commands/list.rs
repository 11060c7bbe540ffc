use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::DataStore;

/// The library: every index entry in insertion order.
pub fn run<S: DataStore>(store: &S) -> Result<CmdResult> {
    let entries = store.list_index()?;
    Ok(CmdResult::default().with_listed_entries(entries))
}

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DataStore;

pub fn run<S: DataStore>(store: &mut S) -> Result<CmdResult> {
    let report = store.doctor()?;
    let mut result = CmdResult::default();

    if report.repaired() {
        result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
        if report.removed_entries > 0 {
            result.add_message(CmdMessage::info(format!(
                "  - Removed {} index entr{} without a capsule.",
                report.removed_entries,
                if report.removed_entries == 1 { "y" } else { "ies" }
            )));
        }
        if report.recovered_documents > 0 {
            result.add_message(CmdMessage::success(format!(
                "  - Recovered {} capsule(s) missing from the library.",
                report.recovered_documents
            )));
        }
    } else {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    }

    if !report.unreadable_documents.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "Left {} unreadable capsule(s) in place:",
            report.unreadable_documents.len()
        )));
        for key in &report.unreadable_documents {
            result.add_message(CmdMessage::info(format!("  - {}", key)));
        }
    }
    Ok(result)
}

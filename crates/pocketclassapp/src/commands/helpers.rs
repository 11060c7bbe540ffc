use crate::error::{ClassroomError, Result};
use crate::model::CapsuleId;
use crate::store::DataStore;

/// Resolves a user-supplied capsule reference.
///
/// A number from 1 up to the library size is a position in the listing; anything
/// else is taken as a capsule id. Millisecond ids of older capsules are far larger
/// than any listing, so they resolve as ids.
pub fn resolve_capsule<S: DataStore>(store: &S, selector: &str) -> Result<CapsuleId> {
    let selector = selector.trim();
    let index = store.list_index()?;

    if let Ok(position) = selector.parse::<usize>() {
        if (1..=index.len()).contains(&position) {
            return Ok(index[position - 1].id.clone());
        }
    }

    let id = CapsuleId::from(selector);
    if index.iter().any(|entry| entry.id == id) {
        Ok(id)
    } else {
        Err(ClassroomError::NotFound(id))
    }
}

use crate::error::Result;

/// Abstract interface for raw key-value storage.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// `CapsuleStore` handles the "what" (documents, index, auxiliary records).
/// Values are JSON text; the backend never interprets them.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if the key is absent.
    /// Returns Err only on actual I/O errors.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// MUST be atomic so a failed write leaves the previous value intact.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Whether `key` could ever hold a value. Reads and writes of other keys fail.
    fn accepts_key(&self, _key: &str) -> bool {
        true
    }
}

use super::capsule_store::CapsuleStore;
use super::fs_backend::FsBackend;
use std::path::PathBuf;

/// Capsule store backed by one JSON file per key.
pub type FileStore = CapsuleStore<FsBackend>;

impl FileStore {
    pub fn new_fs(root: PathBuf) -> Self {
        CapsuleStore::with_backend(FsBackend::new(root))
    }
}

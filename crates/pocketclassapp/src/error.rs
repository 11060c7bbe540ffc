use crate::model::CapsuleId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassroomError {
    /// Missing document. Corrupt documents collapse into this too.
    #[error("Capsule not found: {0}")]
    NotFound(CapsuleId),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),
}

impl ClassroomError {
    /// True for errors raised by the persistence layer rather than by the data itself.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            ClassroomError::StorageFailure(_)
                | ClassroomError::Io(_)
                | ClassroomError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClassroomError>;

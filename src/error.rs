use thiserror::Error;

use crate::store::PhotoId;

/// Everything that can go wrong between a user action and the photo store.
///
/// The view surfaces each of these to the user where it happens; they are
/// also returned so callers can see what a batch or deletion actually did.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GalleryError {
    #[error("{name}: unsupported file type '{media_type}'")]
    InvalidFileType { name: String, media_type: String },

    #[error("{name}: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Error reading file: {name}: {reason}")]
    FileReadError { name: String, reason: String },

    #[error("No valid image files in batch")]
    EmptyBatch,

    #[error("Failed to read '{key}' from storage: {reason}")]
    StorageReadFailure { key: String, reason: String },

    #[error("Failed to write '{key}' to storage: {reason}")]
    StorageWriteFailure { key: String, reason: String },

    #[error("Stored data under '{key}' is malformed: {reason}")]
    MalformedStoredData { key: String, reason: String },

    #[error("Stored data under '{key}' uses schema version {found}, newer than supported version {supported}")]
    UnsupportedSchemaVersion {
        key: String,
        found: u32,
        supported: u32,
    },

    #[error("No unused photo id is left")]
    IdsExhausted,

    #[error("Photo {0} is already stored")]
    DuplicateId(PhotoId),
}

pub type Result<T> = std::result::Result<T, GalleryError>;

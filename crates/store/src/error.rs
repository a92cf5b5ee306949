//! Document store error types

use ontograph_core::DocumentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

//! Error types for codec, protection and pipeline operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The byte stream is not a document this codec understands
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Wrong password")]
    WrongPassword,

    /// Page data was requested from a document that is still locked
    #[error("Document is locked")]
    Locked,

    #[error("Document is not locked")]
    NotLocked,

    #[error("Operation cancelled")]
    Cancelled,

    /// A background result was produced for a document that has since been replaced
    #[error("Result is stale (generation {submitted}, current {current})")]
    Stale { submitted: u64, current: u64 },

    #[error("Background task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

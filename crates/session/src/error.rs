//! Error types for session intents

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Edit error: {0}")]
    Edit(#[from] edit_engine::EditError),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    /// The open document is waiting for a password
    #[error("Document is locked")]
    Locked,

    /// The input needs a password that was not supplied
    #[error("Source document is password protected")]
    SourceLocked,

    #[error("No page is selected")]
    NoCurrentPage,
}

pub type Result<T> = std::result::Result<T, SessionError>;

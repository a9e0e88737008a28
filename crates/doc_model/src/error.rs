//! Error types for document model operations

use crate::{AnnotationId, PageId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocModelError {
    #[error("Page index {index} out of range (page count {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Annotation {annotation} not found on page {page}")]
    AnnotationNotFound { page: PageId, annotation: AnnotationId },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;

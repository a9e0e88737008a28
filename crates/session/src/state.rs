//! State published to the presentation layer

use doc_model::DocumentMetadata;
use serde::{Deserialize, Serialize};

/// Snapshot of everything the presentation layer renders from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub page_count: usize,
    /// Zero-based index of the focused page
    pub current_page: Option<usize>,
    pub metadata: DocumentMetadata,
    /// Keywords as shown in the metadata form
    pub keywords: String,
    /// Zero-based index of the selected search match
    pub search_index: Option<usize>,
    pub search_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_label: Option<String>,
    pub redo_label: Option<String>,
    pub locked: bool,
    /// Generation of the live document
    pub generation: u64,
    /// Size of the last accepted compression result
    pub compressed_size: Option<u64>,
}

/// What happened when bytes were opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenStatus {
    Opened { page_count: usize },
    /// A password is needed before any page can be shown
    NeedsPassword,
}

/// Outcome of importing a batch of images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub page_count: usize,
    /// One-based positions of inputs that could not be decoded
    pub skipped: Vec<usize>,
}

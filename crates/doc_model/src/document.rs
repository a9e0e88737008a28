//! Document: an ordered page container plus metadata

use crate::{DocModelError, DocumentId, Page, PageId, Result};
use serde::{Deserialize, Serialize};

/// Document information record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    /// Non-empty, trimmed keywords in their original order
    pub keywords: Vec<String>,
}

impl DocumentMetadata {
    /// Parse a comma-separated keyword string, dropping empty entries
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Keywords joined the way they are stored in the document info
    pub fn keywords_string(&self) -> String {
        self.keywords.join(", ")
    }

    pub fn set_keywords<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.author.is_empty()
            && self.subject.is_empty()
            && self.keywords.is_empty()
    }
}

/// A paginated document.
///
/// Index `n` is always the `(n + 1)`-th page in display order. Pages are
/// owned by exactly one document; moving a page between documents moves
/// the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    pages: Vec<Page>,
    metadata: DocumentMetadata,
    /// Size of the byte stream the document was loaded from, if any
    source_len: Option<u64>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            id: DocumentId::new(),
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            source_len: None,
        }
    }

    /// Create a document from pages in display order
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages, ..Self::new() }
    }

    /// Record the size of the backing byte stream
    pub fn with_source_len(mut self, len: u64) -> Self {
        self.source_len = Some(len);
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn source_len(&self) -> Option<u64> {
        self.source_len
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page identities in display order
    pub fn page_ids(&self) -> Vec<PageId> {
        self.pages.iter().map(Page::id).collect()
    }

    pub fn page(&self, index: usize) -> Result<&Page> {
        let len = self.pages.len();
        self.pages.get(index).ok_or(DocModelError::IndexOutOfRange { index, len })
    }

    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        let len = self.pages.len();
        self.pages.get_mut(index).ok_or(DocModelError::IndexOutOfRange { index, len })
    }

    /// Current index of a page identity
    pub fn index_of(&self, id: PageId) -> Result<usize> {
        self.pages
            .iter()
            .position(|p| p.id() == id)
            .ok_or(DocModelError::PageNotFound(id))
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.pages.iter().any(|p| p.id() == id)
    }

    pub fn page_by_id(&self, id: PageId) -> Result<&Page> {
        let index = self.index_of(id)?;
        Ok(&self.pages[index])
    }

    /// Insert a page at `index` in `[0, page_count]`, shifting later pages right
    pub fn insert(&mut self, page: Page, index: usize) -> Result<()> {
        let len = self.pages.len();
        if index > len {
            return Err(DocModelError::IndexOutOfRange { index, len });
        }
        if self.contains(page.id()) {
            return Err(DocModelError::InvalidOperation(format!(
                "page {} is already in this document",
                page.id()
            )));
        }
        self.pages.insert(index, page);
        Ok(())
    }

    /// Append a page at the end
    pub fn push_page(&mut self, page: Page) -> Result<usize> {
        let index = self.pages.len();
        self.insert(page, index)?;
        Ok(index)
    }

    /// Remove the page at `index`, shifting later pages left
    pub fn remove_page(&mut self, index: usize) -> Result<Page> {
        let len = self.pages.len();
        if index >= len {
            return Err(DocModelError::IndexOutOfRange { index, len });
        }
        Ok(self.pages.remove(index))
    }

    /// Consume the document and take its pages in display order
    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Replace the full metadata record, returning the previous one
    pub fn set_metadata(&mut self, metadata: DocumentMetadata) -> DocumentMetadata {
        std::mem::replace(&mut self.metadata, metadata)
    }

    /// An independently owned copy for background work
    pub fn snapshot(&self) -> Document {
        self.clone()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

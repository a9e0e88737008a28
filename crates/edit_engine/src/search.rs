//! Text search over page text and a cyclic cursor over the matches
//!
//! - [`FindOptions`] configures matching
//! - [`TextSearchIndex`] is the seam for whatever extracts page text
//! - [`PageTextIndex`] searches the text carried on each [`Page`]
//! - [`SearchNavigator`] keeps the ordered matches and the current one

use doc_model::{Document, Page, PageId};
use serde::{Deserialize, Serialize};

/// Characters of context kept on either side of a match
const CONTEXT_CHARS: usize = 20;

/// Options for find operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Case-sensitive search
    pub case_sensitive: bool,
    /// Match whole words only
    pub whole_word: bool,
}

impl FindOptions {
    /// Create a new FindOptions with default settings (case-insensitive)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case sensitivity
    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    /// Set whole word matching
    pub fn whole_word(mut self, value: bool) -> Self {
        self.whole_word = value;
        self
    }
}

/// One match location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// The page containing the match
    pub page: PageId,
    /// Index of that page when the search ran
    pub page_index: usize,
    /// Start offset within the page text (character index)
    pub start: usize,
    /// End offset within the page text (character index, exclusive)
    pub end: usize,
    /// The matched text as it appears on the page
    pub matched_text: String,
    /// Context around the match (for preview)
    pub context: String,
}

impl SearchMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Produces match locations for a query, in document order
pub trait TextSearchIndex {
    fn find(&self, document: &Document, query: &str, options: &FindOptions) -> Vec<SearchMatch>;
}

/// Searches the extracted text stored on each page
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTextIndex;

impl PageTextIndex {
    fn fold(c: char, case_sensitive: bool) -> char {
        if case_sensitive {
            return c;
        }
        // Only single-char lowercase mappings keep offsets aligned
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => l,
            _ => c,
        }
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn find_in_page(
        page: &Page,
        page_index: usize,
        needle: &[char],
        options: &FindOptions,
    ) -> Vec<SearchMatch> {
        let text: Vec<char> = page.text().chars().collect();
        if needle.len() > text.len() {
            return Vec::new();
        }
        let folded: Vec<char> =
            text.iter().map(|&c| Self::fold(c, options.case_sensitive)).collect();

        let mut matches = Vec::new();
        let mut start = 0;
        while start + needle.len() <= folded.len() {
            let end = start + needle.len();
            if folded[start..end] != *needle {
                start += 1;
                continue;
            }
            if options.whole_word {
                let before = start.checked_sub(1).map(|i| text[i]);
                let after = text.get(end).copied();
                if before.is_some_and(Self::is_word_char) || after.is_some_and(Self::is_word_char) {
                    start += 1;
                    continue;
                }
            }

            let context_start = start.saturating_sub(CONTEXT_CHARS);
            let context_end = (end + CONTEXT_CHARS).min(text.len());
            matches.push(SearchMatch {
                page: page.id(),
                page_index,
                start,
                end,
                matched_text: text[start..end].iter().collect(),
                context: text[context_start..context_end].iter().collect(),
            });
            // Matches never overlap
            start = end;
        }
        matches
    }
}

impl TextSearchIndex for PageTextIndex {
    fn find(&self, document: &Document, query: &str, options: &FindOptions) -> Vec<SearchMatch> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle: Vec<char> = query.chars().map(|c| Self::fold(c, options.case_sensitive)).collect();

        document
            .pages()
            .iter()
            .enumerate()
            .flat_map(|(index, page)| Self::find_in_page(page, index, &needle, options))
            .collect()
    }
}

/// Which page to bring into view for the selected match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationHint {
    pub page: PageId,
    pub page_index: usize,
}

/// Ordered search results with a wrapping cursor.
///
/// Matches are case-insensitive unless the options say otherwise.
#[derive(Debug)]
pub struct SearchNavigator<I = PageTextIndex> {
    index: I,
    options: FindOptions,
    query: String,
    results: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchNavigator<PageTextIndex> {
    pub fn new() -> Self {
        Self::with_index(PageTextIndex)
    }
}

impl Default for SearchNavigator<PageTextIndex> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: TextSearchIndex> SearchNavigator<I> {
    /// Use a different text source, e.g. one backed by a codec's text layer
    pub fn with_index(index: I) -> Self {
        Self {
            index,
            options: FindOptions::default(),
            query: String::new(),
            results: Vec::new(),
            current: None,
        }
    }

    pub fn with_options(mut self, options: FindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: FindOptions) {
        self.options = options;
    }

    /// Run a new search, discarding previous results. The cursor starts at
    /// the first match. Returns the number of matches.
    pub fn search(&mut self, document: &Document, query: &str) -> usize {
        self.query = query.to_string();
        self.results = if query.is_empty() {
            Vec::new()
        } else {
            self.index.find(document, query, &self.options)
        };
        self.current = if self.results.is_empty() { None } else { Some(0) };

        tracing::debug!("Search for {:?} found {} matches", query, self.results.len());
        self.results.len()
    }

    /// Advance to the next match, wrapping past the last one
    pub fn next(&mut self) -> Option<&SearchMatch> {
        self.step(1)
    }

    /// Step back to the previous match, wrapping before the first one
    pub fn previous(&mut self) -> Option<&SearchMatch> {
        let count = self.results.len();
        self.step(count.saturating_sub(1))
    }

    fn step(&mut self, by: usize) -> Option<&SearchMatch> {
        let count = self.results.len();
        let current = self.current?;
        let next = (current + by) % count;
        self.current = Some(next);
        self.results.get(next)
    }

    /// Advance to the next match whose page is still in `document`.
    /// Returns `None` only when no match has a page left.
    pub fn next_in(&mut self, document: &Document) -> Option<NavigationHint> {
        self.step_present(document, 1)
    }

    /// Step back to the previous match whose page is still in `document`
    pub fn previous_in(&mut self, document: &Document) -> Option<NavigationHint> {
        let count = self.results.len();
        self.step_present(document, count.saturating_sub(1))
    }

    fn step_present(&mut self, document: &Document, by: usize) -> Option<NavigationHint> {
        for _ in 0..self.results.len() {
            self.step(by)?;
            if let Some(hint) = self.hint(document) {
                return Some(hint);
            }
        }
        None
    }

    /// Select a specific match
    pub fn select(&mut self, index: usize) -> Option<&SearchMatch> {
        if index >= self.results.len() {
            return None;
        }
        self.current = Some(index);
        self.results.get(index)
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.current.and_then(|i| self.results.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[SearchMatch] {
        &self.results
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Page to show for the current match. The page is looked up by
    /// identity, so edits made since the search are accounted for; a page
    /// that has since been deleted yields `None`.
    pub fn hint(&self, document: &Document) -> Option<NavigationHint> {
        let current = self.current()?;
        let page_index = document.index_of(current.page).ok()?;
        Some(NavigationHint { page: current.page, page_index })
    }

    /// Drop results and query
    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::PageSize;

    fn create_test_doc() -> Document {
        Document::from_pages(vec![
            Page::blank(PageSize::LETTER).with_text("Invoice total due"),
            Page::blank(PageSize::LETTER).with_text("No matches here"),
            Page::blank(PageSize::LETTER).with_text("TOTAL: 40, subtotal: 35"),
        ])
    }

    #[test]
    fn test_find_is_case_insensitive_by_default() {
        let doc = create_test_doc();
        let results = PageTextIndex.find(&doc, "total", &FindOptions::new());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].page_index, 0);
        assert_eq!((results[0].start, results[0].end), (8, 13));
        assert_eq!(results[1].matched_text, "TOTAL");
        assert_eq!(results[2].page_index, 2);
    }

    #[test]
    fn test_find_options() {
        let doc = create_test_doc();
        let sensitive = PageTextIndex.find(&doc, "TOTAL", &FindOptions::new().case_sensitive(true));
        assert_eq!(sensitive.len(), 1);

        let words = PageTextIndex.find(&doc, "total", &FindOptions::new().whole_word(true));
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|m| m.matched_text.eq_ignore_ascii_case("total")));
    }

    #[test]
    fn test_find_unicode_offsets() {
        let doc = Document::from_pages(vec![Page::blank(PageSize::A4).with_text("Größe GRÖSSE größe")]);
        let results = PageTextIndex.find(&doc, "größe", &FindOptions::new());
        assert_eq!(results.len(), 2);
        assert_eq!((results[1].start, results[1].end), (13, 18));
        assert_eq!(results[1].matched_text, "größe");
    }

    #[test]
    fn test_cyclic_navigation() {
        let doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        assert_eq!(navigator.search(&doc, "total"), 3);
        assert_eq!(navigator.current_index(), Some(0));

        navigator.next();
        navigator.next();
        navigator.next();
        assert_eq!(navigator.current_index(), Some(0));

        navigator.previous();
        assert_eq!(navigator.current_index(), Some(2));
        assert_eq!(navigator.hint(&doc).map(|h| h.page_index), Some(2));
    }

    #[test]
    fn test_empty_query_clears_results() {
        let doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        navigator.search(&doc, "total");

        assert_eq!(navigator.search(&doc, ""), 0);
        assert_eq!(navigator.current(), None);
        assert!(navigator.next().is_none());
        assert!(navigator.previous().is_none());
    }

    #[test]
    fn test_new_query_resets_cursor() {
        let doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        navigator.search(&doc, "total");
        navigator.select(2);

        assert_eq!(navigator.search(&doc, "matches"), 1);
        assert_eq!(navigator.current_index(), Some(0));
        assert_eq!(navigator.current().map(|m| m.page_index), Some(1));
        // Single result wraps onto itself
        navigator.next();
        assert_eq!(navigator.current_index(), Some(0));
    }

    #[test]
    fn test_hint_follows_page_identity() {
        let mut doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        navigator.search(&doc, "matches");

        doc.remove_page(0).unwrap();
        assert_eq!(navigator.hint(&doc).map(|h| h.page_index), Some(0));

        doc.remove_page(0).unwrap();
        assert_eq!(navigator.hint(&doc), None);
    }

    #[test]
    fn test_stepping_skips_deleted_pages() {
        let mut doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        navigator.search(&doc, "total");
        let last_page = doc.page(2).unwrap().id();

        // Drop the first page; its match can no longer be shown
        doc.remove_page(0).unwrap();
        let hint = navigator.next_in(&doc).unwrap();
        assert_eq!((hint.page, hint.page_index), (last_page, 1));
        assert_eq!(navigator.current_index(), Some(1));

        let hint = navigator.next_in(&doc).unwrap();
        assert_eq!(hint.page_index, 1);
        assert_eq!(navigator.current_index(), Some(2));

        // Wrapping forward passes over the removed match at 0
        assert_eq!(navigator.next_in(&doc).map(|h| h.page_index), Some(1));
        assert_eq!(navigator.current_index(), Some(1));

        navigator.select(1);
        assert_eq!(navigator.previous_in(&doc).map(|h| h.page_index), Some(1));
        assert_eq!(navigator.current_index(), Some(2));
    }

    #[test]
    fn test_stepping_with_every_page_gone() {
        let mut doc = create_test_doc();
        let mut navigator = SearchNavigator::new();
        navigator.search(&doc, "total");
        while !doc.is_empty() {
            doc.remove_page(0).unwrap();
        }

        assert_eq!(navigator.next_in(&doc), None);
        assert_eq!(navigator.previous_in(&doc), None);
        assert_eq!(navigator.current_index(), Some(0));
    }
}

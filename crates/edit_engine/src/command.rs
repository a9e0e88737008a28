//! Command system for page editing
//!
//! Every command mutates the document in place and hands back the command
//! that reverses it. Inverses refer to pages by [`PageId`] and look up the
//! page's current index when they run, so they stay correct even if other
//! edits have shifted positions in between.

use crate::{EditError, Result};
use doc_model::{Document, Page, PageId};

/// Result of applying a command
#[derive(Debug)]
pub struct CommandResult {
    /// The inverse command (for undo)
    pub inverse: Box<dyn Command>,
    /// Page the caller should bring into view, if any
    pub focus: Option<usize>,
}

/// Trait for all editing commands.
///
/// `apply` is all-or-nothing: it validates before touching the document and
/// leaves it unchanged when it returns an error.
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document
    fn apply(&self, document: &mut Document) -> Result<CommandResult>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;

    /// Clone this command into a box
    fn clone_box(&self) -> Box<dyn Command>;
}

impl Clone for Box<dyn Command> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// How a command addresses the page it acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    /// Whatever page is at this index when the command runs
    Index(usize),
    /// A specific page, wherever it currently is
    Page(PageId),
}

impl PageTarget {
    fn resolve(&self, document: &Document) -> Result<usize> {
        match *self {
            PageTarget::Index(index) => {
                document.page(index)?;
                Ok(index)
            }
            PageTarget::Page(id) => Ok(document.index_of(id)?),
        }
    }
}

/// Where focus should go after removing the page at `removed_index`
pub(crate) fn focus_after_removal(document: &Document, removed_index: usize) -> Option<usize> {
    match document.page_count() {
        0 => None,
        count => Some(removed_index.min(count - 1)),
    }
}

/// Rotate a page by a multiple of 90 degrees
#[derive(Debug, Clone)]
pub struct RotatePage {
    pub page: PageId,
    pub degrees: i32,
}

impl RotatePage {
    pub fn new(page: PageId, degrees: i32) -> Self {
        Self { page, degrees }
    }
}

impl Command for RotatePage {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        if self.degrees % 90 != 0 {
            return Err(EditError::InvalidCommand(format!(
                "rotation must be a multiple of 90 degrees, got {}",
                self.degrees
            )));
        }

        let index = document.index_of(self.page)?;
        document.page_mut(index)?.rotate_by(self.degrees);

        Ok(CommandResult {
            inverse: Box::new(RotatePage::new(self.page, -self.degrees.rem_euclid(360))),
            focus: Some(index),
        })
    }

    fn display_name(&self) -> &str {
        "Rotate Page"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Insert a page object at an index
#[derive(Debug, Clone)]
pub struct InsertPage {
    pub page: Page,
    pub index: usize,
    name: &'static str,
}

impl InsertPage {
    pub fn new(page: Page, index: usize) -> Self {
        Self { page, index, name: "Insert Page" }
    }

    /// Use a different action label, e.g. "Paste Page"
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Command for InsertPage {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        // Clamped so an undo still lands when the document shrank meanwhile
        let index = self.index.min(document.page_count());
        document.insert(self.page.clone(), index)?;

        Ok(CommandResult {
            inverse: Box::new(DeletePage::by_id(self.page.id())),
            focus: Some(index),
        })
    }

    fn display_name(&self) -> &str {
        self.name
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Remove a page; the removed page object is kept by the inverse
#[derive(Debug, Clone)]
pub struct DeletePage {
    pub target: PageTarget,
}

impl DeletePage {
    pub fn at(index: usize) -> Self {
        Self { target: PageTarget::Index(index) }
    }

    pub fn by_id(page: PageId) -> Self {
        Self { target: PageTarget::Page(page) }
    }
}

impl Command for DeletePage {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let index = self.target.resolve(document)?;
        let page = document.remove_page(index)?;

        Ok(CommandResult {
            inverse: Box::new(InsertPage::new(page, index)),
            focus: focus_after_removal(document, index),
        })
    }

    fn display_name(&self) -> &str {
        "Delete Page"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Move a page so that it ends up at `destination` in the final order
#[derive(Debug, Clone)]
pub struct MovePage {
    pub page: PageId,
    pub destination: usize,
}

impl MovePage {
    pub fn new(page: PageId, destination: usize) -> Self {
        Self { page, destination }
    }
}

impl Command for MovePage {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let from = document.index_of(self.page)?;
        let page = document.remove_page(from)?;
        let destination = self.destination.min(document.page_count());
        document.insert(page, destination)?;

        Ok(CommandResult {
            inverse: Box::new(MovePage::new(self.page, from)),
            focus: Some(destination),
        })
    }

    fn display_name(&self) -> &str {
        "Move Page"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Insert several pages; each index is the page's position once inserted.
/// Entries are applied in ascending index order.
#[derive(Debug, Clone)]
pub struct InsertPages {
    pub entries: Vec<(usize, Page)>,
    name: &'static str,
}

impl InsertPages {
    pub fn new(mut entries: Vec<(usize, Page)>) -> Self {
        entries.sort_by_key(|(index, _)| *index);
        Self { entries, name: "Insert Pages" }
    }

    /// Append pages after the current last page of `document`
    pub fn append(document: &Document, pages: Vec<Page>) -> Self {
        let start = document.page_count();
        let entries = pages.into_iter().enumerate().map(|(i, p)| (start + i, p)).collect();
        Self { entries, name: "Merge Document" }
    }
}

impl Command for InsertPages {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let start_len = document.page_count();
        for (inserted, (index, page)) in self.entries.iter().enumerate() {
            if *index > start_len + inserted {
                return Err(doc_model::DocModelError::IndexOutOfRange {
                    index: *index,
                    len: start_len + inserted,
                }
                .into());
            }
            if document.contains(page.id()) {
                return Err(EditError::InvalidCommand(format!(
                    "page {} is already in the document",
                    page.id()
                )));
            }
        }

        for (index, page) in &self.entries {
            document.insert(page.clone(), *index)?;
        }

        Ok(CommandResult {
            inverse: Box::new(RemovePages::new(self.entries.iter().map(|(_, p)| p.id()).collect())),
            focus: self.entries.first().map(|(index, _)| *index),
        })
    }

    fn display_name(&self) -> &str {
        self.name
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Remove a set of pages by identity
#[derive(Debug, Clone)]
pub struct RemovePages {
    pub pages: Vec<PageId>,
}

impl RemovePages {
    pub fn new(pages: Vec<PageId>) -> Self {
        Self { pages }
    }
}

impl Command for RemovePages {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let mut indices = self
            .pages
            .iter()
            .map(|id| document.index_of(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        indices.sort_unstable();
        indices.dedup();

        // Remove back to front so earlier indices stay valid
        let mut removed = Vec::with_capacity(indices.len());
        for &index in indices.iter().rev() {
            removed.push((index, document.remove_page(index)?));
        }
        removed.reverse();

        let focus = indices.first().and_then(|&first| focus_after_removal(document, first));

        Ok(CommandResult {
            inverse: Box::new(InsertPages::new(removed)),
            focus,
        })
    }

    fn display_name(&self) -> &str {
        "Remove Pages"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Several commands undone and redone as one step
#[derive(Debug, Clone)]
pub struct CommandGroup {
    pub label: String,
    pub commands: Vec<Box<dyn Command>>,
}

impl CommandGroup {
    pub fn new(label: impl Into<String>, commands: Vec<Box<dyn Command>>) -> Self {
        Self { label: label.into(), commands }
    }
}

impl Command for CommandGroup {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let mut inverses: Vec<Box<dyn Command>> = Vec::with_capacity(self.commands.len());
        let mut focus = None;

        for command in &self.commands {
            match command.apply(document) {
                Ok(result) => {
                    focus = result.focus.or(focus);
                    inverses.push(result.inverse);
                }
                Err(e) => {
                    // Roll back what already ran
                    for inverse in inverses.iter().rev() {
                        if let Err(rollback) = inverse.apply(document) {
                            tracing::warn!("Rollback of {} failed: {}", inverse.display_name(), rollback);
                        }
                    }
                    return Err(e);
                }
            }
        }

        inverses.reverse();
        Ok(CommandResult {
            inverse: Box::new(CommandGroup::new(self.label.clone(), inverses)),
            focus,
        })
    }

    fn display_name(&self) -> &str {
        &self.label
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::PageSize;

    fn create_test_doc(n: usize) -> (Document, Vec<PageId>) {
        let pages: Vec<Page> = (0..n).map(|_| Page::blank(PageSize::LETTER)).collect();
        let doc = Document::from_pages(pages);
        let ids = doc.page_ids();
        (doc, ids)
    }

    #[test]
    fn test_rotate_and_inverse() {
        let (mut doc, ids) = create_test_doc(2);
        let result = RotatePage::new(ids[1], 90).apply(&mut doc).unwrap();
        assert_eq!(doc.page(1).unwrap().rotation(), 90);
        assert_eq!(result.focus, Some(1));

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page(1).unwrap().rotation(), 0);
    }

    #[test]
    fn test_rotate_rejects_partial_turns() {
        let (mut doc, ids) = create_test_doc(1);
        let err = RotatePage::new(ids[0], 45).apply(&mut doc).unwrap_err();
        assert!(matches!(err, EditError::InvalidCommand(_)));
        assert_eq!(doc.page(0).unwrap().rotation(), 0);
    }

    #[test]
    fn test_delete_restores_same_page_object() {
        let (mut doc, ids) = create_test_doc(3);
        let result = DeletePage::at(1).apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), vec![ids[0], ids[2]]);
        assert_eq!(result.focus, Some(1));

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), ids);
    }

    #[test]
    fn test_delete_last_page_focus() {
        let (mut doc, _) = create_test_doc(2);
        assert_eq!(DeletePage::at(1).apply(&mut doc).unwrap().focus, Some(0));
        assert_eq!(DeletePage::at(0).apply(&mut doc).unwrap().focus, None);
    }

    #[test]
    fn test_move_inverse_resolves_current_index() {
        let (mut doc, ids) = create_test_doc(3);
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        let result = MovePage::new(a, 2).apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), vec![b, c, a]);

        // An edit the move's inverse knows nothing about
        let b_index = doc.index_of(b).unwrap();
        doc.remove_page(b_index).unwrap();

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), vec![a, c]);
    }

    #[test]
    fn test_insert_pages_validates_before_mutating() {
        let (mut doc, ids) = create_test_doc(1);
        let dup = doc.page(0).unwrap().clone();
        let cmd = InsertPages::new(vec![(1, Page::blank(PageSize::A4)), (2, dup)]);

        assert!(cmd.apply(&mut doc).is_err());
        assert_eq!(doc.page_ids(), ids);
    }

    #[test]
    fn test_remove_pages_round_trip() {
        let (mut doc, ids) = create_test_doc(5);
        let result = RemovePages::new(vec![ids[3], ids[1]]).apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), vec![ids[0], ids[2], ids[4]]);
        assert_eq!(result.focus, Some(1));

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), ids);
    }

    #[test]
    fn test_group_rolls_back_on_failure() {
        let (mut doc, ids) = create_test_doc(2);
        let group = CommandGroup::new(
            "Batch",
            vec![
                Box::new(RotatePage::new(ids[0], 90)),
                Box::new(DeletePage::at(0)),
                Box::new(DeletePage::at(5)),
            ],
        );

        assert!(group.apply(&mut doc).is_err());
        assert_eq!(doc.page_ids(), ids);
        assert_eq!(doc.page(0).unwrap().rotation(), 0);
    }

    #[test]
    fn test_group_inverse_runs_in_reverse() {
        let (mut doc, ids) = create_test_doc(3);
        let group = CommandGroup::new(
            "Reorder",
            vec![Box::new(MovePage::new(ids[0], 2)), Box::new(DeletePage::at(0))],
        );

        let result = group.apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), vec![ids[2], ids[0]]);

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page_ids(), ids);
    }
}

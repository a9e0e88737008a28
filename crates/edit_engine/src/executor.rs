//! Page editing engine
//!
//! Owns the live document and its undo history. Every public edit validates,
//! mutates, records its inverse and reports an [`EditOutcome`]; expected
//! edge cases (empty document, bad index) never surface as panics or errors.

use crate::{
    AddAnnotation, Command, DeletePage, EditError, InsertPage, InsertPages, MovePage,
    RemoveAnnotation, Result, RotatePage, SetMetadata, UndoManager,
};
use doc_model::{
    Annotation, AnnotationId, DocModelError, Document, DocumentMetadata, Page, PageBox, PageId,
    PageSize,
};

/// What happened to a requested edit
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The document changed and the inverse was recorded
    Applied {
        label: String,
        /// Page index the caller should focus, `None` if the document is empty
        focus: Option<usize>,
    },
    /// Nothing to do (empty document, index past the end)
    NoOp,
    /// Validation failed; the document is unchanged
    Rejected(EditError),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }

    pub fn focus(&self) -> Option<usize> {
        match self {
            EditOutcome::Applied { focus, .. } => *focus,
            _ => None,
        }
    }
}

/// Result of a successful undo or redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub label: String,
    pub focus: Option<usize>,
}

/// The main editing engine that manages document state and command execution
#[derive(Debug)]
pub struct EditingEngine {
    /// Current document
    document: Document,
    /// Undo manager
    undo_manager: UndoManager,
    /// Size used for blank pages in an empty document
    blank_page_size: PageSize,
}

impl EditingEngine {
    /// Create an editing engine for a document
    pub fn new(document: Document) -> Self {
        Self::with_undo_manager(document, UndoManager::new())
    }

    pub fn with_undo_manager(document: Document, undo_manager: UndoManager) -> Self {
        Self { document, undo_manager, blank_page_size: PageSize::default() }
    }

    /// Size for blank pages when there is no neighbouring page to copy
    pub fn with_blank_page_size(mut self, size: PageSize) -> Self {
        self.blank_page_size = size;
        self
    }

    /// Get the current document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Swap in a different document; history of the old one is discarded
    pub fn replace_document(&mut self, document: Document) -> Document {
        self.undo_manager.clear();
        std::mem::replace(&mut self.document, document)
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// Execute a command and record its inverse
    pub fn execute(&mut self, command: Box<dyn Command>) -> EditOutcome {
        let label = command.display_name().to_string();
        match command.apply(&mut self.document) {
            Ok(result) => {
                tracing::debug!("Applied {} (focus {:?})", label, result.focus);
                self.undo_manager.record(result.inverse, label.clone());
                EditOutcome::Applied { label, focus: result.focus }
            }
            Err(e) => {
                tracing::debug!("Rejected {}: {}", label, e);
                EditOutcome::Rejected(e)
            }
        }
    }

    /// Rotate a page by a multiple of 90 degrees
    pub fn rotate(&mut self, page: PageId, degrees: i32) -> EditOutcome {
        self.execute(Box::new(RotatePage::new(page, degrees)))
    }

    /// Rotate the page at `index`
    pub fn rotate_at(&mut self, index: usize, degrees: i32) -> EditOutcome {
        match self.document.page(index) {
            Ok(page) => {
                let id = page.id();
                self.rotate(id, degrees)
            }
            Err(e) => EditOutcome::Rejected(e.into()),
        }
    }

    /// Delete the page at `index`; a no-op for an empty document or an index
    /// past the end
    pub fn delete_page(&mut self, index: usize) -> EditOutcome {
        if index >= self.document.page_count() {
            return EditOutcome::NoOp;
        }
        self.execute(Box::new(DeletePage::at(index)))
    }

    /// Insert a page at `index` in `[0, page_count]`
    pub fn insert_page(&mut self, page: Page, index: usize) -> EditOutcome {
        self.insert_page_named(page, index, "Insert Page")
    }

    /// Insert a page that came from outside the document (e.g. a clipboard)
    pub fn paste_page(&mut self, page: Page, index: usize) -> EditOutcome {
        self.insert_page_named(page, index, "Paste Page")
    }

    fn insert_page_named(&mut self, page: Page, index: usize, name: &'static str) -> EditOutcome {
        let len = self.document.page_count();
        if index > len {
            return EditOutcome::Rejected(DocModelError::IndexOutOfRange { index, len }.into());
        }
        self.execute(Box::new(InsertPage::new(page, index).named(name)))
    }

    /// Move a page so it ends up at index `to` in the resulting order.
    ///
    /// With pages `[A, B, C]`, `move_page(0, 2)` yields `[B, C, A]`.
    pub fn move_page(&mut self, from: usize, to: usize) -> EditOutcome {
        let len = self.document.page_count();
        let page = match self.document.page(from) {
            Ok(page) => page.id(),
            Err(e) => return EditOutcome::Rejected(e.into()),
        };
        if to >= len {
            return EditOutcome::Rejected(DocModelError::IndexOutOfRange { index: to, len }.into());
        }
        if from == to {
            return EditOutcome::NoOp;
        }
        self.execute(Box::new(MovePage::new(page, to)))
    }

    /// Move a page to a drop offset in `[0, page_count]` measured in the
    /// order before the move, as list drag-and-drop reports it.
    ///
    /// The page is removed first, so an offset past `from` lands one slot
    /// earlier: with `[A, B, C]`, `move_page_to_offset(0, 2)` yields `[B, A, C]`.
    pub fn move_page_to_offset(&mut self, from: usize, offset: usize) -> EditOutcome {
        let len = self.document.page_count();
        if offset > len {
            return EditOutcome::Rejected(DocModelError::IndexOutOfRange { index: offset, len }.into());
        }
        let destination = if offset > from { offset - 1 } else { offset };
        self.move_page(from, destination)
    }

    /// Insert a blank page at `index`, sized like the page before it (or the
    /// first page, or the configured default for an empty document)
    pub fn insert_blank_page(&mut self, index: usize) -> EditOutcome {
        let size = self.blank_size_for(index);
        self.insert_page_named(Page::blank(size), index, "Insert Blank Page")
    }

    /// Append a blank page at the end
    pub fn append_blank_page(&mut self) -> EditOutcome {
        self.insert_blank_page(self.document.page_count())
    }

    fn blank_size_for(&self, index: usize) -> PageSize {
        let neighbour = index.checked_sub(1).and_then(|i| self.document.page(i).ok());
        neighbour
            .or_else(|| self.document.pages().first())
            .map(|page| page.bounds(PageBox::Crop).size())
            .unwrap_or(self.blank_page_size)
    }

    /// Append every page of `source` in order. Pages whose identity already
    /// exists in this document are deep-copied. Undo removes the whole block.
    pub fn merge_append(&mut self, source: Document) -> EditOutcome {
        if source.is_empty() {
            return EditOutcome::NoOp;
        }
        let pages = source
            .into_pages()
            .into_iter()
            .map(|page| if self.document.contains(page.id()) { page.duplicate() } else { page })
            .collect();
        self.execute(Box::new(InsertPages::append(&self.document, pages)))
    }

    /// Place an annotation on top of a page's existing annotations
    pub fn add_annotation(&mut self, page: PageId, annotation: Annotation) -> EditOutcome {
        self.execute(Box::new(AddAnnotation::new(page, annotation)))
    }

    /// Place a signature stamp centred on a page
    pub fn add_signature(&mut self, page: PageId, image: doc_model::EmbeddedImage) -> EditOutcome {
        let bounds = match self.document.page_by_id(page) {
            Ok(p) => p.bounds(PageBox::Crop),
            Err(e) => return EditOutcome::Rejected(e.into()),
        };
        let stamp = Annotation::centered_stamp(bounds, image);
        self.execute(Box::new(AddAnnotation::new(page, stamp).named("Add Signature")))
    }

    pub fn remove_annotation(&mut self, page: PageId, annotation: AnnotationId) -> EditOutcome {
        self.execute(Box::new(RemoveAnnotation::new(page, annotation)))
    }

    /// Replace the document info record
    pub fn set_metadata(&mut self, metadata: DocumentMetadata) -> EditOutcome {
        if &metadata == self.document.metadata() {
            return EditOutcome::NoOp;
        }
        self.execute(Box::new(SetMetadata::new(metadata)))
    }

    /// Undo the last edit
    pub fn undo(&mut self) -> Result<HistoryStep> {
        let entry = self.undo_manager.pop_undo()?;
        // The inverse's own inverse is the redo command; it is not recorded
        // as a new edit
        let result = entry.command.apply(&mut self.document).map_err(|e| {
            tracing::warn!("Undo of {} failed, dropping it: {}", entry.label, e);
            e
        })?;

        tracing::debug!("Undid {}", entry.label);
        let step = HistoryStep { label: entry.label.clone(), focus: result.focus };
        self.undo_manager.push_redo(entry.label, result.inverse);
        Ok(step)
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Result<HistoryStep> {
        let entry = self.undo_manager.pop_redo()?;
        let result = entry.command.apply(&mut self.document).map_err(|e| {
            tracing::warn!("Redo of {} failed, dropping it: {}", entry.label, e);
            e
        })?;

        tracing::debug!("Redid {}", entry.label);
        let step = HistoryStep { label: entry.label.clone(), focus: result.focus };
        self.undo_manager.push_undo_after_redo(entry.label, result.inverse);
        Ok(step)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    pub fn undo_action_name(&self) -> Option<&str> {
        self.undo_manager.undo_action_name()
    }

    pub fn redo_action_name(&self) -> Option<&str> {
        self.undo_manager.redo_action_name()
    }

    /// Start bundling edits into a single undo step
    pub fn begin_group(&mut self, label: impl Into<String>) {
        self.undo_manager.begin_group(label);
    }

    /// Finish the bundle started by [`begin_group`](Self::begin_group)
    pub fn end_group(&mut self) -> Result<bool> {
        self.undo_manager.end_group()
    }
}

impl Default for EditingEngine {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{EmbeddedImage, ImageEncoding, Rect};

    fn engine_with(n: usize) -> (EditingEngine, Vec<PageId>) {
        let pages = (0..n).map(|_| Page::blank(PageSize::LETTER)).collect();
        let engine = EditingEngine::new(Document::from_pages(pages));
        let ids = engine.document().page_ids();
        (engine, ids)
    }

    #[test]
    fn test_rotate_normalizes_and_undoes() {
        let (mut engine, ids) = engine_with(1);
        assert!(engine.rotate(ids[0], 450).is_applied());
        assert!(engine.rotate(ids[0], -90).is_applied());
        assert_eq!(engine.document().page(0).unwrap().rotation(), 0);

        engine.undo().unwrap();
        assert_eq!(engine.document().page(0).unwrap().rotation(), 90);
        engine.undo().unwrap();
        assert_eq!(engine.document().page(0).unwrap().rotation(), 0);
    }

    #[test]
    fn test_delete_page_focus_and_noop() {
        let (mut engine, ids) = engine_with(3);
        assert_eq!(engine.delete_page(2).focus(), Some(1));
        assert_eq!(engine.delete_page(7), EditOutcome::NoOp);

        let step = engine.undo().unwrap();
        assert_eq!(step.label, "Delete Page");
        assert_eq!(step.focus, Some(2));
        assert_eq!(engine.document().page_ids(), ids);
    }

    #[test]
    fn test_delete_on_empty_document_is_noop() {
        let mut engine = EditingEngine::default();
        assert_eq!(engine.delete_page(0), EditOutcome::NoOp);
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_delete_only_page_clears_focus() {
        let (mut engine, _) = engine_with(1);
        assert_eq!(engine.delete_page(0), EditOutcome::Applied { label: "Delete Page".into(), focus: None });
    }

    #[test]
    fn test_insert_out_of_range_is_rejected() {
        let (mut engine, _) = engine_with(1);
        let outcome = engine.insert_page(Page::blank(PageSize::A4), 3);
        assert_eq!(
            outcome,
            EditOutcome::Rejected(EditError::DocModel(DocModelError::IndexOutOfRange { index: 3, len: 1 }))
        );
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_move_semantics() {
        let (mut engine, ids) = engine_with(3);
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        engine.move_page(0, 2);
        assert_eq!(engine.document().page_ids(), vec![b, c, a]);
        engine.undo().unwrap();
        assert_eq!(engine.document().page_ids(), vec![a, b, c]);

        engine.move_page_to_offset(0, 2);
        assert_eq!(engine.document().page_ids(), vec![b, a, c]);
        engine.move_page_to_offset(2, 0);
        assert_eq!(engine.document().page_ids(), vec![c, b, a]);

        assert!(matches!(engine.move_page(0, 3), EditOutcome::Rejected(_)));
        assert!(matches!(engine.move_page(5, 0), EditOutcome::Rejected(_)));
        assert_eq!(engine.move_page(1, 1), EditOutcome::NoOp);
    }

    #[test]
    fn test_undo_move_after_unrecorded_delete() {
        let (mut engine, ids) = engine_with(3);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        engine.move_page(0, 2);

        // Mutate behind the engine's back, as another collaborator might
        engine.document.remove_page(0).unwrap();
        assert_eq!(engine.document().page_ids(), vec![c, a]);

        engine.undo().unwrap();
        assert_eq!(engine.document().page_ids(), vec![a, c]);
        assert!(!engine.document().contains(b));
    }

    #[test]
    fn test_new_edit_invalidates_redo() {
        let (mut engine, ids) = engine_with(2);
        engine.rotate(ids[0], 90);
        engine.undo().unwrap();
        assert!(engine.can_redo());

        engine.delete_page(1);
        assert!(!engine.can_redo());
        assert!(matches!(
            engine.redo(),
            Err(EditError::EmptyHistory(crate::HistoryDirection::Redo))
        ));
    }

    #[test]
    fn test_redo_replays_edit() {
        let (mut engine, ids) = engine_with(3);
        engine.move_page(2, 0);
        engine.undo().unwrap();
        assert_eq!(engine.redo_action_name(), Some("Move Page"));

        engine.redo().unwrap();
        assert_eq!(engine.document().page_ids(), vec![ids[2], ids[0], ids[1]]);
        assert!(engine.can_undo());
        assert!(!engine.can_redo());

        engine.undo().unwrap();
        assert_eq!(engine.document().page_ids(), ids);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut engine = EditingEngine::default();
        assert_eq!(
            engine.undo().unwrap_err(),
            EditError::EmptyHistory(crate::HistoryDirection::Undo)
        );
    }

    #[test]
    fn test_blank_page_sizes() {
        let mut engine = EditingEngine::default().with_blank_page_size(PageSize::A4);
        engine.append_blank_page();
        assert_eq!(engine.document().page(0).unwrap().display_size(), PageSize::A4);

        engine.insert_page(Page::blank(PageSize::new(300.0, 400.0)), 1);
        engine.insert_blank_page(2);
        assert_eq!(engine.document().page(2).unwrap().display_size(), PageSize::new(300.0, 400.0));

        engine.insert_blank_page(0);
        assert_eq!(engine.document().page(0).unwrap().display_size(), PageSize::A4);
        assert_eq!(engine.undo_action_name(), Some("Insert Blank Page"));
    }

    #[test]
    fn test_merge_append_and_undo_as_block() {
        let (mut engine, ids) = engine_with(2);
        let source = Document::from_pages(vec![Page::blank(PageSize::A4), Page::blank(PageSize::A4)]);
        let source_ids = source.page_ids();

        assert_eq!(engine.merge_append(source).focus(), Some(2));
        let mut expected = ids.clone();
        expected.extend(source_ids);
        assert_eq!(engine.document().page_ids(), expected);

        engine.undo().unwrap();
        assert_eq!(engine.document().page_ids(), ids);
    }

    #[test]
    fn test_merge_with_itself_copies_pages() {
        let (mut engine, ids) = engine_with(2);
        let copy = engine.document().snapshot();
        assert!(engine.merge_append(copy).is_applied());

        let merged = engine.document().page_ids();
        assert_eq!(merged.len(), 4);
        assert_eq!(&merged[..2], &ids[..]);
        assert!(!ids.contains(&merged[2]));
    }

    #[test]
    fn test_signature_is_centered_and_undoable() {
        let (mut engine, ids) = engine_with(1);
        let image = EmbeddedImage::new(1, 1, ImageEncoding::Rgba8, vec![0, 0, 0, 255]);

        let outcome = engine.add_signature(ids[0], image);
        assert_eq!(outcome, EditOutcome::Applied { label: "Add Signature".into(), focus: Some(0) });
        let page = engine.document().page(0).unwrap();
        assert_eq!(page.annotations()[0].bounds, Rect::new(231.0, 371.0, 150.0, 50.0));

        engine.undo().unwrap();
        assert!(engine.document().page(0).unwrap().annotations().is_empty());
        engine.redo().unwrap();
        assert_eq!(engine.document().page(0).unwrap().annotations().len(), 1);
    }

    #[test]
    fn test_metadata_edit() {
        let (mut engine, _) = engine_with(1);
        let metadata = DocumentMetadata { author: "Ana".into(), ..Default::default() };
        assert!(engine.set_metadata(metadata.clone()).is_applied());
        assert_eq!(engine.set_metadata(metadata), EditOutcome::NoOp);
        engine.undo().unwrap();
        assert!(engine.document().metadata().is_empty());
    }

    #[test]
    fn test_grouped_edits_undo_together() {
        let (mut engine, ids) = engine_with(3);
        engine.begin_group("Rotate All");
        for id in &ids {
            engine.rotate(*id, 90);
        }
        assert!(engine.end_group().unwrap());

        let step = engine.undo().unwrap();
        assert_eq!(step.label, "Rotate All");
        assert!(engine.document().pages().iter().all(|p| p.rotation() == 0));
        assert!(!engine.can_undo());

        engine.redo().unwrap();
        assert!(engine.document().pages().iter().all(|p| p.rotation() == 90));
    }

    #[test]
    fn test_replace_document_clears_history() {
        let (mut engine, ids) = engine_with(2);
        engine.rotate(ids[0], 180);
        let old = engine.replace_document(Document::new());
        assert_eq!(old.page_ids(), ids);
        assert!(!engine.can_undo());
        assert_eq!(engine.page_count(), 0);
    }
}

//! Annotation and document-info commands

use crate::{Command, CommandResult, Result};
use doc_model::{Annotation, AnnotationId, Document, DocumentMetadata, PageId};

/// Place an annotation on a page
#[derive(Debug, Clone)]
pub struct AddAnnotation {
    pub page: PageId,
    pub annotation: Annotation,
    /// Z-order slot; `None` places it on top
    pub slot: Option<usize>,
    name: &'static str,
}

impl AddAnnotation {
    pub fn new(page: PageId, annotation: Annotation) -> Self {
        Self { page, annotation, slot: None, name: "Add Annotation" }
    }

    pub fn at_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Command for AddAnnotation {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let index = document.index_of(self.page)?;
        let page = document.page_mut(index)?;
        match self.slot {
            Some(slot) => page.insert_annotation(slot, self.annotation.clone()),
            None => page.push_annotation(self.annotation.clone()),
        };

        Ok(CommandResult {
            inverse: Box::new(RemoveAnnotation::new(self.page, self.annotation.id())),
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

/// Take an annotation off a page
#[derive(Debug, Clone)]
pub struct RemoveAnnotation {
    pub page: PageId,
    pub annotation: AnnotationId,
}

impl RemoveAnnotation {
    pub fn new(page: PageId, annotation: AnnotationId) -> Self {
        Self { page, annotation }
    }
}

impl Command for RemoveAnnotation {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let index = document.index_of(self.page)?;
        let (slot, annotation) = document.page_mut(index)?.remove_annotation(self.annotation)?;

        Ok(CommandResult {
            inverse: Box::new(AddAnnotation::new(self.page, annotation).at_slot(slot)),
            focus: Some(index),
        })
    }

    fn display_name(&self) -> &str {
        "Remove Annotation"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

/// Replace the whole metadata record
#[derive(Debug, Clone)]
pub struct SetMetadata {
    pub metadata: DocumentMetadata,
}

impl SetMetadata {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self { metadata }
    }
}

impl Command for SetMetadata {
    fn apply(&self, document: &mut Document) -> Result<CommandResult> {
        let previous = document.set_metadata(self.metadata.clone());
        Ok(CommandResult {
            inverse: Box::new(SetMetadata::new(previous)),
            focus: None,
        })
    }

    fn display_name(&self) -> &str {
        "Edit Document Info"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Page, PageSize, Rect};

    fn create_test_doc() -> (Document, PageId) {
        let doc = Document::from_pages(vec![Page::blank(PageSize::LETTER), Page::blank(PageSize::LETTER)]);
        let id = doc.page(1).unwrap().id();
        (doc, id)
    }

    #[test]
    fn test_add_and_remove_annotation() {
        let (mut doc, page) = create_test_doc();
        let note = Annotation::note(Rect::new(10.0, 10.0, 20.0, 20.0), "sign here");
        let note_id = note.id();

        let result = AddAnnotation::new(page, note).apply(&mut doc).unwrap();
        assert_eq!(result.focus, Some(1));
        assert_eq!(doc.page(1).unwrap().annotations().len(), 1);

        result.inverse.apply(&mut doc).unwrap();
        assert!(doc.page(1).unwrap().annotation_index(note_id).is_none());
    }

    #[test]
    fn test_remove_restores_z_order_slot() {
        let (mut doc, page) = create_test_doc();
        let notes: Vec<Annotation> =
            (0..3).map(|i| Annotation::note(Rect::default(), format!("n{i}"))).collect();
        let middle = notes[1].id();
        for note in notes {
            AddAnnotation::new(page, note).apply(&mut doc).unwrap();
        }

        let result = RemoveAnnotation::new(page, middle).apply(&mut doc).unwrap();
        assert_eq!(doc.page(1).unwrap().annotations().len(), 2);

        result.inverse.apply(&mut doc).unwrap();
        assert_eq!(doc.page(1).unwrap().annotation_index(middle), Some(1));
    }

    #[test]
    fn test_remove_missing_annotation_fails() {
        let (mut doc, page) = create_test_doc();
        let missing = Annotation::note(Rect::default(), "x").id();
        assert!(RemoveAnnotation::new(page, missing).apply(&mut doc).is_err());
    }

    #[test]
    fn test_set_metadata_inverse() {
        let (mut doc, _) = create_test_doc();
        let metadata = DocumentMetadata {
            title: "Quarterly".into(),
            keywords: vec!["finance".into()],
            ..Default::default()
        };

        let result = SetMetadata::new(metadata.clone()).apply(&mut doc).unwrap();
        assert_eq!(doc.metadata(), &metadata);

        result.inverse.apply(&mut doc).unwrap();
        assert!(doc.metadata().is_empty());
    }
}

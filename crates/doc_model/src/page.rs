//! Page entity

use crate::{Annotation, AnnotationId, DocModelError, EmbeddedImage, PageId, PageSize, Rect, Result};
use serde::{Deserialize, Serialize};

/// Normalize a rotation in degrees to `[0, 360)`
pub fn normalize_rotation(degrees: i32) -> u16 {
    degrees.rem_euclid(360) as u16
}

/// Reference boxes a page can report bounds for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageBox {
    Media,
    Crop,
}

/// What is drawn on the page underneath its annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PageContent {
    Blank,
    /// A full-page raster, e.g. a page imported from a photo or scan
    Image(EmbeddedImage),
}

/// One page of a document.
///
/// Cloning a page keeps its identity; use [`Page::duplicate`] for an
/// independent copy with fresh ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    id: PageId,
    rotation: u16,
    media_box: Rect,
    crop_box: Option<Rect>,
    annotations: Vec<Annotation>,
    content: PageContent,
    /// Extracted text layer used for search
    text: String,
}

impl Page {
    /// Create a blank page of the given size
    pub fn blank(size: PageSize) -> Self {
        Self::with_content(Rect::from_size(size), PageContent::Blank)
    }

    /// Create a page that shows `image` scaled to `size`
    pub fn from_image(image: EmbeddedImage, size: PageSize) -> Self {
        Self::with_content(Rect::from_size(size), PageContent::Image(image))
    }

    pub fn with_content(media_box: Rect, content: PageContent) -> Self {
        Self {
            id: PageId::new(),
            rotation: 0,
            media_box,
            crop_box: None,
            annotations: Vec::new(),
            content,
            text: String::new(),
        }
    }

    /// Set the crop box
    pub fn with_crop_box(mut self, crop_box: Rect) -> Self {
        self.crop_box = Some(crop_box);
        self
    }

    /// Set the extracted text layer
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// Rotation in degrees, always one of 0, 90, 180, 270
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Rotate by `degrees` (which may be negative) and return the new rotation
    pub fn rotate_by(&mut self, degrees: i32) -> u16 {
        self.rotation = normalize_rotation(self.rotation as i32 + degrees.rem_euclid(360));
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = normalize_rotation(degrees);
    }

    /// Bounds of a reference box; the crop box falls back to the media box
    pub fn bounds(&self, page_box: PageBox) -> Rect {
        match page_box {
            PageBox::Media => self.media_box,
            PageBox::Crop => self.crop_box.unwrap_or(self.media_box),
        }
    }

    /// Size of the crop box as displayed, with width and height swapped
    /// for quarter turns
    pub fn display_size(&self) -> PageSize {
        let size = self.bounds(PageBox::Crop).size();
        if self.rotation % 180 == 90 {
            PageSize::new(size.height, size.width)
        } else {
            size
        }
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    pub fn set_content(&mut self, content: PageContent) {
        self.content = content;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation_index(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id() == id)
    }

    /// Insert an annotation at `index` in z-order (clamped to the end)
    pub fn insert_annotation(&mut self, index: usize, annotation: Annotation) -> usize {
        let index = index.min(self.annotations.len());
        self.annotations.insert(index, annotation);
        index
    }

    pub fn push_annotation(&mut self, annotation: Annotation) -> usize {
        self.insert_annotation(self.annotations.len(), annotation)
    }

    /// Remove an annotation, returning it with the z-order slot it occupied
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Result<(usize, Annotation)> {
        let index = self.annotation_index(id).ok_or(DocModelError::AnnotationNotFound {
            page: self.id,
            annotation: id,
        })?;
        Ok((index, self.annotations.remove(index)))
    }

    /// Deep copy with a new page id and new annotation ids
    pub fn duplicate(&self) -> Page {
        Page {
            id: PageId::new(),
            rotation: self.rotation,
            media_box: self.media_box,
            crop_box: self.crop_box,
            annotations: self
                .annotations
                .iter()
                .map(|a| Annotation::new(a.bounds, a.kind.clone()))
                .collect(),
            content: self.content.clone(),
            text: self.text.clone(),
        }
    }
}

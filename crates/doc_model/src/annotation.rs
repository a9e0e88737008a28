//! Annotations placed on pages
//!
//! Annotations are a closed set of variants. Renderers and exporters walk
//! them with an [`AnnotationVisitor`] instead of relying on subclassing.

use crate::{AnnotationId, EmbeddedImage, Point, Rect};
use serde::{Deserialize, Serialize};

/// Default size of a signature stamp, in points
pub const STAMP_WIDTH: f32 = 150.0;
pub const STAMP_HEIGHT: f32 = 50.0;

/// The payload of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// An image stamp, e.g. a scanned or drawn signature
    Stamp { image: EmbeddedImage },
    /// Freehand strokes in page space
    Ink { strokes: Vec<Vec<Point>>, line_width: f32 },
    /// A sticky note
    Note { contents: String },
}

/// An object placed on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    pub bounds: Rect,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(bounds: Rect, kind: AnnotationKind) -> Self {
        Self { id: AnnotationId::new(), bounds, kind }
    }

    /// A stamp of the default signature size centred in `page_bounds`
    pub fn centered_stamp(page_bounds: Rect, image: EmbeddedImage) -> Self {
        Self::new(
            page_bounds.centered(STAMP_WIDTH, STAMP_HEIGHT),
            AnnotationKind::Stamp { image },
        )
    }

    pub fn ink(strokes: Vec<Vec<Point>>, line_width: f32) -> Self {
        let bounds = stroke_bounds(&strokes);
        Self::new(bounds, AnnotationKind::Ink { strokes, line_width })
    }

    pub fn note(bounds: Rect, contents: impl Into<String>) -> Self {
        Self::new(bounds, AnnotationKind::Note { contents: contents.into() })
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Dispatch to the visitor method matching this annotation's kind
    pub fn accept<V: AnnotationVisitor + ?Sized>(&self, visitor: &mut V) {
        match &self.kind {
            AnnotationKind::Stamp { image } => visitor.visit_stamp(self.bounds, image),
            AnnotationKind::Ink { strokes, line_width } => {
                visitor.visit_ink(self.bounds, strokes, *line_width)
            }
            AnnotationKind::Note { contents } => visitor.visit_note(self.bounds, contents),
        }
    }
}

/// Per-variant callbacks used to render or export annotations
pub trait AnnotationVisitor {
    fn visit_stamp(&mut self, bounds: Rect, image: &EmbeddedImage);

    fn visit_ink(&mut self, bounds: Rect, strokes: &[Vec<Point>], line_width: f32);

    fn visit_note(&mut self, _bounds: Rect, _contents: &str) {}
}

fn stroke_bounds(strokes: &[Vec<Point>]) -> Rect {
    let mut points = strokes.iter().flatten();
    let Some(first) = points.next() else {
        return Rect::default();
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

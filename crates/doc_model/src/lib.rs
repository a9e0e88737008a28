//! Document Model - pages, annotations and the paginated document
//!
//! Pages carry stable identities that survive index changes, so edits can be
//! undone by resolving a page's current position rather than trusting an
//! index captured earlier.

mod annotation;
mod document;
mod error;
mod geometry;
mod ids;
mod image;
mod page;

pub use annotation::*;
pub use document::*;
pub use error::*;
pub use geometry::*;
pub use ids::*;
pub use image::*;
pub use page::*;

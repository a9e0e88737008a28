//! Store - codecs, protection, compression and conversion
//!
//! This crate turns documents into bytes and back: the codec seams and the
//! native reference codec, password protection, quality-driven
//! compression in the background, image import/export, flattened PDF
//! export and editor settings.

mod codec;
mod compression;
mod conversion;
mod error;
mod image_codec;
mod jobs;
pub mod native;
pub mod pdf;
mod protection;
mod render;
mod settings;

pub use codec::*;
pub use compression::*;
pub use conversion::*;
pub use error::*;
pub use image_codec::{encode_raster, StandardImageCodec};
pub use jobs::*;
pub use native::NativeCodec;
pub use pdf::{export_pdf, PdfExportOptions};
pub use protection::*;
pub use settings::*;

//! Conversion between image sets and documents
//!
//! Building a document skips inputs that fail to decode. Rasterizing a
//! document runs pages in parallel but always returns them in page order.

use crate::{
    CancellationToken, GenerationCounter, ImageCodec, JobHandle, PdfCodec, RasterFormat,
    RenderTarget, Result,
};
use doc_model::{Document, Page, PageSize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of [`images_to_document`]
#[derive(Debug)]
pub struct ImportReport {
    pub document: Document,
    /// Input positions that could not be decoded
    pub skipped: Vec<usize>,
}

/// Build a document with one page per decodable image, in input order.
/// Images are placed at one point per pixel.
pub fn images_to_document<B: AsRef<[u8]>>(codec: &dyn ImageCodec, images: &[B]) -> ImportReport {
    let mut document = Document::new();
    let mut skipped = Vec::new();

    for (index, bytes) in images.iter().enumerate() {
        match codec.decode(bytes.as_ref()) {
            Ok(image) => {
                let size = PageSize::new(image.width_px as f32, image.height_px as f32);
                // Fresh page ids never collide
                let _ = document.push_page(Page::from_image(image, size));
            }
            Err(e) => {
                tracing::warn!("Skipping image {}: {}", index + 1, e);
                skipped.push(index);
            }
        }
    }

    ImportReport { document, skipped }
}

/// How exported pages are sized and encoded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageExportOptions {
    pub target: RenderTarget,
    pub format: RasterFormat,
}

impl Default for ImageExportOptions {
    fn default() -> Self {
        Self { target: RenderTarget::Scale(2.0), format: RasterFormat::Png }
    }
}

/// Rasterize and encode every page, in page order
pub fn document_to_images(
    pdf: &dyn PdfCodec,
    images: &dyn ImageCodec,
    document: &Document,
    options: &ImageExportOptions,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<u8>>> {
    // Indexed parallel iterators collect in source order
    document
        .pages()
        .par_iter()
        .map(|page| {
            cancel.check()?;
            let raster = pdf.render_page(page, options.target)?;
            images.encode(&raster, options.format)
        })
        .collect()
}

/// Run [`document_to_images`] on a snapshot in the background
pub fn spawn_image_export(
    pdf: Arc<dyn PdfCodec>,
    images: Arc<dyn ImageCodec>,
    document: &Document,
    options: ImageExportOptions,
    generations: &GenerationCounter,
) -> JobHandle<Vec<Vec<u8>>> {
    let snapshot = document.snapshot();
    tracing::info!("Exporting {} pages as {}", snapshot.page_count(), options.format.extension());
    JobHandle::spawn(generations, move |cancel| {
        document_to_images(pdf.as_ref(), images.as_ref(), &snapshot, &options, cancel)
    })
}

/// File names for exported pages: `Page_1.png`, `Page_2.png`, ...
pub fn export_file_names(count: usize, format: RasterFormat) -> Vec<String> {
    (1..=count).map(|n| format!("Page_{}.{}", n, format.extension())).collect()
}

/// Write exported pages into `dir`, returning the paths in page order
pub async fn save_images(dir: &Path, images: &[Vec<u8>], format: RasterFormat) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut paths = Vec::with_capacity(images.len());
    for (name, bytes) in export_file_names(images.len(), format).into_iter().zip(images) {
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        paths.push(path);
    }
    Ok(paths)
}

//! Flattened PDF export
//!
//! Every page is rasterized (content plus annotations) and embedded as a
//! single image XObject covering the page. The result opens in any PDF
//! reader; text and annotations are no longer editable.
//!
//! # Layout
//!
//! - `objects`: PDF object model and serialization
//! - `writer`: indirect objects, cross-reference table and trailer

mod objects;
mod writer;

pub use objects::{PdfDictionary, PdfObject, PdfStream};
pub use writer::{PdfWriter, PDF_VERSION};

use crate::{CancellationToken, PdfCodec, RenderTarget, Result};
use doc_model::{Document, DocumentMetadata};
use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfExportOptions {
    /// Raster resolution in pixels per point
    pub scale: f32,
    /// Deflate page images
    pub compress: bool,
}

impl Default for PdfExportOptions {
    fn default() -> Self {
        Self { scale: 2.0, compress: true }
    }
}

impl PdfExportOptions {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

struct FlatPage {
    width: f32,
    height: f32,
    raster: RgbaImage,
}

/// Write `document` as a flattened PDF
pub fn export_pdf(
    codec: &dyn PdfCodec,
    document: &Document,
    options: &PdfExportOptions,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let pages: Vec<FlatPage> = document
        .pages()
        .par_iter()
        .map(|page| -> Result<FlatPage> {
            cancel.check()?;
            let size = page.display_size();
            Ok(FlatPage {
                width: size.width,
                height: size.height,
                raster: codec.render_page(page, RenderTarget::Scale(options.scale))?,
            })
        })
        .collect::<Result<_>>()?;

    let mut pdf = PdfWriter::new(options.compress);
    let catalog = pdf.allocate();
    let tree = pdf.allocate();
    let info = pdf.allocate();
    let page_refs: Vec<(u32, u32, u32)> = pages
        .iter()
        .map(|_| (pdf.allocate(), pdf.allocate(), pdf.allocate()))
        .collect();

    pdf.write_object(
        catalog,
        &PdfDictionary::typed("Catalog").with("Pages", PdfObject::Reference(tree)).into(),
    )?;

    let kids = page_refs.iter().map(|(page, _, _)| PdfObject::Reference(*page)).collect();
    pdf.write_object(
        tree,
        &PdfDictionary::typed("Pages")
            .with("Kids", PdfObject::Array(kids))
            .with("Count", pages.len() as i64)
            .into(),
    )?;

    pdf.write_object(info, &info_dictionary(document.metadata()).into())?;

    for (flat, &(page_ref, content_ref, image_ref)) in pages.into_iter().zip(&page_refs) {
        cancel.check()?;
        let (width_px, height_px) = flat.raster.dimensions();
        let rgb = image::DynamicImage::ImageRgba8(flat.raster).into_rgb8().into_raw();
        let image_dict = PdfDictionary::typed("XObject")
            .with("Subtype", PdfObject::name("Image"))
            .with("Width", width_px as i64)
            .with("Height", height_px as i64)
            .with("ColorSpace", PdfObject::name("DeviceRGB"))
            .with("BitsPerComponent", 8i64);
        pdf.write_stream(image_ref, PdfStream::new(image_dict, rgb))?;

        // Scale the unit image square up to the full page
        let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", flat.width, flat.height);
        pdf.write_stream(content_ref, PdfStream::new(PdfDictionary::new(), content.into_bytes()))?;

        let resources = PdfDictionary::new().with(
            "XObject",
            PdfDictionary::new().with("Im0", PdfObject::Reference(image_ref)),
        );
        let page = PdfDictionary::typed("Page")
            .with("Parent", PdfObject::Reference(tree))
            .with("MediaBox", PdfObject::rect(flat.width, flat.height))
            .with("Resources", resources)
            .with("Contents", PdfObject::Reference(content_ref));
        pdf.write_object(page_ref, &page.into())?;
    }

    let bytes = pdf.finish(catalog, Some(info))?;
    tracing::info!("Exported {} pages as PDF ({} bytes)", page_refs.len(), bytes.len());
    Ok(bytes)
}

fn info_dictionary(metadata: &DocumentMetadata) -> PdfDictionary {
    let mut info = PdfDictionary::new().with("Producer", PdfObject::text("Prism PDF"));
    let fields = [
        ("Title", metadata.title.clone()),
        ("Author", metadata.author.clone()),
        ("Subject", metadata.subject.clone()),
        ("Keywords", metadata.keywords_string()),
    ];
    for (key, value) in fields {
        if !value.is_empty() {
            info.insert(key, PdfObject::text(&value));
        }
    }
    info
}

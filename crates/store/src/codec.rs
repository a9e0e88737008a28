//! Collaborator seams for reading, writing and rasterizing documents
//!
//! The editing core only ever talks to a [`PdfCodec`] and an [`ImageCodec`];
//! what the bytes look like is up to the implementation.

use crate::{CompressionQuality, Result};
use doc_model::{Document, EmbeddedImage, Page};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Result of loading a byte stream
#[derive(Debug, Clone)]
pub enum Opened {
    /// Page data is available
    Document(Document),
    /// A password is needed; the original bytes are kept for the unlock attempt
    Locked(Vec<u8>),
}

/// Options for [`PdfCodec::write`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Password required to open the output
    pub user_password: Option<String>,
    /// Password granting full access
    pub owner_password: Option<String>,
    /// Re-encode raster content at this quality
    pub quality: Option<CompressionQuality>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the open password; an empty string means none
    pub fn user_password(mut self, password: impl Into<String>) -> Self {
        self.user_password = non_empty(password.into());
        self
    }

    /// Set the owner password; an empty string means none
    pub fn owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = non_empty(password.into());
        self
    }

    pub fn quality(mut self, quality: CompressionQuality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn is_protected(&self) -> bool {
        self.user_password.is_some() || self.owner_password.is_some()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// How large a rendered page should be
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    /// Pixels per point
    Scale(f32),
    /// Fit within a pixel box, keeping the aspect ratio
    Fit { width: u32, height: u32 },
}

impl RenderTarget {
    /// Pixel size for a page displayed at `width` x `height` points
    pub fn pixel_size(&self, width: f32, height: f32) -> (u32, u32) {
        let scale = match *self {
            RenderTarget::Scale(scale) => scale,
            RenderTarget::Fit { width: w, height: h } => {
                (w as f32 / width.max(1.0)).min(h as f32 / height.max(1.0))
            }
        };
        let px = |points: f32| ((points * scale).round() as u32).max(1);
        (px(width), px(height))
    }
}

impl Default for RenderTarget {
    fn default() -> Self {
        RenderTarget::Scale(1.0)
    }
}

/// Encoded raster formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Tiff,
    Jpeg { quality: u8 },
}

impl RasterFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Tiff => "tiff",
            RasterFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Reads and writes whole documents and rasterizes pages
pub trait PdfCodec: Send + Sync {
    /// Parse a byte stream. Protected input comes back as [`Opened::Locked`].
    fn load(&self, bytes: &[u8]) -> Result<Opened>;

    /// Open protected input with a password
    fn unlock(&self, bytes: &[u8], password: &str) -> Result<Document>;

    /// Serialize a document, optionally protected and re-encoded
    fn write(&self, document: &Document, options: &WriteOptions) -> Result<Vec<u8>>;

    /// Draw one page, rotation applied, onto a white background
    fn render_page(&self, page: &Page, target: RenderTarget) -> Result<RgbaImage>;
}

/// Decodes arbitrary image bytes and encodes rasters
pub trait ImageCodec: Send + Sync {
    /// Decode bytes into a page-insertable image
    fn decode(&self, bytes: &[u8]) -> Result<EmbeddedImage>;

    /// Encode a raster
    fn encode(&self, raster: &RgbaImage, format: RasterFormat) -> Result<Vec<u8>>;
}

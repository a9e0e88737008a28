//! Image decoding and encoding backed by the `image` crate

use crate::{ImageCodec, RasterFormat, Result, StoreError};
use doc_model::{EmbeddedImage, ImageEncoding};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Codec for PNG, JPEG and TIFF input and output
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardImageCodec;

impl ImageCodec for StandardImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<EmbeddedImage> {
        // Keep the original bytes for formats that embed as-is
        let encoding = ImageEncoding::sniff(bytes)
            .ok_or_else(|| StoreError::Parse("unrecognized image data".to_string()))?;
        let decoded = image::load_from_memory(bytes)?;

        Ok(EmbeddedImage::new(decoded.width(), decoded.height(), encoding, bytes.to_vec()))
    }

    fn encode(&self, raster: &RgbaImage, format: RasterFormat) -> Result<Vec<u8>> {
        encode_raster(raster, format)
    }
}

/// Encode a raster into `format`
pub fn encode_raster(raster: &RgbaImage, format: RasterFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Png => {
            raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        RasterFormat::Tiff => {
            raster.write_to(&mut Cursor::new(&mut buf), ImageFormat::Tiff)?;
        }
        RasterFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            encoder.encode_image(&rgb)?;
        }
    }
    Ok(buf)
}

/// Decode an embedded image into RGBA pixels
pub fn to_rgba(image: &EmbeddedImage) -> Result<RgbaImage> {
    match image.encoding {
        ImageEncoding::Rgba8 => {
            RgbaImage::from_raw(image.width_px, image.height_px, image.data.clone()).ok_or_else(|| {
                StoreError::Parse(format!(
                    "raw image data does not match {}x{}",
                    image.width_px, image.height_px
                ))
            })
        }
        _ => Ok(image::load_from_memory(&image.data)?.to_rgba8()),
    }
}

/// Re-encode an embedded image as JPEG, keeping the original when that
/// would not make it smaller
pub fn recompress(image: &EmbeddedImage, quality: u8) -> Result<EmbeddedImage> {
    let raster = to_rgba(image)?;
    let jpeg = encode_raster(&raster, RasterFormat::Jpeg { quality })?;
    if jpeg.len() >= image.byte_len() {
        return Ok(image.clone());
    }
    Ok(EmbeddedImage::new(raster.width(), raster.height(), ImageEncoding::Jpeg, jpeg))
}

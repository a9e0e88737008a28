//! Encoded raster images carried by pages and stamp annotations

use serde::{Deserialize, Serialize};

/// Encoding of an embedded image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Tiff,
    /// Raw 8-bit RGBA, row-major
    Rgba8,
}

impl ImageEncoding {
    /// Detect encoding from magic bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(Self::Tiff);
        }
        None
    }
}

/// An image embedded in the document, kept in its encoded form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub width_px: u32,
    pub height_px: u32,
    pub encoding: ImageEncoding,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn new(width_px: u32, height_px: u32, encoding: ImageEncoding, data: Vec<u8>) -> Self {
        Self { width_px, height_px, encoding, data }
    }

    /// Encoded size in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_encoding() {
        assert_eq!(ImageEncoding::sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), Some(ImageEncoding::Png));
        assert_eq!(ImageEncoding::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageEncoding::Jpeg));
        assert_eq!(ImageEncoding::sniff(b"MM\0*rest"), Some(ImageEncoding::Tiff));
        assert_eq!(ImageEncoding::sniff(b"GIF8"), None);
    }

    #[test]
    fn test_payload_serializes_as_base64() {
        let image = EmbeddedImage::new(1, 1, ImageEncoding::Rgba8, vec![255, 0, 0, 255]);
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"/wAA/w==\""));

        let parsed: EmbeddedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, image);
    }
}

//! Size estimates and background re-encoding at a chosen quality

use crate::{GenerationCounter, JobHandle, PdfCodec, WriteOptions};
use doc_model::Document;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Compression presets offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionQuality {
    High,
    #[default]
    Medium,
    Low,
}

impl CompressionQuality {
    pub const ALL: [CompressionQuality; 3] =
        [CompressionQuality::High, CompressionQuality::Medium, CompressionQuality::Low];

    /// Expected output size relative to the input
    pub fn size_factor(&self) -> f64 {
        match self {
            CompressionQuality::High => 0.9,
            CompressionQuality::Medium => 0.6,
            CompressionQuality::Low => 0.3,
        }
    }

    /// JPEG quality used when re-encoding raster content
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            CompressionQuality::High => 80,
            CompressionQuality::Medium => 50,
            CompressionQuality::Low => 20,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompressionQuality::High => "High Quality",
            CompressionQuality::Medium => "Medium Quality",
            CompressionQuality::Low => "Low Quality",
        }
    }
}

/// Estimated output size in bytes. Documents without a known source size
/// estimate to zero.
pub fn estimate_bytes(document: &Document, quality: CompressionQuality) -> u64 {
    let original = document.source_len().unwrap_or(0) as f64;
    (original * quality.size_factor()) as u64
}

/// Human-readable size estimate, e.g. "1.2 MB"
pub fn estimate_size(document: &Document, quality: CompressionQuality) -> String {
    format_bytes(estimate_bytes(document, quality))
}

/// Format a byte count with decimal units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    // Pick the unit from the value as displayed, so 999.9 KB reads 1.0 MB
    while displayed(value) >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    let value = displayed(value);
    if value >= 100.0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Round to the precision `format_bytes` prints
fn displayed(value: f64) -> f64 {
    if value >= 100.0 {
        value.round()
    } else {
        (value * 10.0).round() / 10.0
    }
}

/// Runs compression jobs off the interactive thread
#[derive(Clone)]
pub struct CompressionPipeline {
    codec: Arc<dyn PdfCodec>,
    generations: GenerationCounter,
}

impl CompressionPipeline {
    pub fn new(codec: Arc<dyn PdfCodec>, generations: GenerationCounter) -> Self {
        Self { codec, generations }
    }

    /// Start compressing a snapshot of `document`.
    ///
    /// The job works on its own copy, so the live document can keep being
    /// edited. If the document is replaced before the job ends, the handle
    /// reports the result as stale.
    pub fn submit(&self, document: &Document, quality: CompressionQuality) -> JobHandle<Vec<u8>> {
        let snapshot = document.snapshot();
        let codec = Arc::clone(&self.codec);
        tracing::info!(
            "Compressing {} pages at {} (generation {})",
            snapshot.page_count(),
            quality.label(),
            self.generations.current()
        );

        JobHandle::spawn(&self.generations, move |cancel| {
            cancel.check()?;
            let bytes = codec.write(&snapshot, &WriteOptions::new().quality(quality))?;
            cancel.check()?;
            tracing::info!("Compression finished: {}", format_bytes(bytes.len() as u64));
            Ok(bytes)
        })
    }
}

impl std::fmt::Debug for CompressionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionPipeline")
            .field("generation", &self.generations.current())
            .finish_non_exhaustive()
    }
}

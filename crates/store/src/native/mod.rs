//! Native document container
//!
//! [`NativeCodec`] is the reference [`PdfCodec`]: it stores pages,
//! annotations and metadata losslessly and supports password protection
//! and quality-driven re-encoding of raster content.

mod crypto;
mod format;

pub use format::{FileHeader, FILE_EXTENSION, FORMAT_VERSION};

use crate::image_codec::recompress;
use crate::{Opened, PdfCodec, RenderTarget, Result, StoreError, WriteOptions};
use crypto::{CryptoError, Key};
use doc_model::{Document, DocumentId, Page, PageContent};
use format::{Body, KeySlot, NativeFile, ProtectedBody, SlotKind};
use image::RgbaImage;

/// Reads and writes the native container format
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }

    fn parse(bytes: &[u8]) -> Result<NativeFile> {
        let file: NativeFile = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Parse(format!("not a native document: {}", e)))?;
        if !file.header.is_valid() {
            return Err(StoreError::Parse(format!(
                "unsupported header {} v{}",
                file.header.magic, file.header.version
            )));
        }
        Ok(file)
    }

    /// Remember how large the input was, for size estimates
    fn finish_load(document: Document, source_len: usize) -> Document {
        document.with_source_len(source_len as u64)
    }

    fn reencode(document: &Document, jpeg_quality: u8) -> Result<Document> {
        let mut output = document.snapshot();
        for index in 0..output.page_count() {
            let page = output.page_mut(index)?;
            if let PageContent::Image(image) = page.content() {
                let smaller = recompress(image, jpeg_quality)?;
                page.set_content(PageContent::Image(smaller));
            }
        }
        Ok(output)
    }

    fn seal(document: &Document, options: &WriteOptions) -> Result<ProtectedBody> {
        let file_key = crypto::random_key();
        let plaintext = serde_json::to_vec(document)?;
        let iv = crypto::random_iv();
        let ciphertext = crypto::encrypt(&file_key, &iv, &plaintext).map_err(write_error)?;

        let mut slots = Vec::new();
        if let Some(password) = &options.user_password {
            slots.push(wrap_key(SlotKind::User, password, &file_key)?);
        }
        if let Some(password) = &options.owner_password {
            slots.push(wrap_key(SlotKind::Owner, password, &file_key)?);
        }
        if options.user_password.is_none() {
            // Owner-only protection restricts permissions but not opening
            slots.push(wrap_key(SlotKind::Open, "", &file_key)?);
        }

        Ok(ProtectedBody { slots, iv: iv.to_vec(), ciphertext })
    }

    fn open_sealed(body: &ProtectedBody, password: &str) -> Result<Document> {
        let file_key = body
            .slots
            .iter()
            .find_map(|slot| unwrap_key(slot, password))
            .ok_or(StoreError::WrongPassword)?;

        let iv = to_array(&body.iv)?;
        let plaintext = crypto::decrypt(&file_key, &iv, &body.ciphertext).map_err(|e| match e {
            CryptoError::Length => StoreError::Parse("truncated ciphertext".to_string()),
            CryptoError::Padding => StoreError::Parse("damaged ciphertext".to_string()),
        })?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| StoreError::Parse(format!("damaged document body: {}", e)))
    }
}

fn write_error(e: CryptoError) -> StoreError {
    StoreError::Write(format!("encryption failed: {:?}", e))
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| StoreError::Parse(format!("expected {} bytes, found {}", N, bytes.len())))
}

fn wrap_key(kind: SlotKind, password: &str, file_key: &Key) -> Result<KeySlot> {
    let salt = crypto::random_salt();
    let iv = crypto::random_iv();
    let slot_key = crypto::derive_key(password, &salt);
    let wrapped_key = crypto::encrypt(&slot_key, &iv, file_key).map_err(write_error)?;

    Ok(KeySlot {
        kind,
        salt: salt.to_vec(),
        iv: iv.to_vec(),
        wrapped_key,
        check: crypto::key_check(&slot_key).to_vec(),
    })
}

/// The file key, if `password` belongs to this slot
fn unwrap_key(slot: &KeySlot, password: &str) -> Option<Key> {
    let salt = to_array(&slot.salt).ok()?;
    let iv = to_array(&slot.iv).ok()?;
    let slot_key = crypto::derive_key(password, &salt);
    if crypto::key_check(&slot_key)[..] != slot.check[..] {
        return None;
    }
    let key = crypto::decrypt(&slot_key, &iv, &slot.wrapped_key).ok()?;
    to_array(&key).ok()
}

impl PdfCodec for NativeCodec {
    fn load(&self, bytes: &[u8]) -> Result<Opened> {
        let file = Self::parse(bytes)?;
        match file.body {
            Body::Plain { document } => Ok(Opened::Document(Self::finish_load(document, bytes.len()))),
            Body::Protected(body) if body.opens_without_password() => {
                let document = Self::open_sealed(&body, "")?;
                Ok(Opened::Document(Self::finish_load(document, bytes.len())))
            }
            Body::Protected(_) => {
                tracing::info!("Document {} is password protected", file.header.document_id);
                Ok(Opened::Locked(bytes.to_vec()))
            }
        }
    }

    fn unlock(&self, bytes: &[u8], password: &str) -> Result<Document> {
        let file = Self::parse(bytes)?;
        let document = match file.body {
            Body::Plain { document } => document,
            // Not locked for reading, so any password returns it unchanged
            Body::Protected(body) if body.opens_without_password() => Self::open_sealed(&body, "")?,
            Body::Protected(body) => Self::open_sealed(&body, password)?,
        };
        Ok(Self::finish_load(document, bytes.len()))
    }

    fn write(&self, document: &Document, options: &WriteOptions) -> Result<Vec<u8>> {
        let reencoded;
        let document = match options.quality {
            Some(quality) => {
                reencoded = Self::reencode(document, quality.jpeg_quality())?;
                &reencoded
            }
            None => document,
        };

        let file = if options.is_protected() {
            let id: DocumentId = document.id();
            NativeFile::protected(id, Self::seal(document, options)?)
        } else {
            NativeFile::plain(document.clone())
        };
        Ok(serde_json::to_vec(&file)?)
    }

    fn render_page(&self, page: &Page, target: RenderTarget) -> Result<RgbaImage> {
        crate::render::render_page(page, target)
    }
}

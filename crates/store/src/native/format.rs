//! Native container layout
//!
//! A container is a single JSON object: a [`FileHeader`] followed by either
//! the plain document or an encrypted body with its key slots.

use chrono::{DateTime, Utc};
use doc_model::{Document, DocumentId};
use serde::{Deserialize, Serialize};

/// File format version
pub const FORMAT_VERSION: u32 = 1;

/// File extension for the native format
pub const FILE_EXTENSION: &str = "ppdf";

/// File header for format identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHeader {
    /// Magic string for format identification
    pub magic: String,
    /// Format version
    pub version: u32,
    /// Document ID
    pub document_id: DocumentId,
    /// Write timestamp
    pub written: DateTime<Utc>,
}

impl FileHeader {
    pub const MAGIC: &'static str = "PRISM-PDF";

    pub fn new(document_id: DocumentId) -> Self {
        Self {
            magic: Self::MAGIC.to_string(),
            version: FORMAT_VERSION,
            document_id,
            written: Utc::now(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == Self::MAGIC && self.version <= FORMAT_VERSION
    }
}

/// Which password a key slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// Required to open the document
    User,
    /// Grants full access; also opens the document
    Owner,
    /// Empty password, present when only an owner password was set
    Open,
}

/// The file key wrapped under one password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySlot {
    pub kind: SlotKind,
    #[serde(with = "b64")]
    pub salt: Vec<u8>,
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    #[serde(with = "b64")]
    pub wrapped_key: Vec<u8>,
    /// Digest of the password-derived key
    #[serde(with = "b64")]
    pub check: Vec<u8>,
}

/// Encrypted document body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedBody {
    pub slots: Vec<KeySlot>,
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
}

impl ProtectedBody {
    /// Whether the body can be opened without asking for a password
    pub fn opens_without_password(&self) -> bool {
        self.slots.iter().any(|slot| slot.kind == SlotKind::Open)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Body {
    Plain { document: Document },
    Protected(ProtectedBody),
}

/// Complete file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeFile {
    pub header: FileHeader,
    pub body: Body,
}

impl NativeFile {
    pub fn plain(document: Document) -> Self {
        Self { header: FileHeader::new(document.id()), body: Body::Plain { document } }
    }

    pub fn protected(document_id: DocumentId, body: ProtectedBody) -> Self {
        Self { header: FileHeader::new(document_id), body: Body::Protected(body) }
    }
}

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

//! Password protection state machine
//!
//! ```text
//! open(bytes) ──► Unlocked            (plain or owner-only input)
//!            └──► Locked(bytes) ──unlock(correct)──► Unlocked
//!                        ▲   └────unlock(wrong)──────┘ stays Locked
//! ```
//!
//! A locked document exposes no page data. A failed attempt leaves the
//! state exactly as it was.

use crate::{Opened, PdfCodec, Result, StoreError, WriteOptions};
use doc_model::Document;
use std::sync::Arc;

/// Whether page data is available
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProtectionState {
    #[default]
    Unlocked,
    /// Encrypted input waiting for a password
    Locked(Vec<u8>),
}

impl ProtectionState {
    pub fn is_locked(&self) -> bool {
        matches!(self, ProtectionState::Locked(_))
    }
}

/// Drives opening, unlocking and protecting through a codec
#[derive(Clone)]
pub struct ProtectionStateMachine {
    codec: Arc<dyn PdfCodec>,
    state: ProtectionState,
}

impl ProtectionStateMachine {
    pub fn new(codec: Arc<dyn PdfCodec>) -> Self {
        Self { codec, state: ProtectionState::Unlocked }
    }

    pub fn state(&self) -> &ProtectionState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Load bytes. Returns the document if no password is needed, `None`
    /// if the input is now waiting in the `Locked` state.
    pub fn open(&mut self, bytes: &[u8]) -> Result<Option<Document>> {
        match self.codec.load(bytes)? {
            Opened::Document(document) => {
                self.state = ProtectionState::Unlocked;
                Ok(Some(document))
            }
            Opened::Locked(encrypted) => {
                self.state = ProtectionState::Locked(encrypted);
                Ok(None)
            }
        }
    }

    /// Try a password against the locked input
    pub fn unlock(&mut self, password: &str) -> Result<Document> {
        let ProtectionState::Locked(encrypted) = &self.state else {
            return Err(StoreError::NotLocked);
        };

        match self.codec.unlock(encrypted, password) {
            Ok(document) => {
                tracing::info!("Document unlocked ({} pages)", document.page_count());
                self.state = ProtectionState::Unlocked;
                Ok(document)
            }
            Err(e) => {
                tracing::warn!("Unlock attempt failed: {}", e);
                Err(e)
            }
        }
    }

    /// Forget any locked input, e.g. when the user cancels the prompt
    pub fn reset(&mut self) {
        self.state = ProtectionState::Unlocked;
    }

    /// Write a protected copy of `document`. With no passwords this is a
    /// plain rewrite. The live document is not modified.
    pub fn protect(
        &self,
        document: &Document,
        user_password: Option<&str>,
        owner_password: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut options = WriteOptions::new();
        if let Some(password) = user_password {
            options = options.user_password(password);
        }
        if let Some(password) = owner_password {
            options = options.owner_password(password);
        }
        self.codec.write(document, &options)
    }
}

impl std::fmt::Debug for ProtectionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionStateMachine")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// Open `bytes` with `password`. Input that is not locked opens as-is and
/// the password is ignored.
pub fn unlock_bytes(codec: &dyn PdfCodec, bytes: &[u8], password: &str) -> Result<Document> {
    match codec.load(bytes)? {
        Opened::Document(document) => Ok(document),
        Opened::Locked(encrypted) => codec.unlock(&encrypted, password),
    }
}

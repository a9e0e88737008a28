//! Document session
//!
//! All structural edits run synchronously on the caller's task. Background
//! work (compression, image and PDF export) runs on a snapshot and is
//! tagged with the generation of the document it was submitted for;
//! results for a document that has since been replaced are dropped.

use crate::{ImportSummary, OpenStatus, Result, SessionError, SessionState};
use doc_model::{Document, DocumentMetadata};
use edit_engine::{
    EditOutcome, EditingEngine, FindOptions, HistoryStep, NavigationHint, SearchNavigator,
    UndoManager,
};
use std::path::Path;
use std::sync::Arc;
use store::{
    export_file_names, export_pdf, images_to_document, spawn_image_export, CompressionPipeline,
    CompressionQuality, EditorSettings, GenerationCounter, ImageCodec, ImageExportOptions,
    JobHandle, JobOutcome, NativeCodec, Opened, PdfCodec, PdfExportOptions,
    ProtectionStateMachine, RenderTarget, StandardImageCodec, StoreError, WriteOptions,
};

/// One open document and everything that acts on it
pub struct DocumentSession {
    engine: EditingEngine,
    generations: GenerationCounter,
    codec: Arc<dyn PdfCodec>,
    image_codec: Arc<dyn ImageCodec>,
    protection: ProtectionStateMachine,
    compression: CompressionPipeline,
    search: SearchNavigator,
    /// Focused page, owned here rather than by the engine
    current_page: Option<usize>,
    settings: EditorSettings,
    compressed_size: Option<u64>,
}

impl DocumentSession {
    pub fn new(
        codec: Arc<dyn PdfCodec>,
        image_codec: Arc<dyn ImageCodec>,
        settings: EditorSettings,
    ) -> Self {
        let generations = GenerationCounter::new();
        let engine = EditingEngine::with_undo_manager(
            Document::new(),
            UndoManager::with_limit(settings.editing.undo_limit),
        )
        .with_blank_page_size(settings.editing.blank_page_size);

        Self {
            engine,
            protection: ProtectionStateMachine::new(Arc::clone(&codec)),
            compression: CompressionPipeline::new(Arc::clone(&codec), generations.clone()),
            generations,
            codec,
            image_codec,
            search: SearchNavigator::new(),
            current_page: None,
            settings,
            compressed_size: None,
        }
    }

    /// Session backed by the native codec and the standard image codec
    pub fn with_settings(settings: EditorSettings) -> Self {
        Self::new(Arc::new(NativeCodec), Arc::new(StandardImageCodec), settings)
    }

    pub fn document(&self) -> &Document {
        self.engine.document()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current_page
    }

    pub fn generation(&self) -> u64 {
        self.generations.current()
    }

    pub fn is_locked(&self) -> bool {
        self.protection.is_locked()
    }

    // ========== Document lifecycle ==========

    /// Swap in a new live document. Bumps the generation so in-flight jobs
    /// for the old one are discarded.
    fn install(&mut self, document: Document) {
        let generation = self.generations.advance();
        tracing::info!(
            "Opened document {} with {} pages (generation {})",
            document.id(),
            document.page_count(),
            generation
        );
        self.current_page = if document.is_empty() { None } else { Some(0) };
        self.engine.replace_document(document);
        self.search.clear();
        self.compressed_size = None;
    }

    /// Open document bytes. A protected document replaces the current one
    /// with nothing until [`unlock`](Self::unlock) succeeds.
    pub fn open(&mut self, bytes: &[u8]) -> Result<OpenStatus> {
        match self.protection.open(bytes)? {
            Some(document) => {
                let page_count = document.page_count();
                self.install(document);
                Ok(OpenStatus::Opened { page_count })
            }
            None => {
                self.install(Document::new());
                Ok(OpenStatus::NeedsPassword)
            }
        }
    }

    /// Try a password against the locked document. A wrong password leaves
    /// the session locked.
    pub fn unlock(&mut self, password: &str) -> Result<usize> {
        let document = self.protection.unlock(password)?;
        let page_count = document.page_count();
        self.install(document);
        Ok(page_count)
    }

    /// Make `document` the live document
    pub fn load_document(&mut self, document: Document) {
        self.protection.reset();
        self.install(document);
    }

    /// Build a new document from images, one page each
    pub fn import_images<B: AsRef<[u8]>>(&mut self, images: &[B]) -> ImportSummary {
        let report = images_to_document(self.image_codec.as_ref(), images);
        let summary = ImportSummary {
            page_count: report.document.page_count(),
            skipped: report.skipped.iter().map(|index| index + 1).collect(),
        };
        self.load_document(report.document);
        summary
    }

    pub fn close(&mut self) {
        self.load_document(Document::new());
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.protection.is_locked() {
            return Err(SessionError::Locked);
        }
        Ok(())
    }

    fn require_current(&self) -> Result<usize> {
        self.ensure_unlocked()?;
        self.current_page
            .filter(|&index| index < self.engine.page_count())
            .ok_or(SessionError::NoCurrentPage)
    }

    // ========== Navigation ==========

    /// Jump to a one-based page number. Out-of-range numbers are ignored.
    pub fn go_to_page(&mut self, number: usize) -> bool {
        if number == 0 || number > self.engine.page_count() || self.is_locked() {
            return false;
        }
        self.current_page = Some(number - 1);
        true
    }

    fn refocus(&mut self, focus: Option<usize>) {
        let count = self.engine.page_count();
        self.current_page = match focus {
            _ if count == 0 => None,
            Some(index) => Some(index.min(count - 1)),
            None => Some(self.current_page.unwrap_or(0).min(count - 1)),
        };
    }

    fn track(&mut self, outcome: EditOutcome) -> EditOutcome {
        if let EditOutcome::Applied { focus, .. } = &outcome {
            self.refocus(*focus);
        }
        outcome
    }

    // ========== Page edits ==========

    pub fn rotate_current(&mut self, degrees: i32) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let Some(index) = self.current_page else {
            return Ok(EditOutcome::NoOp);
        };
        let outcome = self.engine.rotate_at(index, degrees);
        Ok(self.track(outcome))
    }

    pub fn delete_current(&mut self) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        match self.current_page {
            Some(index) => self.delete_page(index),
            None => Ok(EditOutcome::NoOp),
        }
    }

    pub fn delete_page(&mut self, index: usize) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let outcome = self.engine.delete_page(index);
        if outcome.is_applied() && self.engine.page_count() == 0 {
            self.current_page = None;
        }
        Ok(self.track(outcome))
    }

    /// Move a page so it ends up at index `to`
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let outcome = self.engine.move_page(from, to);
        Ok(self.track(outcome))
    }

    /// Move a page to a drop position between pages
    pub fn drop_page(&mut self, from: usize, offset: usize) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let outcome = self.engine.move_page_to_offset(from, offset);
        Ok(self.track(outcome))
    }

    /// Insert a blank page after the current page, or at the end
    pub fn insert_blank_page(&mut self) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let index = self.insertion_point();
        let outcome = self.engine.insert_blank_page(index);
        Ok(self.track(outcome))
    }

    fn insertion_point(&self) -> usize {
        self.current_page
            .map(|index| index + 1)
            .unwrap_or_else(|| self.engine.page_count())
            .min(self.engine.page_count())
    }

    fn load_source(&self, bytes: &[u8], password: Option<&str>) -> Result<Document> {
        match self.codec.load(bytes)? {
            Opened::Document(document) => Ok(document),
            Opened::Locked(encrypted) => match password {
                Some(password) => Ok(self.codec.unlock(&encrypted, password)?),
                None => Err(SessionError::SourceLocked),
            },
        }
    }

    /// Append every page of another document
    pub fn merge(&mut self, bytes: &[u8], password: Option<&str>) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let source = self.load_source(bytes, password)?;
        let outcome = self.engine.merge_append(source);
        Ok(self.track(outcome))
    }

    /// Single-page document bytes for the current page
    pub fn copy_current_page(&self) -> Result<Vec<u8>> {
        let index = self.require_current()?;
        let page = self.engine.document().page(index)?.duplicate();
        Ok(self.codec.write(&Document::from_pages(vec![page]), &WriteOptions::new())?)
    }

    /// Insert the first page of `bytes` after the current page
    pub fn paste_page(&mut self, bytes: &[u8]) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let source = self.load_source(bytes, None)?;
        let Some(page) = source.pages().first() else {
            return Ok(EditOutcome::NoOp);
        };
        // Pasting the same bytes twice must still give distinct pages
        let page = page.duplicate();
        let index = self.insertion_point();
        let outcome = self.engine.paste_page(page, index);
        Ok(self.track(outcome))
    }

    /// Stamp a signature image in the middle of the current page
    pub fn add_signature(&mut self, image_bytes: &[u8]) -> Result<EditOutcome> {
        let index = self.require_current()?;
        let image = self.image_codec.decode(image_bytes)?;
        let page = self.engine.document().page(index)?.id();
        let outcome = self.engine.add_signature(page, image);
        Ok(self.track(outcome))
    }

    // ========== Metadata ==========

    pub fn metadata(&self) -> &DocumentMetadata {
        self.engine.document().metadata()
    }

    pub fn set_metadata(&mut self, metadata: DocumentMetadata) -> Result<EditOutcome> {
        self.ensure_unlocked()?;
        let outcome = self.engine.set_metadata(metadata);
        Ok(self.track(outcome))
    }

    /// Replace keywords from a comma-separated string
    pub fn set_keywords(&mut self, raw: &str) -> Result<EditOutcome> {
        let mut metadata = self.metadata().clone();
        metadata.keywords = DocumentMetadata::parse_keywords(raw);
        self.set_metadata(metadata)
    }

    // ========== History ==========

    pub fn undo(&mut self) -> Result<HistoryStep> {
        self.ensure_unlocked()?;
        let step = self.engine.undo()?;
        self.refocus(step.focus);
        Ok(step)
    }

    pub fn redo(&mut self) -> Result<HistoryStep> {
        self.ensure_unlocked()?;
        let step = self.engine.redo()?;
        self.refocus(step.focus);
        Ok(step)
    }

    // ========== Search ==========

    pub fn set_find_options(&mut self, options: FindOptions) {
        self.search.set_options(options);
    }

    /// Run a new search and jump to the first match. Returns the match count.
    pub fn search(&mut self, query: &str) -> Result<usize> {
        self.ensure_unlocked()?;
        let count = self.search.search(self.engine.document(), query);
        self.follow_match();
        Ok(count)
    }

    /// Jump to the next match, passing over matches on deleted pages
    pub fn next_match(&mut self) -> Option<NavigationHint> {
        let hint = self.search.next_in(self.engine.document())?;
        self.current_page = Some(hint.page_index);
        Some(hint)
    }

    pub fn previous_match(&mut self) -> Option<NavigationHint> {
        let hint = self.search.previous_in(self.engine.document())?;
        self.current_page = Some(hint.page_index);
        Some(hint)
    }

    fn follow_match(&mut self) -> Option<NavigationHint> {
        let hint = self.search.hint(self.engine.document())?;
        self.current_page = Some(hint.page_index);
        Some(hint)
    }

    // ========== Compression ==========

    pub fn estimate_size(&self, quality: CompressionQuality) -> String {
        store::estimate_size(self.engine.document(), quality)
    }

    /// Start compressing a snapshot of the live document
    pub fn compress(&self, quality: CompressionQuality) -> Result<JobHandle<Vec<u8>>> {
        self.ensure_unlocked()?;
        Ok(self.compression.submit(self.engine.document(), quality))
    }

    pub fn compress_with_defaults(&self) -> Result<JobHandle<Vec<u8>>> {
        self.compress(self.settings.compression.default_quality)
    }

    /// Wait for a compression job. A result for a replaced document comes
    /// back as `None` and leaves the published state alone.
    pub async fn accept_compression(&mut self, job: JobHandle<Vec<u8>>) -> Result<Option<Vec<u8>>> {
        let accepted = settle(job.join().await)?;
        if let Some(bytes) = &accepted {
            self.compressed_size = Some(bytes.len() as u64);
        }
        Ok(accepted)
    }

    // ========== Export ==========

    /// Rasterize every page in the background using the export settings
    pub fn export_images(&self) -> Result<JobHandle<Vec<Vec<u8>>>> {
        self.ensure_unlocked()?;
        let options = ImageExportOptions {
            target: RenderTarget::Scale(self.settings.export.scale),
            format: self.settings.export.format,
        };
        Ok(spawn_image_export(
            Arc::clone(&self.codec),
            Arc::clone(&self.image_codec),
            self.engine.document(),
            options,
            &self.generations,
        ))
    }

    /// File names matching the pages produced by [`export_images`](Self::export_images)
    pub fn export_file_names(&self) -> Vec<String> {
        export_file_names(self.engine.page_count(), self.settings.export.format)
    }

    /// Write a flattened PDF of a snapshot in the background
    pub fn export_pdf(&self) -> Result<JobHandle<Vec<u8>>> {
        self.ensure_unlocked()?;
        let codec = Arc::clone(&self.codec);
        let snapshot = self.engine.document().snapshot();
        let options = PdfExportOptions::default().with_scale(self.settings.export.scale);
        Ok(JobHandle::spawn(&self.generations, move |cancel| {
            export_pdf(codec.as_ref(), &snapshot, &options, cancel)
        }))
    }

    /// Wait for a background export; `None` if it no longer applies
    pub async fn finish<T: Send + 'static>(&self, job: JobHandle<T>) -> Result<Option<T>> {
        settle(job.join().await)
    }

    // ========== Saving ==========

    /// Write a copy protected by the given passwords. With neither password
    /// this is a plain rewrite.
    pub fn protect(&self, user_password: Option<&str>, owner_password: Option<&str>) -> Result<Vec<u8>> {
        self.ensure_unlocked()?;
        Ok(self.protection.protect(self.engine.document(), user_password, owner_password)?)
    }

    pub fn save(&self) -> Result<Vec<u8>> {
        self.ensure_unlocked()?;
        Ok(self.codec.write(self.engine.document(), &WriteOptions::new())?)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let bytes = self.save()?;
        tokio::fs::write(path, bytes).await.map_err(StoreError::from)?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }

    // ========== Published state ==========

    pub fn state(&self) -> SessionState {
        let metadata = self.metadata().clone();
        SessionState {
            page_count: self.engine.page_count(),
            current_page: self.current_page,
            keywords: metadata.keywords_string(),
            metadata,
            search_index: self.search.current_index(),
            search_count: self.search.result_count(),
            can_undo: self.engine.can_undo(),
            can_redo: self.engine.can_redo(),
            undo_label: self.engine.undo_action_name().map(str::to_string),
            redo_label: self.engine.redo_action_name().map(str::to_string),
            locked: self.protection.is_locked(),
            generation: self.generations.current(),
            compressed_size: self.compressed_size,
        }
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::with_settings(EditorSettings::default())
    }
}

fn settle<T>(outcome: JobOutcome<T>) -> Result<Option<T>> {
    match outcome {
        JobOutcome::Completed(value) => Ok(Some(value)),
        JobOutcome::Stale { .. } | JobOutcome::Cancelled => Ok(None),
        JobOutcome::Failed(e) => Err(e.into()),
    }
}

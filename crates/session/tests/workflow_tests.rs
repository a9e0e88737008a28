//! End-to-end editing sessions through the public intents

use doc_model::{AnnotationKind, Page, PageSize};
use image::{ImageFormat, Rgba, RgbaImage};
use session::{DocumentSession, OpenStatus, SessionError};
use std::io::Cursor;
use store::{CompressionQuality, EditorSettings};
use tempfile::TempDir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let raster = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
    let mut bytes = Vec::new();
    raster.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

#[tokio::test]
async fn scanned_pages_signed_saved_and_reopened() {
    let mut session = DocumentSession::default();
    let summary = session.import_images(&[png(40, 60), b"broken".to_vec(), png(60, 40)]);
    assert_eq!(summary.page_count, 2);
    assert_eq!(summary.skipped, vec![2]);

    session.go_to_page(2);
    session.rotate_current(-90).unwrap();
    session.add_signature(&png(30, 10)).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signed.ppdf");
    session.save_to(&path).await.unwrap();

    let mut reopened = DocumentSession::default();
    let bytes = tokio::fs::read(&path).await.unwrap();
    assert_eq!(reopened.open(&bytes).unwrap(), OpenStatus::Opened { page_count: 2 });

    let page = reopened.document().page(1).unwrap();
    assert_eq!(page.rotation(), 270);
    assert!(matches!(page.annotations()[0].kind, AnnotationKind::Stamp { .. }));
}

#[test]
fn undoing_a_move_after_an_unrelated_delete() {
    let mut session = DocumentSession::default();
    let pages: Vec<Page> = ["A", "B", "C"]
        .iter()
        .map(|t| Page::blank(PageSize::LETTER).with_text(*t))
        .collect();
    session.load_document(doc_model::Document::from_pages(pages));

    session.move_page(0, 2).unwrap();
    let texts = |s: &DocumentSession| s.document().pages().iter().map(|p| p.text().to_string()).collect::<Vec<_>>();
    assert_eq!(texts(&session), vec!["B", "C", "A"]);

    session.delete_page(0).unwrap();
    // Undo the delete, then the move
    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(texts(&session), vec!["A", "B", "C"]);
}

#[test]
fn protected_round_trip_through_sessions() {
    let mut session = DocumentSession::default();
    session.import_images(&[png(8, 8), png(8, 8), png(8, 8)]);
    let protected = session.protect(Some("user"), Some("owner")).unwrap();

    let mut other = DocumentSession::with_settings(EditorSettings::default());
    assert_eq!(other.open(&protected).unwrap(), OpenStatus::NeedsPassword);
    assert!(matches!(other.search("x"), Err(SessionError::Locked)));
    assert!(other.unlock("nope").is_err());
    assert_eq!(other.unlock("owner").unwrap(), 3);
}

#[tokio::test]
async fn compress_then_replace_discards_result() {
    let mut session = DocumentSession::default();
    session.import_images(&[png(64, 64)]);
    let estimate_low = session.estimate_size(CompressionQuality::Low);
    assert!(!estimate_low.is_empty());

    let job = session.compress_with_defaults().unwrap();
    session.close();

    assert_eq!(session.accept_compression(job).await.unwrap(), None);
    assert_eq!(session.state().compressed_size, None);
    assert_eq!(session.state().page_count, 0);
}

#[tokio::test]
async fn flattened_pdf_export() {
    let mut session = DocumentSession::default();
    session.import_images(&[png(20, 20), png(30, 10)]);
    let job = session.export_pdf().unwrap();
    let pdf = session.finish(job).await.unwrap().unwrap();

    let text = String::from_utf8_lossy(&pdf);
    assert!(text.starts_with("%PDF-"));
    assert!(text.contains("/Count 2"));
}

//! Integration tests for page editing history
//!
//! Random edit sequences are applied through the engine and then fully
//! undone and redone. Page order is compared by identity, so any command that
//! restored a stale index instead of re-resolving its page shows up here.

use doc_model::{Document, Page, PageId, PageSize};
use edit_engine::{EditError, EditOutcome, EditingEngine, HistoryDirection};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Edit {
    Insert(usize),
    Delete(usize),
    Move(usize, usize),
    Rotate(usize, i32),
    Blank(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        any::<usize>().prop_map(Edit::Insert),
        any::<usize>().prop_map(Edit::Delete),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::Move(a, b)),
        (any::<usize>(), -8i32..8).prop_map(|(i, k)| Edit::Rotate(i, k * 90)),
        any::<usize>().prop_map(Edit::Blank),
    ]
}

fn apply(engine: &mut EditingEngine, edit: &Edit) -> EditOutcome {
    let count = engine.page_count();
    match *edit {
        Edit::Insert(i) => engine.insert_page(Page::blank(PageSize::A4), i % (count + 1)),
        Edit::Blank(i) => engine.insert_blank_page(i % (count + 1)),
        Edit::Delete(i) => engine.delete_page(i % (count + 1)),
        Edit::Move(a, b) if count > 0 => engine.move_page(a % count, b % count),
        Edit::Rotate(i, degrees) if count > 0 => engine.rotate_at(i % count, degrees),
        _ => EditOutcome::NoOp,
    }
}

/// Identity order plus rotation of every page
fn fingerprint(document: &Document) -> Vec<(PageId, u16)> {
    document.pages().iter().map(|p| (p.id(), p.rotation())).collect()
}

fn engine_with(n: usize) -> EditingEngine {
    let pages = (0..n).map(|_| Page::blank(PageSize::LETTER)).collect();
    EditingEngine::new(Document::from_pages(pages))
}

fn assert_index_invariant(document: &Document) {
    let ids = document.page_ids();
    let unique: HashSet<PageId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    for (index, id) in ids.iter().enumerate() {
        assert_eq!(document.index_of(*id).unwrap(), index);
    }
}

proptest! {
    #[test]
    fn prop_index_invariant_holds(initial in 0usize..6, edits in prop::collection::vec(edit_strategy(), 0..40)) {
        let mut engine = engine_with(initial);
        for edit in &edits {
            apply(&mut engine, edit);
            assert_index_invariant(engine.document());
            prop_assert!(engine.document().pages().iter().all(|p| p.rotation() % 90 == 0 && p.rotation() < 360));
        }
    }

    #[test]
    fn prop_undo_all_restores_original(initial in 0usize..6, edits in prop::collection::vec(edit_strategy(), 0..30)) {
        let mut engine = engine_with(initial);
        let original = fingerprint(engine.document());

        let mut applied = 0;
        for edit in &edits {
            if apply(&mut engine, edit).is_applied() {
                applied += 1;
            }
        }
        let edited = fingerprint(engine.document());

        for _ in 0..applied {
            engine.undo().unwrap();
        }
        prop_assert!(!engine.can_undo());
        prop_assert_eq!(fingerprint(engine.document()), original);

        for _ in 0..applied {
            engine.redo().unwrap();
        }
        prop_assert!(!engine.can_redo());
        prop_assert_eq!(fingerprint(engine.document()), edited);
    }

    #[test]
    fn prop_single_edit_round_trip(initial in 1usize..6, edit in edit_strategy()) {
        let mut engine = engine_with(initial);
        let before = fingerprint(engine.document());
        if apply(&mut engine, &edit).is_applied() {
            engine.undo().unwrap();
        }
        prop_assert_eq!(fingerprint(engine.document()), before);
    }
}

#[test]
fn test_move_then_independent_delete_then_undo() {
    let mut engine = engine_with(3);
    let ids = engine.document().page_ids();
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    assert!(engine.move_page(0, 2).is_applied());
    assert_eq!(engine.document().page_ids(), vec![b, c, a]);

    // Delete B as its own edit, then undo the move by itself
    assert!(engine.delete_page(0).is_applied());
    let moved_back = edit_engine::MovePage::new(a, 0);
    let outcome = engine.execute(Box::new(moved_back));
    assert!(outcome.is_applied());
    assert_eq!(engine.document().page_ids(), vec![a, c]);
}

#[test]
fn test_rotation_normalization() {
    let mut engine = engine_with(1);
    let page = engine.document().page_ids()[0];
    engine.rotate(page, 450);
    assert_eq!(engine.document().page(0).unwrap().rotation(), 90);
    engine.rotate(page, -90);
    assert_eq!(engine.document().page(0).unwrap().rotation(), 0);

    assert!(matches!(engine.rotate(page, 45), EditOutcome::Rejected(EditError::InvalidCommand(_))));
    assert_eq!(engine.undo_action_name(), Some("Rotate Page"));
}

#[test]
fn test_rotation_by_extreme_multiples_of_90() {
    let mut engine = engine_with(1);
    let page = engine.document().page_ids()[0];
    let rotation = |engine: &EditingEngine| engine.document().page(0).unwrap().rotation();

    engine.rotate(page, 90);
    assert!(engine.rotate(page, 2_147_483_610).is_applied());
    assert_eq!(rotation(&engine), 180);
    engine.undo().unwrap();
    assert_eq!(rotation(&engine), 90);
    engine.redo().unwrap();
    assert_eq!(rotation(&engine), 180);

    engine.rotate(page, 180);
    assert!(engine.rotate(page, -2_147_483_610).is_applied());
    assert_eq!(rotation(&engine), 270);
    engine.undo().unwrap();
    assert_eq!(rotation(&engine), 0);
}

#[test]
fn test_redo_invalidated_by_new_edit() {
    let mut engine = engine_with(2);
    engine.move_page(1, 0);
    engine.undo().unwrap();
    engine.insert_blank_page(0);

    assert_eq!(engine.redo().unwrap_err(), EditError::EmptyHistory(HistoryDirection::Redo));
}

#[test]
fn test_merge_then_unrelated_edit_then_undo_both() {
    let mut engine = engine_with(2);
    let original = engine.document().page_ids();
    let source = Document::from_pages((0..3).map(|_| Page::blank(PageSize::A4)).collect());

    engine.merge_append(source);
    engine.move_page(4, 0);
    assert_eq!(engine.page_count(), 5);

    engine.undo().unwrap();
    engine.undo().unwrap();
    assert_eq!(engine.document().page_ids(), original);
}

use std::cell::Cell;
use std::rc::Rc;

use outline_notes_engine::{Document, Editor, HistoryConfig, SideEffectRef};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn loaded(text: &str) -> Editor {
    let mut editor = Editor::new();
    editor.load(text);
    editor
}

fn lines(editor: &Editor) -> Vec<String> {
    editor.document().line_texts()
}

#[rstest]
#[case("")]
#[case("single")]
#[case("a\nb\nc")]
#[case("\t• nested\n\n☑ done\n")]
#[case("ünïcödé\n☐ ✓")]
fn offsets_round_trip(#[case] text: &str) {
    let doc = Document::from_text(text);
    for offset in 0..=doc.len() {
        let (line, local) = doc.offset_to_line_local(offset);
        assert_eq!(doc.line_start_offset(line) + local, offset, "offset {offset}");
    }
}

#[test]
fn deleting_everything_leaves_one_line() {
    let mut editor = loaded("• one\n\t☐ two\nthree");
    editor.set_cursor(editor.document().len());
    for _ in 0..100 {
        editor.delete_backward();
    }
    assert_eq!(lines(&editor), vec![""]);

    editor.select_all();
    editor.delete_selection();
    editor.merge_up();
    editor.merge_down();
    assert_eq!(editor.document().line_count(), 1);
}

#[rstest]
#[case("hello", 3)]
#[case("• item", 4)]
#[case("\t\tdeep", 2)]
#[case("", 0)]
fn bullet_toggle_twice_is_identity(#[case] text: &str, #[case] cursor: usize) {
    let mut editor = loaded(text);
    editor.focus_line(0, cursor);
    editor.toggle_bullet_prefix();
    editor.toggle_bullet_prefix();
    assert_eq!(editor.text(), text);
    assert_eq!(editor.document().focused_line().cursor(), cursor);
}

#[rstest]
#[case((0, 1), Some(0..2))]
#[case((0, 0), Some(0..0))]
#[case((2, 3), Some(2..4))]
#[case((4, 5), Some(4..5))]
#[case((1, 3), Some(1..3))]
fn selection_newline_extension(
    #[case] selection: (usize, usize),
    #[case] expected: Option<std::ops::Range<usize>>,
) {
    let mut doc = Document::from_text("a\nb\nc");
    doc.set_selection(selection.0, selection.1);
    assert_eq!(doc.effective_selection_range(), expected);
}

#[test]
fn indent_run_is_one_undo_step() {
    let mut editor = loaded("a\nb");
    editor.focus_line(1, 0);
    editor.indent();
    editor.indent();
    editor.indent();
    editor.unindent();
    assert_eq!(lines(&editor), vec!["a", "\t\tb"]);

    editor.undo();
    assert_eq!(lines(&editor), vec!["a", "b"]);
    assert!(!editor.can_undo());
}

#[test]
fn bullet_toggles_are_separate_steps() {
    let mut editor = loaded("a");
    editor.toggle_bullet_prefix();
    editor.toggle_bullet_prefix();
    assert_eq!(editor.text(), "a");

    editor.undo();
    assert_eq!(editor.text(), "• a");
    editor.undo();
    assert_eq!(editor.text(), "a");
}

#[test]
fn baseline_is_the_floor() {
    let mut editor = loaded("X");
    editor.select_all();
    editor.insert_text("Y");
    assert_eq!(editor.text(), "Y");

    assert!(editor.undo().is_some());
    assert_eq!(editor.text(), "X");
    assert!(editor.undo().is_none());
    assert_eq!(editor.text(), "X");
    assert!(!editor.can_undo());
}

#[test]
fn baseline_holds_after_undo_stack_overflows() {
    let mut editor = Editor::with_config(HistoryConfig { max_undo_levels: 2 });
    editor.load("start");
    for _ in 0..5 {
        editor.toggle_bullet_prefix();
    }
    while editor.undo().is_some() {}
    assert_eq!(editor.text(), "start");
    assert!(!editor.can_undo());
}

#[test]
fn new_edit_invalidates_redo() {
    let mut editor = loaded("a");
    editor.focus_line(0, 1);
    editor.insert_text("b");
    editor.undo();
    assert!(editor.can_redo());

    editor.insert_text("c");
    assert!(!editor.can_redo());
}

#[test]
fn focus_moves_after_undo_keep_redo() {
    let mut editor = loaded("a\nb");
    editor.focus_line(0, 1);
    editor.insert_text("x");
    editor.undo();
    editor.focus_line(1, 0);
    assert!(editor.can_redo());
    editor.redo();
    assert_eq!(lines(&editor), vec!["ax", "b"]);
}

#[test]
fn block_moves_with_children() {
    let mut editor = loaded("A\n\tA1\n\tA2\nB");
    assert!(editor.move_block_down());
    assert_eq!(lines(&editor), vec!["B", "A", "\tA1", "\tA2"]);

    editor.undo();
    assert_eq!(lines(&editor), vec!["A", "\tA1", "\tA2", "B"]);
}

#[test]
fn deleting_an_empty_line_removes_it() {
    let mut editor = loaded("x\n\ny");
    editor.set_selection(2, 3);
    assert!(editor.delete_selection());
    assert_eq!(lines(&editor), vec!["x", "y"]);
}

#[test]
fn deleting_a_whole_line_takes_its_newline() {
    let mut editor = loaded("x\nmiddle\ny");
    editor.set_selection(2, 8);
    assert!(editor.delete_selection());
    assert_eq!(lines(&editor), vec!["x", "y"]);
}

#[test]
fn enter_and_following_typing_undo_together() {
    let mut editor = loaded("☑ done");
    editor.focus_line(0, 6);
    editor.split_line();
    editor.insert_text("next");
    assert_eq!(lines(&editor), vec!["☑ done", "☐ next"]);

    editor.undo();
    assert_eq!(lines(&editor), vec!["☑ done"]);
}

#[test]
fn every_content_mutation_notifies_once() {
    let calls = Rc::new(Cell::new(0));
    let mut editor = loaded("a\nb");
    let counter = Rc::clone(&calls);
    editor.subscribe(move |_| counter.set(counter.get() + 1));

    editor.insert_text("x");
    editor.split_line();
    editor.indent();
    editor.move_block_up();
    editor.undo();
    editor.redo();
    assert_eq!(calls.get(), 6);

    editor.set_cursor(0);
    editor.toggle_checkbox_state(0);
    editor.move_block_up();
    assert_eq!(calls.get(), 6);
}

#[test]
fn side_effects_follow_undo_and_redo() {
    let mut editor = loaded("call mum");
    editor.focus_line(0, 8);
    editor.insert_text(" at 6pm");
    assert!(editor.attach_side_effect(SideEffectRef::new("reminder", "r-1")));

    // Undo hands back the reference so the reminder can be cancelled
    let undone = editor.undo().unwrap();
    assert_eq!(undone.side_effect(), Some(&SideEffectRef::new("reminder", "r-1")));
    assert_eq!(editor.text(), "call mum");

    // Redo asks for it to be recreated; the new id replaces the old one
    let redone = editor.redo().unwrap();
    assert_eq!(redone.side_effect(), Some(&SideEffectRef::new("reminder", "r-1")));
    editor
        .complete_redo_side_effect(Ok::<_, String>(SideEffectRef::new("reminder", "r-2")))
        .unwrap();
    assert_eq!(editor.history().latest_side_effect(), Some(&SideEffectRef::new("reminder", "r-2")));
}

#[test]
fn suspended_session_resumes_bit_for_bit() {
    let mut editor = loaded("• plan");
    editor.focus_line(0, 6);
    editor.insert_text(" trip");
    editor.split_line();
    editor.insert_text("flights");
    editor.indent();
    editor.undo();
    let json = editor.export_history().unwrap();

    let mut resumed = loaded(&editor.text());
    resumed.import_history(&json).unwrap();
    assert_eq!(resumed.export_history().unwrap(), json);
    assert_eq!(resumed.can_redo(), editor.can_redo());

    resumed.redo();
    editor.redo();
    assert_eq!(resumed.text(), editor.text());
}

fn enter_on_last_line(editor: &mut Editor) {
    editor.focus_line(0, 1);
    editor.split_line();
}

fn enter_then_type(editor: &mut Editor) {
    editor.focus_line(1, 1);
    editor.split_line();
    editor.insert_text("new");
}

fn merge_into_previous(editor: &mut Editor) {
    editor.focus_line(1, 0);
    editor.merge_up();
}

fn merge_next_in(editor: &mut Editor) {
    editor.focus_line(0, 1);
    editor.merge_down();
}

fn indent_run_then_move_focus(editor: &mut Editor) {
    editor.focus_line(1, 0);
    editor.indent();
    editor.indent();
    editor.focus_line(0, 0);
}

fn indent_run_still_open(editor: &mut Editor) {
    editor.focus_line(1, 1);
    editor.indent();
    editor.unindent();
    editor.indent();
}

#[rstest]
#[case::enter_on_last_line("a", enter_on_last_line)]
#[case::enter_then_type("a\nb", enter_then_type)]
#[case::merge_up("a\nb", merge_into_previous)]
#[case::merge_down("a\nb", merge_next_in)]
#[case::indent_then_focus("a\nb", indent_run_then_move_focus)]
#[case::indent_run_open("a\nb", indent_run_still_open)]
fn session_exported_mid_edit_resumes(#[case] text: &str, #[case] edit: fn(&mut Editor)) {
    let mut editor = loaded(text);
    edit(&mut editor);
    let json = editor.export_history().unwrap();

    let mut resumed = loaded(&editor.text());
    resumed.import_history(&json).unwrap();
    assert_eq!(resumed.export_history().unwrap(), json);

    while editor.undo().is_some() {
        assert!(resumed.undo().is_some());
        assert_eq!(resumed.text(), editor.text());
    }
    assert_eq!(editor.text(), text);
    assert_eq!(resumed.text(), text);
}

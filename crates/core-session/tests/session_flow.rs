mod common;
use common::*;

use core_events::{Event, SnippetRequest};
use core_keymap::{KeyCombo, KeyMods};
use core_session::{Layout, PreconditionViolation, SessionError, SessionView, StatusNotice};
use core_state::{ContentChange, DirtyState, DocumentSnapshot, Marker};
use core_store::StoreError;
use core_text::{Position, Selection};
use core_widget::TextWidget;
use pretty_assertions::assert_eq;

fn not_modified() -> SessionError {
    SessionError::Precondition(PreconditionViolation::NotModified)
}

#[test]
fn author_edits_and_saves_then_other_user_is_read_only() {
    // bob opens his own workflow, edits, saves.
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert_eq!(h.session.is_writable(), Some(true));
    assert_eq!(h.session.view(), SessionView::Editor);

    h.session.type_text("# tuned\n");
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);

    let (ticket, version) = submission(h.session.save().expect("save allowed"));
    assert_eq!(version.author_id, bob());
    assert_eq!(version.label, "Quick Save");
    assert_eq!(version.content, format!("# tuned\n{PING}"));
    assert!(h.session.is_saving());

    assert!(h.session.on_save_completed(ticket, Ok(())).is_none());
    assert!(!h.session.is_saving());
    assert_eq!(h.listing.count(), 1);
    assert_eq!(h.notices(), vec![StatusNotice::info("Workflow saved")]);

    // alice sees bob's workflow read-only and cannot save it.
    let mut h = Harness::new(alice());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert_eq!(h.session.is_writable(), Some(false));
    assert!(h.session.widget().unwrap().is_read_only());
    h.session.type_text("x");
    assert_eq!(h.session.buffer_text().as_deref(), Some(PING));
    assert_eq!(h.session.save(), Err(not_modified()));
    assert!(h.notices().is_empty());
}

#[test]
fn external_edit_by_non_author_is_not_authorized() {
    let mut h = Harness::new(alice());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session
        .on_content_change(&ContentChange::user(format!("{PING}# note\n")));
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);
    assert_eq!(
        h.session.save(),
        Err(SessionError::Precondition(
            PreconditionViolation::NotAuthorized
        ))
    );
    assert!(!h.session.is_saving());
    assert!(h.notices().is_empty());
}

#[test]
fn save_refused_while_original_or_in_flight() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert_eq!(h.session.save(), Err(not_modified()));

    h.session.type_text("#");
    let first = h.session.save().expect("first save");
    assert_eq!(
        h.session.save(),
        Err(SessionError::Precondition(
            PreconditionViolation::SaveInFlight
        ))
    );
    assert!(matches!(first, core_session::SessionEffect::Submit(..)));
    assert!(h.notices().is_empty());
}

#[test]
fn save_without_document_is_refused() {
    let mut h = Harness::new(bob());
    assert_eq!(h.session.save(), Err(not_modified()));
    assert_eq!(h.session.is_writable(), None);
}

#[test]
fn save_failure_keeps_buffer_and_reports_store_message() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("# keep me\n");
    let (ticket, _) = submission(h.session.save().unwrap());

    h.session.on_save_completed(
        ticket,
        Err(StoreError::Unavailable("connection reset".into())),
    );
    assert!(!h.session.is_saving());
    assert_eq!(h.listing.count(), 0);
    assert_eq!(
        h.session.buffer_text(),
        Some(format!("# keep me\n{PING}"))
    );
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);
    assert_eq!(
        h.notices(),
        vec![StatusNotice::error("Store unavailable: connection reset")]
    );
}

#[test]
fn save_success_leaves_dirty_state_alone() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let (ticket, _) = submission(h.session.save().unwrap());
    h.session.on_save_completed(ticket, Ok(()));
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);
    assert_eq!(h.session.snapshot().unwrap().source_text, PING);
}

#[test]
fn late_completion_for_unknown_ticket_is_ignored() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let (ticket, _) = submission(h.session.save().unwrap());
    h.session.on_save_completed(ticket, Ok(()));
    h.session.on_save_completed(ticket, Ok(()));
    assert_eq!(h.listing.count(), 1);
    assert_eq!(h.notices().len(), 1);
}

#[test]
fn stale_fetch_never_overwrites_newer_selection() {
    let mut h = Harness::new(bob());
    let x = fetch_ticket(h.session.select_document(Some(latest("ping"))));
    let y = fetch_ticket(h.session.select_document(Some(latest("echo"))));

    h.session
        .on_fetch_completed(y, Ok(DocumentSnapshot::new(ECHO, bob())))
        .unwrap();
    h.session
        .on_fetch_completed(x, Ok(DocumentSnapshot::new(PING, bob())))
        .unwrap();

    assert_eq!(h.session.buffer_text().as_deref(), Some(ECHO));
    assert_eq!(h.session.snapshot().unwrap().source_text, ECHO);
}

#[test]
fn fetch_failure_reports_and_keeps_previous_document() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    let ticket = fetch_ticket(h.session.select_document(Some(latest("ghost"))));
    let err = h
        .session
        .on_fetch_completed(ticket, Err(StoreError::NotFound("ghost".into())))
        .unwrap_err();
    assert_eq!(err, SessionError::Fetch(StoreError::NotFound("ghost".into())));
    assert_eq!(h.session.buffer_text().as_deref(), Some(PING));
    assert_eq!(h.session.view(), SessionView::Editor);
    assert_eq!(
        h.notices(),
        vec![StatusNotice::error("Workflow ghost not found")]
    );
}

#[test]
fn rebinding_same_snapshot_is_idempotent() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("junk");
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert_eq!(h.session.dirty_state(), DirtyState::Original);
    assert_eq!(h.session.buffer_text().as_deref(), Some(PING));
    assert_eq!(h.session.factory().created(), 1);
    assert_eq!(h.session.widget().unwrap().shortcut_count(), 1);
}

#[test]
fn switching_author_recomputes_read_only() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, alice()));
    assert!(h.session.widget().unwrap().is_read_only());
    h.open(latest("echo"), DocumentSnapshot::new(ECHO, bob()));
    assert!(!h.session.widget().unwrap().is_read_only());
    assert_eq!(h.session.is_writable(), Some(true));
}

#[test]
fn closing_document_blanks_widget_and_clears_markers() {
    let mut h = Harness::new(bob());
    h.open(latest("broken"), DocumentSnapshot::new("variables: {}\n", bob()));
    assert_eq!(h.session.layout(), Layout::WithProblems);

    assert!(h.session.select_document(None).is_none());
    assert_eq!(h.session.view(), SessionView::Empty);
    assert_eq!(h.session.is_writable(), None);
    assert_eq!(h.session.buffer_text().as_deref(), Some(""));
    assert!(h.session.widget().unwrap().is_read_only());
    assert!(h.session.markers().is_empty());
    assert_eq!(h.session.layout(), Layout::Large);
    assert_eq!(h.session.dirty_state(), DirtyState::Original);
}

#[test]
fn markers_cleared_on_switch_and_recollected() {
    let mut h = Harness::new(bob());
    h.open(latest("broken"), DocumentSnapshot::new("variables: {}\n", bob()));
    assert_eq!(h.session.markers().len(), 2);
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert!(h.session.markers().is_empty());
}

#[test]
fn external_markers_replace_set() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.on_markers(vec![
        Marker::error(3, 7, "Unexpected property"),
        Marker::error(1, 1, "Missing property \"id\"."),
    ]);
    let labels: Vec<String> = h.session.problems().into_iter().map(|p| p.label).collect();
    assert_eq!(
        labels,
        vec![
            "3: Unexpected property".to_string(),
            "1: Missing property \"id\".".to_string()
        ]
    );
    h.session.on_markers(Vec::new());
    assert_eq!(h.session.layout(), Layout::Large);
}

#[test]
fn goto_centers_line_and_places_caret() {
    let mut h = Harness::new(bob());
    let text = "id: ping\nactivities:\n  - a\n  - b\n  - c\n  - d\n  - e\n  - f\n";
    h.open(latest("ping"), DocumentSnapshot::new(text, bob()));
    h.session.goto(5, 3);
    let widget = h.session.widget().unwrap();
    assert_eq!(widget.position(), Position::new(5, 3));
    assert_eq!(widget.viewport().centered_on, Some(5));
    assert_eq!(widget.viewport().center_line(), 5);
    assert!(widget.has_focus());
}

#[test]
fn goto_problem_jumps_to_marker() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.on_markers(vec![Marker::error(4, 7, "bad id")]);
    assert!(h.session.goto_problem(0));
    assert_eq!(h.session.widget().unwrap().position(), Position::new(4, 7));
    assert!(!h.session.goto_problem(3));
}

#[test]
fn goto_without_widget_is_noop() {
    let mut h = Harness::new(bob());
    h.session.goto(5, 3);
    assert!(h.session.widget().is_none());
}

#[test]
fn snippet_applies_once_and_dirties() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    let end = Position::new(6, 1);
    h.session
        .widget_mut()
        .unwrap()
        .set_selection(Selection::caret(end));

    let snippet = "  - execute-script:\n      id: s1\n      script: ''\n";
    assert!(h.session.insert_snippet(SnippetRequest::new(7, snippet)));
    assert!(!h.session.insert_snippet(SnippetRequest::new(7, snippet)));

    let text = h.session.buffer_text().unwrap();
    assert_eq!(text.matches("execute-script").count(), 1);
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);
    assert!(h.session.widget().unwrap().has_focus());
}

#[test]
fn snippet_replaces_selection() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session
        .widget_mut()
        .unwrap()
        .set_selection(Selection::new(Position::new(1, 5), Position::new(1, 9)));
    assert!(h.session.insert_snippet(SnippetRequest::new(1, "pong")));
    assert!(h.session.buffer_text().unwrap().starts_with("id: pong\n"));
}

#[test]
fn snippet_ignored_when_empty_unbound_or_read_only() {
    let mut h = Harness::new(bob());
    assert!(!h.session.insert_snippet(SnippetRequest::new(1, "x: 1")));

    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    assert!(!h.session.insert_snippet(SnippetRequest::new(2, "")));
    // Consumed while no widget was bound.
    assert!(!h.session.insert_snippet(SnippetRequest::new(1, "x: 1")));

    h.open(latest("echo"), DocumentSnapshot::new(ECHO, alice()));
    assert!(!h.session.insert_snippet(SnippetRequest::new(3, "x: 1")));
    assert_eq!(h.session.buffer_text().as_deref(), Some(ECHO));
    assert_eq!(h.session.dirty_state(), DirtyState::Original);
}

#[test]
fn selection_during_save_is_queued_until_completion() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let (ticket, _) = submission(h.session.save().unwrap());

    assert!(h.session.select_document(Some(latest("echo"))).is_none());
    assert_eq!(h.session.snapshot().unwrap().source_text, PING);
    assert_eq!(h.session.buffer_text(), Some(format!("#{PING}")));

    let replay = fetch_ticket(h.session.on_save_completed(ticket, Ok(())));
    assert_eq!(replay.workflow, latest("echo"));
    h.session
        .on_fetch_completed(replay, Ok(DocumentSnapshot::new(ECHO, bob())))
        .unwrap();
    assert_eq!(h.session.buffer_text().as_deref(), Some(ECHO));
}

#[test]
fn queued_selection_replays_after_failed_save() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let (ticket, _) = submission(h.session.save().unwrap());
    h.session.select_document(None);
    let replay = h
        .session
        .on_save_completed(ticket, Err(StoreError::Rejected("nope".into())));
    assert!(replay.is_none());
    assert_eq!(h.session.view(), SessionView::Empty);
}

#[test]
fn fetch_landing_during_failed_save_keeps_unsaved_text() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("# my work\n");
    let pending = fetch_ticket(h.session.select_document(Some(latest("ping"))));
    let (ticket, _) = submission(h.session.save().unwrap());

    h.session
        .on_fetch_completed(pending, Ok(DocumentSnapshot::new(PING, bob())))
        .unwrap();
    assert_eq!(h.session.buffer_text(), Some(format!("# my work\n{PING}")));
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);

    let follow_up = h
        .session
        .on_save_completed(ticket, Err(StoreError::Unavailable("offline".into())));
    assert!(follow_up.is_none());
    assert_eq!(h.session.buffer_text(), Some(format!("# my work\n{PING}")));
    assert_eq!(h.session.dirty_state(), DirtyState::Modified);
    assert_eq!(h.notices(), vec![StatusNotice::error("Store unavailable: offline")]);
}

#[test]
fn fetch_landing_during_successful_save_is_refetched() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let pending = fetch_ticket(h.session.select_document(Some(latest("ping"))));
    let (ticket, _) = submission(h.session.save().unwrap());
    h.session
        .on_fetch_completed(pending.clone(), Ok(DocumentSnapshot::new(PING, bob())))
        .unwrap();
    assert_eq!(h.session.buffer_text(), Some(format!("#{PING}")));

    let refetch = fetch_ticket(h.session.on_save_completed(ticket, Ok(())));
    assert_eq!(refetch.workflow, latest("ping"));
    assert!(refetch.generation > pending.generation);

    let published = format!("#{PING}");
    h.session
        .on_fetch_completed(refetch, Ok(DocumentSnapshot::new(published.clone(), bob())))
        .unwrap();
    assert_eq!(h.session.buffer_text(), Some(published));
    assert_eq!(h.session.dirty_state(), DirtyState::Original);
}

#[test]
fn queued_selection_wins_over_fetch_held_during_save() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let pending = fetch_ticket(h.session.select_document(Some(latest("ping"))));
    let (ticket, _) = submission(h.session.save().unwrap());
    h.session
        .on_fetch_completed(pending, Ok(DocumentSnapshot::new(PING, bob())))
        .unwrap();
    assert!(h.session.select_document(Some(latest("echo"))).is_none());

    let replay = fetch_ticket(h.session.on_save_completed(ticket, Ok(())));
    assert_eq!(replay.workflow, latest("echo"));
}

#[test]
fn save_shortcut_bound_at_creation_triggers_save() {
    let mut h = Harness::new(bob());
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let effects = h.session.handle(Event::Key(KeyCombo::new('s', KeyMods::CTRL)));
    assert_eq!(effects.len(), 1);
    assert!(h.session.is_saving());

    // Unbound combos do nothing.
    let effects = h.session.handle(Event::Key(KeyCombo::new('q', KeyMods::CTRL)));
    assert!(effects.is_empty());
}

#[test]
fn configured_label_and_message_are_used() {
    let mut settings = core_session::SessionSettings::default();
    settings.save_label = "Autosave".into();
    settings.success_message = "Saved!".into();
    let mut h = Harness::with_settings(bob(), settings);
    h.open(latest("ping"), DocumentSnapshot::new(PING, bob()));
    h.session.type_text("#");
    let (ticket, version) = submission(h.session.save().unwrap());
    assert_eq!(version.label, "Autosave");
    h.session.on_save_completed(ticket, Ok(()));
    assert_eq!(h.notices(), vec![StatusNotice::info("Saved!")]);
}

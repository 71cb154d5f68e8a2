
use fixtures::*;
use glpw::api;
use glpw::app::{AppState, PendingAction, View};
use glpw::input::{self, Action, InputMode};
use glpw::status::JobStatus;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use pretty_assertions::assert_eq;

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

/// Feeds a key through the full mapping path, the way the event loop does.
fn feed(state: &mut AppState, code: KeyCode) -> Action {
    input::map_key(press(code), &state.input_context())
}

// ========== Wire to grid ==========

#[test]
fn full_flow_response_to_grid() {
    let pipeline =
        api::decode_pipeline_response(&three_stage_response(), "acme/widget", "main")
            .expect("decode should succeed");
    assert_eq!(pipeline.iid, 42);
    assert_eq!(pipeline.stages.len(), 3);
    assert_eq!(pipeline.stages[0].name, "Build");
    assert_eq!(pipeline.stages[1].jobs.len(), 2);
    assert_eq!(pipeline.stages[2].jobs[0].status, JobStatus::Created);

    let mut state = AppState::new(
        "acme/widget".to_string(),
        "https://gitlab.example.com".to_string(),
        "main".to_string(),
    );
    state.open_pipeline(pipeline);

    let View::Grid(grid) = &state.view else {
        panic!("expected grid view");
    };
    assert_eq!(grid.panes.len(), 3);
    assert_eq!(grid.focused, 0);

    let msg = &state.notifications.last().expect("notification").message;
    assert!(msg.contains("#42"), "{msg}");
    assert!(msg.contains("running"), "{msg}");
}

#[test]
fn zero_stage_pipeline_is_refused() {
    let mut state = AppState::new(
        "acme/widget".to_string(),
        "https://gitlab.example.com".to_string(),
        "main".to_string(),
    );
    state.open_pipeline(pipeline(5, vec![]));
    assert!(matches!(state.view, View::Closed));
    let err = state.error_message().expect("error expected");
    assert!(err.to_lowercase().contains("no stages"), "{err}");
}

// ========== Navigation through the key path ==========

#[test]
fn column_focus_wraps_modulo_stage_count() {
    let mut state = open_state();
    for _ in 0..3 {
        assert_eq!(feed(&mut state, KeyCode::Char('l')), Action::NextColumn);
        state.move_focus(1);
    }
    let View::Grid(grid) = &state.view else { panic!() };
    assert_eq!(grid.focused, 0);

    assert_eq!(feed(&mut state, KeyCode::Char('h')), Action::PrevColumn);
    state.move_focus(-1);
    let View::Grid(grid) = &state.view else { panic!() };
    assert_eq!(grid.focused, 2);
}

#[test]
fn job_cursor_moves_within_focused_column() {
    let mut state = open_state();
    state.move_focus(1); // Test, two jobs
    assert_eq!(feed(&mut state, KeyCode::Char('j')), Action::CursorDown);
    state.move_cursor(1);
    assert_eq!(state.focused_job().expect("job").name, "integration");
}

// ========== Refresh ==========

#[test]
fn refresh_after_close_behaves_as_open() {
    let mut state = open_state();
    state.teardown_view();
    assert!(matches!(state.view, View::Closed));

    state.refresh_pipeline(three_stage_pipeline());
    let View::Grid(grid) = &state.view else {
        panic!("refresh on closed view must open the grid");
    };
    assert_eq!(grid.panes.len(), 3);
    assert_eq!(grid.focused, 0);
}

#[test]
fn refresh_in_log_mode_updates_snapshot_only() {
    let mut state = open_state();
    state.open_log().expect("log open");
    let generation = state.current_generation();

    let mut updated = three_stage_pipeline();
    updated.stages[0].jobs[0].status = JobStatus::Success;
    state.refresh_pipeline(updated);

    assert!(matches!(state.view, View::Log(_)));
    assert_eq!(state.current_generation(), generation);
    assert_eq!(
        state.pipeline.as_ref().unwrap().stages[0].jobs[0].status,
        JobStatus::Success
    );
}

// ========== Log session staleness ==========

#[test]
fn stale_log_result_never_reaches_new_session() {
    let mut state = open_state();
    let first = state.open_log().expect("first session");

    state.close_log_to_grid();
    state.move_focus(1);
    let second = state.open_log().expect("second session");
    assert!(second.generation > first.generation);

    // completion of the first session arrives late
    state.apply_log_result(first.generation, Ok("line from old job".to_string()));
    let session = state.log_session().expect("session");
    assert!(session.loading, "stale result must not clear loading");

    state.apply_log_result(second.generation, Ok("line from new job".to_string()));
    let session = state.log_session().expect("session");
    assert_eq!(session.lines, vec!["line from new job".to_string()]);
}

#[test]
fn log_result_after_back_to_grid_is_dropped() {
    let mut state = open_state();
    let open = state.open_log().expect("session");
    state.close_log_to_grid();

    state.apply_log_result(open.generation, Ok("too late".to_string()));
    assert!(matches!(state.view, View::Grid(_)));
}

// ========== Confirmation gating ==========

#[test]
fn decline_means_no_action_is_taken() {
    let mut state = open_state();
    state.request_cancel_job();
    assert_eq!(state.input_context().mode, InputMode::Confirm);

    // any key except y declines
    assert_eq!(feed(&mut state, KeyCode::Char('n')), Action::ConfirmDecline);
    state.decline_confirm();
    assert!(state.take_confirmed().is_none());
    assert_eq!(state.input_context().mode, InputMode::Grid);
}

#[test]
fn accept_yields_the_armed_action_exactly_once() {
    let mut state = open_state();
    state.request_cancel_pipeline();
    assert_eq!(feed(&mut state, KeyCode::Char('y')), Action::ConfirmAccept);

    let action = state.take_confirmed().expect("armed action");
    assert_eq!(action, PendingAction::CancelPipeline { id: 42 });
    assert!(state.take_confirmed().is_none(), "action must not repeat");
}

#[test]
fn confirm_prompt_targets_job_under_cursor() {
    let mut state = open_state();
    state.move_focus(1);
    state.move_cursor(1); // integration, id 102
    state.request_cancel_job();
    let action = state.take_confirmed().expect("armed action");
    assert_eq!(
        action,
        PendingAction::CancelJob {
            id: 102,
            name: "integration".to_string()
        }
    );
}

// ========== End-to-end scenario ==========

#[test]
fn watch_drill_in_and_return() {
    let mut state = open_state();

    // drill into the running build job
    assert_eq!(feed(&mut state, KeyCode::Enter), Action::OpenLog);
    let open = state.open_log().expect("log opens");
    assert!(open.poll, "running job polls");
    assert_eq!(open.job_id, 100);

    // first trace arrives, then a poll tick appends
    state.apply_log_result(open.generation, Ok("fetching sources".to_string()));
    state.apply_log_result(
        open.generation,
        Ok("fetching sources\ncompiling".to_string()),
    );
    let session = state.log_session().expect("session");
    assert_eq!(session.lines.len(), 2);
    assert!(session.follow);

    // back out, grid is rebuilt from the snapshot
    assert_eq!(feed(&mut state, KeyCode::Esc), Action::BackToGrid);
    state.close_log_to_grid();
    let View::Grid(grid) = &state.view else { panic!() };
    assert_eq!(grid.panes.len(), 3);

    // late poll completion from the closed session changes nothing
    state.apply_log_result(open.generation, Ok("compiled ok".to_string()));
    assert!(matches!(state.view, View::Grid(_)));
}

use crate::input::{InputContext, InputMode};
use crate::layout::compute_layout;
use crate::logview::LogSession;
use crate::model::{Job, Pipeline, Stage};
use ratatui::layout::Rect;
use std::time::Instant;

// UI constants
pub const NOTIFICATION_TTL_SECS: u64 = 5;
pub const ERROR_TTL_SECS: u64 = 10;
pub const SPINNER_FRAME_COUNT: usize = 10;
pub const PAGE_SCROLL_LINES: usize = 20;

/// Grid-mode view state: one pane rectangle per stage column plus the
/// cursor (focused column, selected job row).
pub struct GridView {
    pub panes: Vec<Rect>,
    pub focused: usize,
    pub cursor: usize,
}

/// The view state machine. Panes exist only in `Grid`, a log session only
/// in `Log`; every transition tears the old state down first.
pub enum View {
    Closed,
    Grid(GridView),
    Log(LogSession),
}

/// A destructive action awaiting explicit confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CancelJob { id: u64, name: String },
    CancelPipeline { id: u64 },
}

pub struct ConfirmPrompt {
    pub message: String,
    pub action: PendingAction,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: Instant,
}

/// Single-owner UI state. Only the event loop mutates this; background
/// tasks report back through `AppEvent` completions which are checked for
/// staleness against `session_seq` before they may touch anything.
pub struct AppState {
    pub project_path: String,
    pub base_url: String,
    pub git_ref: String,

    /// Last-good pipeline snapshot; replaced wholesale per successful
    /// fetch, never patched in place.
    pub pipeline: Option<Pipeline>,
    pub view: View,
    pub confirm: Option<ConfirmPrompt>,

    /// Bumped on every view teardown; log sessions are tagged with the
    /// value current at their creation.
    session_seq: u64,

    /// Area available to the stage grid, updated each frame.
    grid_area: Rect,

    pub is_loading: bool,
    pub notifications: Vec<Notification>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(project_path: String, base_url: String, git_ref: String) -> Self {
        Self {
            project_path,
            base_url,
            git_ref,
            pipeline: None,
            view: View::Closed,
            confirm: None,
            session_seq: 0,
            grid_area: Rect::new(0, 0, 80, 24),
            is_loading: false,
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Current staleness token. A log completion tagged with an older value
    /// must be discarded.
    pub fn current_generation(&self) -> u64 {
        self.session_seq
    }

    /// Records the area the grid may occupy; recomputes pane geometry when
    /// the terminal was resized.
    pub fn sync_viewport(&mut self, area: Rect) {
        if area == self.grid_area {
            return;
        }
        self.grid_area = area;
        let stage_count = self.pipeline.as_ref().map_or(0, |p| p.stages.len());
        if let View::Grid(grid) = &mut self.view {
            if stage_count > 0 {
                grid.panes = compute_layout(area, stage_count);
            }
        }
    }

    /// Lines visible inside the log pane at the current viewport size
    /// (pane borders excluded). Scrolling and rendering share this value.
    pub fn log_visible_height(&self) -> usize {
        self.grid_area.height.saturating_sub(2) as usize
    }

    /// Unconditional teardown of whatever view is open. Bumping the
    /// generation first stops the log poll loop and neutralizes in-flight
    /// completions before the pane state is dropped.
    pub fn teardown_view(&mut self) {
        self.session_seq += 1;
        self.view = View::Closed;
        self.confirm = None;
    }

    // --- Closed → Grid ---

    /// Opens the stage grid for a fetched pipeline. Always tears prior
    /// state down first, so it is safe to call from any mode.
    pub fn open_pipeline(&mut self, pipeline: Pipeline) {
        self.teardown_view();
        if pipeline.stages.is_empty() {
            self.pipeline = None;
            self.set_error(format!(
                "No stages found in pipeline #{}",
                pipeline.iid
            ));
            return;
        }
        let panes = compute_layout(self.grid_area, pipeline.stages.len());
        self.notify(format!(
            "Pipeline #{} {} · created {}",
            pipeline.iid,
            pipeline.status.label(),
            pipeline.created_at.format("%Y-%m-%d %H:%M")
        ));
        self.pipeline = Some(pipeline);
        self.view = View::Grid(GridView {
            panes,
            focused: 0,
            cursor: 0,
        });
    }

    // --- Grid → Grid (refresh), or open when closed ---

    /// Applies a freshly fetched pipeline. With no grid open this behaves
    /// exactly as `open_pipeline`; with a grid open it replaces the data,
    /// re-laying out when the stage count changed, and keeps the cursor in
    /// range. A log session only has its backing snapshot updated.
    pub fn refresh_pipeline(&mut self, pipeline: Pipeline) {
        match &mut self.view {
            View::Closed => self.open_pipeline(pipeline),
            View::Log(_) => {
                self.pipeline = Some(pipeline);
            }
            View::Grid(grid) => {
                if pipeline.stages.is_empty() {
                    self.teardown_view();
                    self.pipeline = None;
                    self.set_error("No stages found in pipeline".to_string());
                    return;
                }
                if pipeline.stages.len() != grid.panes.len() {
                    grid.panes = compute_layout(self.grid_area, pipeline.stages.len());
                }
                if grid.focused >= pipeline.stages.len() {
                    grid.focused = pipeline.stages.len() - 1;
                }
                let jobs = pipeline.stages[grid.focused].jobs.len();
                if jobs == 0 {
                    grid.cursor = 0;
                } else if grid.cursor >= jobs {
                    grid.cursor = jobs - 1;
                }
                self.pipeline = Some(pipeline);
            }
        }
    }

    // --- Grid navigation ---

    /// Moves column focus, wrapping modulo the stage count. No-op without
    /// panes.
    pub fn move_focus(&mut self, delta: i64) {
        let Some(pipeline) = &self.pipeline else { return };
        if let View::Grid(grid) = &mut self.view {
            let n = grid.panes.len() as i64;
            if n == 0 {
                return;
            }
            grid.focused = (grid.focused as i64 + delta).rem_euclid(n) as usize;
            let jobs = pipeline
                .stages
                .get(grid.focused)
                .map_or(0, |s| s.jobs.len());
            if grid.cursor >= jobs {
                grid.cursor = jobs.saturating_sub(1);
            }
        }
    }

    pub fn move_cursor(&mut self, delta: i64) {
        let Some(pipeline) = &self.pipeline else { return };
        if let View::Grid(grid) = &mut self.view {
            let jobs = pipeline
                .stages
                .get(grid.focused)
                .map_or(0, |s| s.jobs.len());
            if jobs == 0 {
                return;
            }
            let max = (jobs - 1) as i64;
            grid.cursor = (grid.cursor as i64 + delta).clamp(0, max) as usize;
        }
    }

    pub fn focused_stage(&self) -> Option<&Stage> {
        if let View::Grid(grid) = &self.view {
            self.pipeline.as_ref()?.stages.get(grid.focused)
        } else {
            None
        }
    }

    pub fn focused_job(&self) -> Option<&Job> {
        if let View::Grid(grid) = &self.view {
            self.focused_stage()?.jobs.get(grid.cursor)
        } else {
            None
        }
    }

    // --- Grid ⇄ Log ---

    /// Drills into the focused job's log. Grid panes are disposed before
    /// the session is created. Returns what the caller needs to start the
    /// fetch (and the poll loop, for active jobs).
    pub fn open_log(&mut self) -> Option<LogOpen> {
        let job = self.focused_job()?.clone();
        let Some(job_id) = job.numeric_id() else {
            self.set_error(format!("Malformed job id '{}'", job.id));
            return None;
        };
        self.teardown_view();
        let session = LogSession::new(self.session_seq, job);
        let open = LogOpen {
            generation: session.generation,
            job_id,
            poll: session.polling,
        };
        self.view = View::Log(session);
        Some(open)
    }

    /// Back-navigation: ends the log session and re-opens the grid from the
    /// stored snapshot. No fresh fetch happens here.
    pub fn close_log_to_grid(&mut self) {
        if !matches!(self.view, View::Log(_)) {
            return;
        }
        self.teardown_view();
        if let Some(pipeline) = self.pipeline.take() {
            self.open_pipeline(pipeline);
        }
    }

    pub fn log_session(&self) -> Option<&LogSession> {
        if let View::Log(session) = &self.view {
            Some(session)
        } else {
            None
        }
    }

    pub fn log_session_mut(&mut self) -> Option<&mut LogSession> {
        if let View::Log(session) = &mut self.view {
            Some(session)
        } else {
            None
        }
    }

    /// Applies a log fetch completion iff it belongs to the live session.
    /// Stale completions are a correctness no-op, not an error.
    pub fn apply_log_result(&mut self, generation: u64, result: Result<String, String>) {
        let Some(session) = self.log_session_mut() else {
            tracing::trace!(generation, "log result after session close, discarded");
            return;
        };
        if session.generation != generation {
            tracing::trace!(generation, "stale log result discarded");
            return;
        }
        match result {
            Ok(raw) => session.set_content(&raw),
            Err(msg) => session.set_error(&msg),
        }
    }

    // --- Confirmation flow ---

    /// Arms the confirm prompt for cancelling the job under the cursor.
    pub fn request_cancel_job(&mut self) {
        let Some(job) = self.focused_job() else { return };
        let Some(id) = job.numeric_id() else {
            let gid = job.id.clone();
            self.set_error(format!("Malformed job id '{gid}'"));
            return;
        };
        let name = job.name.clone();
        self.confirm = Some(ConfirmPrompt {
            message: format!("Cancel job '{name}'?"),
            action: PendingAction::CancelJob { id, name },
        });
    }

    pub fn request_cancel_pipeline(&mut self) {
        let Some(pipeline) = &self.pipeline else { return };
        let Some(id) = pipeline.numeric_id() else {
            let gid = pipeline.id.clone();
            self.set_error(format!("Malformed pipeline id '{gid}'"));
            return;
        };
        self.confirm = Some(ConfirmPrompt {
            message: format!("Cancel pipeline #{}?", pipeline.iid),
            action: PendingAction::CancelPipeline { id },
        });
    }

    /// Consumes the armed action on an explicit acceptance. At most one
    /// caller can observe it.
    pub fn take_confirmed(&mut self) -> Option<PendingAction> {
        self.confirm.take().map(|prompt| prompt.action)
    }

    pub fn decline_confirm(&mut self) {
        self.confirm = None;
    }

    // --- Transient UI ---

    pub fn input_context(&self) -> InputContext {
        let mode = if self.confirm.is_some() {
            InputMode::Confirm
        } else if matches!(self.view, View::Log(_)) {
            InputMode::Log
        } else {
            InputMode::Grid
        };
        InputContext {
            mode,
            has_error: self.error.is_some(),
            is_loading: self.is_loading,
        }
    }

    pub fn notify(&mut self, message: String) {
        self.notifications.push(Notification {
            message,
            timestamp: Instant::now(),
        });
    }

    pub fn prune_notifications(&mut self) {
        let now = Instant::now();
        self.notifications
            .retain(|n| now.duration_since(n.timestamp).as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }
}

/// What `open_log` hands back so the caller can start the background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOpen {
    pub generation: u64,
    pub job_id: u64,
    pub poll: bool,
}

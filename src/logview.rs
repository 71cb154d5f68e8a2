use crate::api::GitLabClient;
use crate::events::AppEvent;
use crate::model::Job;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub const LOADING_PLACEHOLDER: &str = "Loading log…";

/// State of the single full-screen log pane.
///
/// `generation` ties every deferred completion (fetch, poll tick) to the
/// session that issued it; a completion whose generation no longer matches
/// the current session is discarded without touching the pane.
pub struct LogSession {
    pub generation: u64,
    pub job: Job,
    pub lines: Vec<String>,
    pub scroll: usize,
    /// Tail-follow: while set, the view sticks to the last line and manual
    /// scrolling is what clears it.
    pub follow: bool,
    pub loading: bool,
    /// Fixed from the job's status at open time; not re-evaluated while the
    /// session lives.
    pub polling: bool,
}

impl LogSession {
    pub fn new(generation: u64, job: Job) -> Self {
        let polling = job.status.is_active();
        Self {
            generation,
            job,
            lines: vec![LOADING_PLACEHOLDER.to_string()],
            scroll: 0,
            follow: true,
            loading: true,
            polling,
        }
    }

    /// Full replacement of pane content from raw trace text.
    pub fn set_content(&mut self, raw: &str) {
        self.lines = split_log_lines(raw);
        if self.lines.is_empty() {
            self.lines.push("(empty log)".to_string());
        }
        self.loading = false;
    }

    /// A fetch failure becomes a single in-pane error line; the session
    /// stays open and a manual refresh can recover it.
    pub fn set_error(&mut self, message: &str) {
        self.lines = vec![format!("Error: {message}")];
        self.loading = false;
    }

    pub fn scroll_up(&mut self, amount: usize, visible_height: usize) {
        self.scroll = self.effective_scroll(visible_height).saturating_sub(amount);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, amount: usize, visible_height: usize) {
        let max = self.max_scroll(visible_height);
        self.scroll = (self.effective_scroll(visible_height) + amount).min(max);
        self.follow = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    pub fn max_scroll(&self, visible_height: usize) -> usize {
        self.lines.len().saturating_sub(visible_height)
    }

    /// Scroll position the renderer should use, honoring tail-follow.
    pub fn effective_scroll(&self, visible_height: usize) -> usize {
        if self.follow {
            self.max_scroll(visible_height)
        } else {
            self.scroll.min(self.max_scroll(visible_height))
        }
    }
}

/// Strips ANSI CSI sequences (`ESC [ <params> <final-byte>`) from raw trace
/// text. Lone escape characters are dropped as well; everything else is kept
/// verbatim.
pub fn strip_ansi(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // parameter and intermediate bytes run up to the final byte
            // in 0x40..=0x7E
            for b in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&b) {
                    break;
                }
            }
        }
    }
    out
}

/// Splits stripped trace text into display lines. A carriage return inside a
/// line overwrites it, so only the last segment survives.
pub fn split_log_lines(raw: &str) -> Vec<String> {
    strip_ansi(raw)
        .lines()
        .map(|line| {
            line.rsplit('\r')
                .next()
                .unwrap_or(line)
                .to_string()
        })
        .collect()
}

/// Recurring poll loop for a job in an active status. The loop watches the
/// current session generation and exits as soon as the session it was
/// started for is no longer the live one; results are also generation-tagged
/// so the receiving side can discard stragglers.
pub async fn poll_job_log(
    client: Arc<GitLabClient>,
    job_id: u64,
    generation: u64,
    interval: Duration,
    gen_rx: watch::Receiver<u64>,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    loop {
        tokio::time::sleep(interval).await;
        if *gen_rx.borrow() != generation {
            tracing::trace!(generation, "log poll loop stopping");
            return;
        }
        let result = client
            .fetch_job_log(job_id)
            .await
            .map_err(|e| e.to_string());
        if tx.send(AppEvent::LogResult { generation, result }).is_err() {
            return;
        }
    }
}

/// One-shot fetch for the log pane (initial load or manual refresh).
pub async fn fetch_log_once(
    client: Arc<GitLabClient>,
    job_id: u64,
    generation: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let result = client
        .fetch_job_log(job_id)
        .await
        .map_err(|e| e.to_string());
    let _ = tx.send(AppEvent::LogResult { generation, result });
}

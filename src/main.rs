use glpw::api::GitLabClient;
use glpw::app::{AppState, PendingAction};
use glpw::browser;
use glpw::cli::Cli;
use glpw::config::{self, ApiContext};
use glpw::events::{AppEvent, EventHandler};
use glpw::git;
use glpw::input::{self, Action};
use glpw::logview;
use glpw::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    // Everything the client needs is resolved before the terminal is taken
    // over, so failures land on stderr instead of a half-drawn screen.
    let (ctx, git_ref) = match resolve_startup(&args).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let client = match GitLabClient::new(&ctx) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut state = AppState::new(ctx.project_path.clone(), ctx.base_url.clone(), git_ref);

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut state, events, &client, &args).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn resolve_startup(args: &Cli) -> Result<(ApiContext, String)> {
    let token = config::resolve_token(args)?;
    let git_ref = match &args.git_ref {
        Some(r) => r.clone(),
        None => git::current_branch().await?,
    };
    let remote_url = git::remote_url(&args.remote).await?;
    let project_path = git::project_path(&remote_url)?;
    let base_url = git::gitlab_base_url(&remote_url, args.gitlab_url.as_deref());
    tracing::info!(project_path, base_url, git_ref, "resolved project");
    Ok((
        ApiContext {
            base_url,
            token,
            project_path,
        },
        git_ref,
    ))
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    client: &Arc<GitLabClient>,
    args: &Cli,
) -> Result<()> {
    let tx = events.sender();
    let mut last_tick = Instant::now();

    // Every log session watches this for the current generation; bumping it
    // is what stops a session's poll loop.
    let (gen_tx, gen_rx) = watch::channel(state.current_generation());

    spawn_pipeline_fetch(state, client, &tx);

    loop {
        let size = terminal.size()?;
        state.sync_viewport(tui::render::body_area(Rect::new(0, 0, size.width, size.height)));
        terminal.draw(|f| tui::render::render(f, state))?;

        if let Some(event) = events.next().await {
            match event {
                AppEvent::Key(key) => {
                    let action = input::map_key(key, &state.input_context());
                    handle_action(action, state, client, &tx, &gen_rx, args);
                }
                AppEvent::Tick => {
                    if last_tick.elapsed() >= Duration::from_millis(100) {
                        state.advance_spinner();
                        last_tick = Instant::now();
                    }
                    state.prune_notifications();
                    state.prune_error();
                }
                AppEvent::PipelineResult(Ok(pipeline)) => {
                    state.is_loading = false;
                    state.refresh_pipeline(pipeline);
                }
                AppEvent::PipelineResult(Err(e)) => {
                    state.is_loading = false;
                    state.set_error(e);
                }
                AppEvent::LogResult { generation, result } => {
                    state.apply_log_result(generation, result);
                }
                AppEvent::ActionOutcome { label, result } => match result {
                    Ok(()) => {
                        state.notify(format!("{label} requested"));
                        spawn_pipeline_fetch(state, client, &tx);
                    }
                    Err(e) => state.set_error(format!("{label} failed: {e}")),
                },
            }
        }

        // Publish the generation after every event so superseded log
        // sessions see the change on their next poll.
        gen_tx.send_replace(state.current_generation());

        if state.should_quit {
            return Ok(());
        }
    }
}

fn handle_action(
    action: Action,
    state: &mut AppState,
    client: &Arc<GitLabClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
    gen_rx: &watch::Receiver<u64>,
    args: &Cli,
) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::DismissError => state.clear_error(),
        Action::PrevColumn => state.move_focus(-1),
        Action::NextColumn => state.move_focus(1),
        Action::CursorUp => state.move_cursor(-1),
        Action::CursorDown => state.move_cursor(1),
        Action::OpenLog => {
            if let Some(open) = state.open_log() {
                let once = client.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    logview::fetch_log_once(once, open.job_id, open.generation, tx2).await;
                });
                if open.poll {
                    let poll_client = client.clone();
                    let poll_tx = tx.clone();
                    let poll_rx = gen_rx.clone();
                    let interval = Duration::from_secs(args.interval.max(1));
                    tokio::spawn(async move {
                        logview::poll_job_log(
                            poll_client,
                            open.job_id,
                            open.generation,
                            interval,
                            poll_rx,
                            poll_tx,
                        )
                        .await;
                    });
                }
            }
        }
        Action::BackToGrid => state.close_log_to_grid(),
        Action::Refresh => {
            if let Some(session) = state.log_session() {
                if let Some(job_id) = session.job.numeric_id() {
                    let generation = session.generation;
                    let once = client.clone();
                    let tx2 = tx.clone();
                    tokio::spawn(async move {
                        logview::fetch_log_once(once, job_id, generation, tx2).await;
                    });
                }
            } else {
                spawn_pipeline_fetch(state, client, tx);
            }
        }
        Action::CancelJob => state.request_cancel_job(),
        Action::CancelPipeline => state.request_cancel_pipeline(),
        Action::RetryJob => {
            if let Some(id) = state.focused_job().and_then(|j| j.numeric_id()) {
                let retry = client.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let result = retry.retry_job(id).await.map_err(|e| e.to_string());
                    let _ = tx2.send(AppEvent::ActionOutcome {
                        label: "Job retry",
                        result,
                    });
                });
            }
        }
        Action::RetryPipeline => {
            if let Some(id) = state.pipeline.as_ref().and_then(|p| p.numeric_id()) {
                let retry = client.clone();
                let tx2 = tx.clone();
                tokio::spawn(async move {
                    let result = retry.retry_pipeline(id).await.map_err(|e| e.to_string());
                    let _ = tx2.send(AppEvent::ActionOutcome {
                        label: "Pipeline retry",
                        result,
                    });
                });
            }
        }
        Action::OpenBrowser => {
            if let Some(job) = state.focused_job() {
                let url = browser::web_url(&state.base_url, &job.web_path);
                if let Err(e) = browser::open_in_browser(&url) {
                    state.set_error(e.to_string());
                }
            }
        }
        Action::ConfirmAccept => {
            if let Some(action) = state.take_confirmed() {
                run_pending_action(action, client, tx);
            }
        }
        Action::ConfirmDecline => state.decline_confirm(),
        Action::ScrollUp => {
            let h = state.log_visible_height();
            if let Some(s) = state.log_session_mut() {
                s.scroll_up(1, h);
            }
        }
        Action::ScrollDown => {
            let h = state.log_visible_height();
            if let Some(s) = state.log_session_mut() {
                s.scroll_down(1, h);
            }
        }
        Action::PageUp => {
            let h = state.log_visible_height();
            if let Some(s) = state.log_session_mut() {
                s.scroll_up(glpw::app::PAGE_SCROLL_LINES, h);
            }
        }
        Action::PageDown => {
            let h = state.log_visible_height();
            if let Some(s) = state.log_session_mut() {
                s.scroll_down(glpw::app::PAGE_SCROLL_LINES, h);
            }
        }
        Action::ScrollToTop => {
            if let Some(s) = state.log_session_mut() {
                s.scroll_to_top();
            }
        }
        Action::ScrollToBottom => {
            if let Some(s) = state.log_session_mut() {
                s.scroll_to_bottom();
            }
        }
        Action::None => {}
    }
}

fn run_pending_action(
    action: PendingAction,
    client: &Arc<GitLabClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let (label, result) = match action {
            PendingAction::CancelJob { id, .. } => (
                "Job cancel",
                client.cancel_job(id).await.map_err(|e| e.to_string()),
            ),
            PendingAction::CancelPipeline { id } => (
                "Pipeline cancel",
                client.cancel_pipeline(id).await.map_err(|e| e.to_string()),
            ),
        };
        let _ = tx.send(AppEvent::ActionOutcome { label, result });
    });
}

fn spawn_pipeline_fetch(
    state: &mut AppState,
    client: &Arc<GitLabClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    if state.is_loading {
        return;
    }
    state.is_loading = true;
    let client = client.clone();
    let tx = tx.clone();
    let git_ref = state.git_ref.clone();
    tokio::spawn(async move {
        let result = client
            .fetch_pipeline(&git_ref)
            .await
            .map_err(|e| e.to_string());
        let _ = tx.send(AppEvent::PipelineResult(result));
    });
}

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "glpw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("glpw")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("glpw")
    } else {
        std::path::PathBuf::from("/tmp/glpw")
    }
}

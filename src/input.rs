use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    // Grid
    PrevColumn,
    NextColumn,
    CursorUp,
    CursorDown,
    OpenLog,
    CancelJob,
    RetryJob,
    CancelPipeline,
    RetryPipeline,
    Refresh,
    OpenBrowser,
    // Log
    BackToGrid,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    // Confirm
    ConfirmAccept,
    ConfirmDecline,
    None,
}

/// Which surface currently interprets key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Grid,
    Log,
    Confirm,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub mode: InputMode,
    pub has_error: bool,
    pub is_loading: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // Confirm prompt: only an explicit `y` is an acceptance; every other
    // key press declines.
    if ctx.mode == InputMode::Confirm {
        return match key.code {
            KeyCode::Char('y') => Action::ConfirmAccept,
            _ => Action::ConfirmDecline,
        };
    }

    if ctx.mode == InputMode::Log {
        return match key.code {
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') => Action::ScrollToTop,
            KeyCode::Char('G') => Action::ScrollToBottom,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('q') | KeyCode::Esc => Action::BackToGrid,
            KeyCode::Char('Q') => Action::Quit,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Left | KeyCode::Char('h') => Action::PrevColumn,
        KeyCode::Right | KeyCode::Char('l') => Action::NextColumn,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Enter => Action::OpenLog,
        KeyCode::Char('x') => Action::CancelJob,
        KeyCode::Char('t') => Action::RetryJob,
        KeyCode::Char('X') => Action::CancelPipeline,
        KeyCode::Char('R') => Action::RetryPipeline,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Char('o') => Action::OpenBrowser,
        _ => Action::None,
    }
}

use crate::app::{AppState, View};
use crate::tui::{confirm_overlay, footer, grid, header, log_pane};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Body rectangle for a given terminal area; the event loop uses the same
/// split to keep pane geometry in sync with what gets drawn.
pub fn body_area(area: Rect) -> Rect {
    layout_chunks(area)[1]
}

fn layout_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // stage grid or log pane
            Constraint::Length(2), // footer
        ])
        .split(area)
}

pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = layout_chunks(f.area());

    header::render(f, chunks[0], state);
    match &state.view {
        View::Grid(_) => grid::render(f, state),
        View::Log(_) => log_pane::render(f, chunks[1], state),
        View::Closed => render_closed(f, chunks[1], state),
    }
    footer::render(f, chunks[2], state);

    // Error banner pinned above the footer
    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(5),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(err_widget, err_area);
        }
    }

    // Confirm modal on top of everything
    if let Some(prompt) = &state.confirm {
        confirm_overlay::render(f, prompt);
    }
}

fn render_closed(f: &mut Frame, area: Rect, state: &AppState) {
    let text = if state.is_loading {
        format!(
            "{} Fetching pipeline for {} [{}]…",
            crate::tui::spinner::frame(state.spinner_frame),
            state.project_path,
            state.git_ref
        )
    } else {
        "No pipeline view open. Press r to fetch, q to quit.".to_string()
    };
    let vertical = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(area);
    let line = Line::from(text).centered();
    f.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        vertical[1],
    );
}

use crate::app::AppState;
use crate::logview::LogSession;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Draws the single full-size log pane into the body area.
pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(session) = state.log_session() else { return };
    if area.height < 3 {
        return;
    }

    let visible = state.log_visible_height();
    let offset = session.effective_scroll(visible);

    let lines: Vec<Line> = session
        .lines
        .iter()
        .skip(offset)
        .take(visible)
        .map(|l| Line::from(l.as_str()))
        .collect();

    let block = Block::default()
        .title(title(session, state))
        .title_bottom(position_indicator(session, offset, visible))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn title(session: &LogSession, state: &AppState) -> Line<'static> {
    let status = session.job.status;
    let mut spans = vec![
        Span::styled(
            format!(" {} {} ", status.glyph(), session.job.name),
            Style::default()
                .fg(crate::tui::emphasis_color(status.emphasis()))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({}) ", status.label()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if session.loading || (session.polling && state.is_loading) {
        spans.push(Span::styled(
            format!("{} ", spinner::frame(state.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn position_indicator(session: &LogSession, offset: usize, visible: usize) -> Line<'static> {
    let total = session.lines.len();
    let last = (offset + visible).min(total);
    let text = if session.follow {
        format!(" {last}/{total} (follow) ")
    } else {
        format!(" {last}/{total} ")
    };
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))).right_aligned()
}

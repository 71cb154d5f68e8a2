use crate::app::AppState;
use crate::input::InputMode;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let hints: &[(&str, &str)] = match state.input_context().mode {
        InputMode::Confirm => &[("y", "confirm"), ("other", "cancel")],
        InputMode::Log => &[
            ("j/k", "scroll"),
            ("g/G", "top/bottom"),
            ("r", "refresh"),
            ("q", "back"),
            ("Q", "quit"),
        ],
        InputMode::Grid => &[
            ("h/l", "stage"),
            ("j/k", "job"),
            ("Enter", "log"),
            ("x/t", "cancel/retry job"),
            ("X/R", "pipeline"),
            ("r", "refresh"),
            ("o", "open"),
            ("q", "quit"),
        ],
    };

    // A live notification takes the hint line over
    let line = if let Some(notif) = state.notifications.last() {
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(&notif.message, Style::default().fg(Color::Yellow)),
        ])
    } else {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

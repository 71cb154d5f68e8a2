use crate::app::ConfirmPrompt;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const DIALOG_WIDTH: u16 = 44;
const DIALOG_HEIGHT: u16 = 7;

/// Modal dialog for an armed destructive action. Drawn last, over
/// whatever view is open.
pub fn render(f: &mut Frame, prompt: &ConfirmPrompt) {
    let area = dialog_area(f.area());
    f.render_widget(Clear, area);

    let body = vec![
        Line::default(),
        Line::styled(prompt.message.clone(), Style::default().fg(Color::White)).centered(),
        Line::default(),
        hint_line().centered(),
    ];

    let dialog = Paragraph::new(body).block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Black)),
    );
    f.render_widget(dialog, area);
}

fn dialog_area(screen: Rect) -> Rect {
    let [horizontal] = Layout::horizontal([Constraint::Length(DIALOG_WIDTH)])
        .flex(Flex::Center)
        .areas(screen);
    let [area] = Layout::vertical([Constraint::Length(DIALOG_HEIGHT)])
        .flex(Flex::Center)
        .areas(horizontal);
    area
}

fn hint_line() -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "y",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" confirms, ", Style::default().fg(Color::DarkGray)),
        Span::styled("any other key", Style::default().fg(Color::Red)),
        Span::styled(" cancels", Style::default().fg(Color::DarkGray)),
    ])
}

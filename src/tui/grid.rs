use crate::app::{AppState, GridView, View};
use crate::model::Pipeline;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

/// Draws one pane per stage into the rectangles computed at layout time.
pub fn render(f: &mut Frame, state: &AppState) {
    let View::Grid(grid) = &state.view else { return };
    let Some(pipeline) = &state.pipeline else { return };
    render_panes(f, grid, pipeline);
}

fn render_panes(f: &mut Frame, grid: &GridView, pipeline: &Pipeline) {
    for (idx, (stage, pane)) in pipeline.stages.iter().zip(&grid.panes).enumerate() {
        if pane.width < 4 || pane.height < 3 {
            continue;
        }
        let focused = idx == grid.focused;

        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut title_style =
            Style::default().fg(crate::tui::emphasis_color(stage.status.emphasis()));
        if focused {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        let block = Block::default()
            .title(Span::styled(
                format!(" {} {} ", stage.status.glyph(), stage.name),
                title_style,
            ))
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner_width = (pane.width - 2) as usize;
        let inner_height = (pane.height - 2) as usize;

        // Keep the cursor row visible when a column has more jobs than rows.
        let offset = if focused {
            grid.cursor.saturating_sub(inner_height.saturating_sub(1))
        } else {
            0
        };

        let lines: Vec<Line> = stage
            .jobs
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner_height)
            .map(|(job_idx, job)| {
                let text = truncate(
                    &format!("{} {}", job.status.glyph(), job.name),
                    inner_width,
                );
                let mut style =
                    Style::default().fg(crate::tui::emphasis_color(job.status.emphasis()));
                if focused && job_idx == grid.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(text, style))
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), *pane);
    }
}

/// Display-width-aware truncation with an ellipsis.
fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

pub mod confirm_overlay;
pub mod footer;
pub mod grid;
pub mod header;
pub mod log_pane;
pub mod render;
pub mod spinner;

use crate::status::Emphasis;
use ratatui::style::Color;

/// Terminal color a status emphasis class maps to.
pub fn emphasis_color(emphasis: Emphasis) -> Color {
    match emphasis {
        Emphasis::Good => Color::Green,
        Emphasis::Bad => Color::Red,
        Emphasis::Active => Color::Yellow,
        Emphasis::Attention => Color::Magenta,
        Emphasis::Neutral => Color::DarkGray,
    }
}

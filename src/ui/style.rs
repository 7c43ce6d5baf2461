//! Layout constants and styles shared by the session view.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType};

/// Columns reserved around the two panels.
pub const HORIZONTAL_PADDING: u16 = 4;

/// Selector share of the available width, as numerator / denominator.
pub const SELECTOR_SHARE: (u32, u32) = (1, 3);

const ACCENT: Color = Color::Rgb(0xEE, 0x6F, 0xF8);
const MUTED: Color = Color::Rgb(0x60, 0x60, 0x60);

/// Widths of the selector and viewer panels for a terminal `width` columns wide.
pub fn panel_widths(width: u16) -> (u16, u16) {
    let inner = width.saturating_sub(HORIZONTAL_PADDING);
    let (num, den) = SELECTOR_SHARE;
    let left = (u32::from(inner) * num / den) as u16;
    (left, inner - left)
}

pub fn header() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn footer() -> Style {
    Style::default().fg(MUTED)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

pub fn normal() -> Style {
    Style::default()
}

pub fn dim() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// Panel frame; the focused panel gets the accent border.
pub fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let (border_type, border_style) = if focused {
        (BorderType::Thick, Style::default().fg(ACCENT))
    } else {
        (BorderType::Plain, Style::default().fg(MUTED))
    };
    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_split_available_columns() {
        assert_eq!(panel_widths(120), (38, 78));
        assert_eq!(panel_widths(80), (25, 51));
        assert_eq!(panel_widths(3), (0, 0));
    }
}

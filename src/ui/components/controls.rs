use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::{self, border},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::{audio::state::RepeatMode, util::colors};

/// Repeat mode and liked marker, drawn next to the progress gauge.
pub struct PlayerControlsWidget {
    repeat_mode: RepeatMode,
    liked: bool,
}

impl PlayerControlsWidget {
    pub fn new(repeat_mode: RepeatMode, liked: bool) -> Self {
        Self { repeat_mode, liked }
    }
}

pub fn repeat_icon(mode: RepeatMode) -> Span<'static> {
    match mode {
        RepeatMode::Off => "󰑗".fg(colors::NEUTRAL),
        RepeatMode::One => "󰑘".fg(colors::PRIMARY),
        RepeatMode::All => "󰑖".fg(colors::PRIMARY),
    }
}

pub fn liked_icon(liked: bool) -> Span<'static> {
    if liked {
        "♥".fg(colors::PRIMARY)
    } else {
        "♡".fg(colors::NEUTRAL)
    }
}

impl Widget for PlayerControlsWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut line = Line::default();
        line.push_span(repeat_icon(self.repeat_mode));
        line.push_span("  ");
        line.push_span(liked_icon(self.liked));

        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM | Borders::RIGHT)
            .border_set(border::Set {
                top_left: symbols::line::ROUNDED.horizontal_down,
                bottom_left: symbols::line::ROUNDED.horizontal_up,
                ..symbols::border::ROUNDED
            });

        Paragraph::new(line).block(block).centered().render(area, buf);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    symbols::{self, border},
    text::ToSpan,
    widgets::{Block, Borders, Gauge, Widget},
};

use crate::{audio::progress::TrackProgress, util::colors};

pub struct ProgressWidget<'a> {
    progress: &'a TrackProgress,
    title: Option<String>,
}

impl<'a> ProgressWidget<'a> {
    pub fn new(progress: &'a TrackProgress) -> Self {
        Self {
            progress,
            title: None,
        }
    }

    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }
}

impl Widget for ProgressWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (current, total) = self.progress.get_progress();
        let label = format!("{} / {}", format_duration(current), format_duration(total));

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::Set {
                top_right: symbols::line::ROUNDED.horizontal_down,
                bottom_right: symbols::line::ROUNDED.horizontal_up,
                ..symbols::border::ROUNDED
            })
            .title_alignment(Alignment::Center);
        if let Some(title) = self.title {
            block = block.title_top(title);
        }

        Gauge::default()
            .block(block)
            .ratio(self.progress.ratio())
            .label(label.to_span().fg(Color::White))
            .gauge_style(Style::default().fg(colors::PRIMARY).bg(colors::BACKGROUND))
            .use_unicode(true)
            .render(area, buf);
    }
}

/// `m:ss`, with minutes unpadded.
pub fn format_duration(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

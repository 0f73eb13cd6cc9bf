use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    audio::{
        progress::TrackProgress,
        state::{PlayerSnapshot, RepeatMode},
    },
    ui::components::{
        controls::{liked_icon, repeat_icon},
        mini_player::status_icon,
        progress::ProgressWidget,
    },
    util::colors,
};

/// Full-screen view of the current track.
pub struct PlayerWidget<'a> {
    snapshot: &'a PlayerSnapshot,
    progress: &'a TrackProgress,
    liked: bool,
}

impl<'a> PlayerWidget<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot, progress: &'a TrackProgress, liked: bool) -> Self {
        Self {
            snapshot,
            progress,
            liked,
        }
    }
}

fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::Off => "Repeat off",
        RepeatMode::All => "Repeat all",
        RepeatMode::One => "Repeat one",
    }
}

impl Widget for PlayerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(track) = self.snapshot.current_track() else {
            Paragraph::new("Nothing playing")
                .alignment(Alignment::Center)
                .fg(colors::NEUTRAL)
                .render(area, buf);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(area);

        let position = match self.snapshot.index {
            Some(i) => format!("{} of {}", i + 1, self.snapshot.queue_len),
            None => String::new(),
        };
        let repeat_mode = self.snapshot.transport.repeat_mode;

        let lines = vec![
            Line::default(),
            Line::from(Span::styled(
                track.title.as_str(),
                Style::default()
                    .fg(colors::PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(track.artist.as_str().fg(colors::ACCENT)),
            Line::default(),
            Line::from(vec![
                Span::raw(status_icon(self.snapshot)),
                Span::raw("   "),
                repeat_icon(repeat_mode),
                Span::raw(format!(" {}   ", repeat_label(repeat_mode))),
                liked_icon(self.liked),
            ]),
            Line::from(Span::styled(position, Style::default().fg(colors::NEUTRAL))),
            Line::default(),
            Line::from(track.cover_url.as_str().fg(colors::NEUTRAL)),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::NONE))
            .render(chunks[0], buf);

        ProgressWidget::new(self.progress).render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::state::PlaybackState, model::Track};

    fn render(snapshot: &PlayerSnapshot) -> String {
        let progress = TrackProgress::new();
        let area = Rect::new(0, 0, 60, 14);
        let mut buf = Buffer::empty(area);
        PlayerWidget::new(snapshot, &progress, true).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_renders_current_track() {
        let snapshot = PlayerSnapshot {
            state: PlaybackState::Playing(Track {
                id: "1".into(),
                title: "Kesariya".into(),
                artist: "Arijit Singh".into(),
                cover_url: String::new(),
                audio_url: "https://cdn/1.mp3".into(),
            }),
            index: Some(0),
            queue_len: 3,
            ..Default::default()
        };

        let screen = render(&snapshot);
        assert!(screen.contains("Kesariya"));
        assert!(screen.contains("Arijit Singh"));
        assert!(screen.contains("1 of 3"));
        assert!(screen.contains("0:00 / 0:00"));
    }

    #[test]
    fn test_renders_placeholder_when_idle() {
        assert!(render(&PlayerSnapshot::default()).contains("Nothing playing"));
    }
}

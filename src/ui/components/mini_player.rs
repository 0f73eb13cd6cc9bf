use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};

use crate::{
    audio::{progress::TrackProgress, state::PlayerSnapshot},
    ui::{
        components::{controls::PlayerControlsWidget, progress::ProgressWidget},
        util::truncate_to_width,
    },
};

/// One-line now-playing bar. Only rendered while something is loaded.
pub struct MiniPlayerWidget<'a> {
    snapshot: &'a PlayerSnapshot,
    progress: &'a TrackProgress,
    liked: bool,
}

impl<'a> MiniPlayerWidget<'a> {
    pub fn new(snapshot: &'a PlayerSnapshot, progress: &'a TrackProgress, liked: bool) -> Self {
        Self {
            snapshot,
            progress,
            liked,
        }
    }
}

pub fn status_icon(snapshot: &PlayerSnapshot) -> &'static str {
    if snapshot.state.is_loading() {
        "…"
    } else if snapshot.state.is_playing() {
        ""
    } else {
        ""
    }
}

impl Widget for MiniPlayerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(track) = self.snapshot.current_track() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(9)])
            .split(area);

        let mut info = format!("{}  {}", status_icon(self.snapshot), track.title);
        if !track.artist.is_empty() {
            info = format!("{info} by {}", track.artist);
        }
        let info = truncate_to_width(&info, chunks[0].width.saturating_sub(4) as usize);

        ProgressWidget::new(self.progress)
            .title(info)
            .render(chunks[0], buf);
        PlayerControlsWidget::new(self.snapshot.transport.repeat_mode, self.liked)
            .render(chunks[1], buf);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::{
    model::Track,
    ui::{
        components::{controls::liked_icon, spinner::Spinner},
        util::{get_active_track_icon, truncate_to_width},
    },
    util::colors,
};

/// A list of songs with the playing one marked and liked ones flagged.
pub struct SongList<'a> {
    songs: &'a [Track],
    selected: usize,
    current: Option<&'a Track>,
    is_playing: bool,
    liked: &'a im::HashSet<String>,
    loading: bool,
    empty_label: &'a str,
}

impl<'a> SongList<'a> {
    pub fn new(songs: &'a [Track], liked: &'a im::HashSet<String>) -> Self {
        Self {
            songs,
            selected: 0,
            current: None,
            is_playing: false,
            liked,
            loading: false,
            empty_label: "No songs",
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn current(mut self, current: Option<&'a Track>, is_playing: bool) -> Self {
        self.current = current;
        self.is_playing = is_playing;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn empty_label(mut self, label: &'a str) -> Self {
        self.empty_label = label;
        self
    }
}

impl Widget for SongList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.loading && self.songs.is_empty() {
            Spinner::default()
                .with_style(Style::default().fg(colors::PRIMARY))
                .with_label("Loading songs...")
                .render(area, buf);
            return;
        }

        if self.songs.is_empty() {
            Widget::render(List::new(vec![ListItem::new(self.empty_label)]), area, buf);
            return;
        }

        // Room for the highlight symbol, the playing marker and the heart.
        let text_width = area.width.saturating_sub(8) as usize;

        let items: Vec<ListItem> = self
            .songs
            .iter()
            .map(|song| {
                let is_current = self.current.is_some_and(|c| c.same_song(song));
                let prefix = if is_current {
                    format!("{} ", get_active_track_icon(self.is_playing))
                } else {
                    "  ".to_string()
                };

                let text = if song.artist.is_empty() {
                    song.title.clone()
                } else {
                    format!("{} - {}", song.title, song.artist)
                };

                let line = Line::from(vec![
                    Span::raw(prefix),
                    liked_icon(self.liked.contains(&song.id)),
                    Span::raw(" "),
                    Span::raw(truncate_to_width(&text, text_width)),
                ]);

                let mut item = ListItem::new(line);
                if is_current {
                    item = item.style(
                        Style::default()
                            .fg(colors::SECONDARY)
                            .add_modifier(Modifier::BOLD),
                    );
                }
                item
            })
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(colors::PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = ListState::default().with_selected(Some(self.selected));
        StatefulWidget::render(list, area, buf, &mut list_state);
    }
}

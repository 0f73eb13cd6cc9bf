use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols::{self, border},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::{
    ui::{
        app::App,
        components::{mini_player::MiniPlayerWidget, player::PlayerWidget},
        state::Route,
        views::{CollectionList, SongList},
    },
    util::colors,
};

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        buf.set_style(area, Style::new().bg(colors::BACKGROUND));

        let snapshot = self.player.snapshot();
        let progress = self.player.progress();
        let liked = self.player.likes().ids();
        let current = snapshot.current_track();
        let show_mini = !snapshot.state.is_idle() && !self.state.show_player;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(if show_mini { 3 } else { 0 }),
            ])
            .split(area);

        let title = if self.state.show_player {
            "Sunoji · Now Playing".to_string()
        } else if let Some(open) = &self.state.open {
            format!(
                "Sunoji · {} · {}",
                self.state.route.title(),
                open.collection.name
            )
        } else {
            format!("Sunoji · {}", self.state.route.title())
        };

        // The mini player closes the frame when it is shown.
        let (borders, border_set) = if show_mini {
            (
                Borders::LEFT | Borders::TOP | Borders::RIGHT,
                border::Set {
                    bottom_left: symbols::line::ROUNDED.vertical_right,
                    bottom_right: symbols::line::ROUNDED.vertical_left,
                    ..symbols::border::ROUNDED
                },
            )
        } else {
            (Borders::ALL, symbols::border::ROUNDED)
        };

        let mut block = Block::new()
            .borders(borders)
            .border_set(border_set)
            .title_top(Line::from(title).centered());

        if let Some(toast) = self.state.active_toast(Instant::now()) {
            let toast = Span::styled(format!(" {toast} "), Style::new().fg(colors::ERROR));
            block = block.title_top(Line::from(toast).right_aligned());
        }
        if self.state.is_searching || !self.state.search_query.is_empty() {
            let cursor = if self.state.is_searching { "▏" } else { "" };
            let query = Span::styled(
                format!(" / {}{cursor} ", self.state.search_query),
                Style::new().fg(colors::ACCENT),
            );
            block = block.title_bottom(Line::from(query).left_aligned());
        }

        let inner = block.inner(chunks[0]);
        block.render(chunks[0], buf);

        if self.state.show_player {
            let is_liked = current.is_some_and(|t| liked.contains(&t.id));
            PlayerWidget::new(&snapshot, progress, is_liked).render(inner, buf);
        } else if self.state.is_browsing_collections() {
            let collections = self.state.visible_collections();
            let empty_label = match self.state.route {
                Route::Artists => "No artists",
                _ => "No playlists",
            };
            CollectionList::new(&collections)
                .selected(self.state.selected)
                .loading(self.state.is_loading())
                .empty_label(empty_label)
                .render(inner, buf);
        } else {
            let songs = self.state.visible_songs();
            let empty_label = match self.state.route {
                Route::Liked => "No liked songs",
                _ => "No songs",
            };
            SongList::new(&songs, &self.state.liked_ids)
                .selected(self.state.selected)
                .current(current, snapshot.state.is_playing())
                .loading(self.state.is_loading())
                .empty_label(empty_label)
                .render(inner, buf);
        }

        if show_mini {
            let is_liked = current.is_some_and(|t| liked.contains(&t.id));
            MiniPlayerWidget::new(&snapshot, progress, is_liked).render(chunks[1], buf);
        }
    }
}

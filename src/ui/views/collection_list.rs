use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::{
    model::Collection,
    ui::{components::spinner::Spinner, util::truncate_to_width},
    util::colors,
};

/// Playlists or artists, with the song count when the server sends one.
pub struct CollectionList<'a> {
    collections: &'a [Collection],
    selected: usize,
    loading: bool,
    empty_label: &'a str,
}

impl<'a> CollectionList<'a> {
    pub fn new(collections: &'a [Collection]) -> Self {
        Self {
            collections,
            selected: 0,
            loading: false,
            empty_label: "Nothing here",
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
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

impl Widget for CollectionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.loading && self.collections.is_empty() {
            Spinner::default()
                .with_style(Style::default().fg(colors::PRIMARY))
                .with_label("Loading...")
                .render(area, buf);
            return;
        }

        if self.collections.is_empty() {
            Widget::render(List::new(vec![ListItem::new(self.empty_label)]), area, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .collections
            .iter()
            .map(|collection| {
                let count = collection
                    .song_count
                    .map(|n| format!(" {n} songs"))
                    .unwrap_or_default();
                let name_width = (area.width as usize)
                    .saturating_sub(2 + count.chars().count());

                ListItem::new(Line::from(vec![
                    Span::raw(truncate_to_width(&collection.name, name_width)),
                    Span::styled(count, Style::default().fg(colors::NEUTRAL)),
                ]))
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

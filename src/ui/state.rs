use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    event::events::FetchSource,
    model::{Collection, CollectionKind, Track},
};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Explore,
    Liked,
    Playlists,
    Artists,
}

impl Route {
    pub fn next(self) -> Self {
        match self {
            Route::Explore => Route::Liked,
            Route::Liked => Route::Playlists,
            Route::Playlists => Route::Artists,
            Route::Artists => Route::Explore,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Explore => "Explore",
            Route::Liked => "Liked Songs",
            Route::Playlists => "Playlists",
            Route::Artists => "Artists",
        }
    }

    /// Routes that list collections before they list songs.
    pub fn collection_kind(self) -> Option<CollectionKind> {
        match self {
            Route::Playlists => Some(CollectionKind::Playlist),
            Route::Artists => Some(CollectionKind::Artist),
            Route::Explore | Route::Liked => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

/// A playlist or artist the user drilled into.
#[derive(Debug, Clone)]
pub struct OpenCollection {
    pub collection: Collection,
    pub songs: Vec<Track>,
    pub loading: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub route: Route,
    pub songs: Vec<Track>,
    pub liked_songs: Vec<Track>,
    /// Mirror of the player's liked set, refreshed every loop.
    pub liked_ids: Arc<im::HashSet<String>>,
    pub playlists: Vec<Collection>,
    pub artists: Vec<Collection>,
    pub open: Option<OpenCollection>,
    pub songs_loading: bool,
    pub liked_loading: bool,
    pub playlists_loading: bool,
    pub artists_loading: bool,
    pub search_query: String,
    pub is_searching: bool,
    pub selected: usize,
    pub show_player: bool,
    pub toast: Option<Toast>,
}

impl AppState {
    /// The list the current view shows, after the search filter. This is also
    /// the queue handed to the player when a song is picked from it.
    pub fn visible_songs(&self) -> Vec<Track> {
        let source = match self.route {
            Route::Explore => self.songs.clone(),
            Route::Liked => self.liked_view(),
            Route::Playlists | Route::Artists => self
                .open
                .as_ref()
                .map(|open| open.songs.clone())
                .unwrap_or_default(),
        };
        filter_songs(&source, &self.search_query)
    }

    /// Songs whose id is in the liked set. The last fetched liked list comes
    /// first; songs liked since then are picked up from the other lists the
    /// app already holds.
    pub fn liked_view(&self) -> Vec<Track> {
        let open_songs = self.open.iter().flat_map(|open| open.songs.iter());
        let mut seen = HashSet::new();
        self.liked_songs
            .iter()
            .chain(self.songs.iter())
            .chain(open_songs)
            .filter(|song| self.liked_ids.contains(&song.id))
            .filter(|song| seen.insert(song.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn collections(&self, kind: CollectionKind) -> &[Collection] {
        match kind {
            CollectionKind::Playlist => &self.playlists,
            CollectionKind::Artist => &self.artists,
        }
    }

    pub fn collections_loading(&self, kind: CollectionKind) -> bool {
        match kind {
            CollectionKind::Playlist => self.playlists_loading,
            CollectionKind::Artist => self.artists_loading,
        }
    }

    pub fn set_collections_loading(&mut self, kind: CollectionKind, loading: bool) {
        match kind {
            CollectionKind::Playlist => self.playlists_loading = loading,
            CollectionKind::Artist => self.artists_loading = loading,
        }
    }

    /// True while a collection route shows its list rather than songs.
    pub fn is_browsing_collections(&self) -> bool {
        self.route.collection_kind().is_some() && self.open.is_none()
    }

    /// Collections of the current route whose name matches the search.
    pub fn visible_collections(&self) -> Vec<Collection> {
        let Some(kind) = self.route.collection_kind() else {
            return Vec::new();
        };
        let query = self.search_query.trim().to_lowercase();
        self.collections(kind)
            .iter()
            .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn selected_collection(&self) -> Option<Collection> {
        if !self.is_browsing_collections() {
            return None;
        }
        self.visible_collections().into_iter().nth(self.selected)
    }

    pub fn selected_song(&self) -> Option<Track> {
        if self.is_browsing_collections() {
            return None;
        }
        self.visible_songs().into_iter().nth(self.selected)
    }

    fn list_len(&self) -> usize {
        if self.is_browsing_collections() {
            self.visible_collections().len()
        } else {
            self.visible_songs().len()
        }
    }

    /// Whether the current view is still waiting on its data.
    pub fn is_loading(&self) -> bool {
        match (self.route, &self.open) {
            (Route::Explore, _) => self.songs_loading,
            (Route::Liked, _) => self.liked_loading,
            (_, Some(open)) => open.loading,
            (route, None) => route
                .collection_kind()
                .is_some_and(|kind| self.collections_loading(kind)),
        }
    }

    pub fn select_next(&mut self) {
        let len = self.list_len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn switch_route(&mut self) {
        self.route = self.route.next();
        self.open = None;
        self.selected = 0;
    }

    /// Starts showing `collection`; its songs arrive through
    /// [`AppState::set_collection_songs`].
    pub fn open_collection(&mut self, collection: Collection) {
        self.open = Some(OpenCollection {
            collection,
            songs: Vec::new(),
            loading: true,
        });
        self.search_query.clear();
        self.is_searching = false;
        self.selected = 0;
    }

    /// Returns false when no collection was open.
    pub fn close_collection(&mut self) -> bool {
        if self.open.take().is_none() {
            return false;
        }
        self.selected = 0;
        true
    }

    /// Clears the search first, then leaves an open collection.
    pub fn go_back(&mut self) {
        if self.is_searching || !self.search_query.is_empty() {
            self.clear_search();
        } else {
            self.close_collection();
        }
    }

    /// Ignored unless `collection` is still the open one.
    pub fn set_collection_songs(&mut self, collection: &Collection, songs: Vec<Track>) -> bool {
        match self.open.as_mut() {
            Some(open) if open.collection.same_as(collection) => {
                open.songs = songs;
                open.loading = false;
            }
            _ => return false,
        }
        self.clamp_selection();
        true
    }

    pub fn set_collections(&mut self, kind: CollectionKind, collections: Vec<Collection>) {
        match kind {
            CollectionKind::Playlist => self.playlists = collections,
            CollectionKind::Artist => self.artists = collections,
        }
        self.set_collections_loading(kind, false);
        self.clamp_selection();
    }

    /// Clears the loading flag of the request that failed and no other.
    pub fn fetch_failed(&mut self, source: FetchSource) {
        match source {
            FetchSource::Songs => self.songs_loading = false,
            FetchSource::Likes => self.liked_loading = false,
            FetchSource::Collections(kind) => self.set_collections_loading(kind, false),
            FetchSource::CollectionSongs => {
                if let Some(open) = self.open.as_mut() {
                    open.loading = false;
                }
            }
        }
    }

    pub fn push_search(&mut self, c: char) {
        self.search_query.push(c);
        self.selected = 0;
    }

    pub fn pop_search(&mut self) {
        self.search_query.pop();
        self.selected = 0;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.is_searching = false;
        self.selected = 0;
    }

    /// Keeps the selection inside the list after it was replaced.
    pub fn clamp_selection(&mut self) {
        let len = self.list_len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_TTL,
        });
    }

    pub fn active_toast(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| t.expires_at > now)
            .map(|t| t.message.as_str())
    }
}

/// Case-insensitive substring match on title or artist; an empty query keeps
/// everything.
pub fn filter_songs(songs: &[Track], query: &str) -> Vec<Track> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return songs.to_vec();
    }
    songs
        .iter()
        .filter(|s| {
            s.title.to_lowercase().contains(&query) || s.artist.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

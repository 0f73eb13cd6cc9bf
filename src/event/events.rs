use crate::model::{Collection, CollectionKind, Track};

/// Which request a [`Event::FetchError`] belongs to, so only its loading
/// flag is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Songs,
    Likes,
    Collections(CollectionKind),
    CollectionSongs,
}

/// Notifications for the UI. State itself is read from the player snapshot;
/// these only carry what a snapshot cannot (fetch results, transient errors).
#[derive(Debug, Clone)]
pub enum Event {
    TrackStarted(Track, usize),
    QueueEnded,
    PlaybackError(String),
    SongsFetched(Vec<Track>),
    LikedSongsFetched(Vec<Track>),
    CollectionsFetched(CollectionKind, Vec<Collection>),
    CollectionSongsFetched(Collection, Vec<Track>),
    FetchError(FetchSource, String),
}

use serde::Deserialize;

use crate::model::track::{deserialize_id, non_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Playlist,
    Artist,
}

/// A named group of songs the user can open and play from: one of their
/// playlists, or an artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub kind: CollectionKind,
    pub id: String,
    pub name: String,
    pub song_count: Option<u32>,
}

impl Collection {
    pub fn same_as(&self, other: &Collection) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

/// A playlist (`id`, `name`, `song_count`) or artist (`id`, `name`,
/// `photo`) as returned by the listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCollection {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub song_count: Option<String>,
}

impl RawCollection {
    /// Entries without an id cannot be opened and yield `None`.
    pub fn into_collection(self, kind: CollectionKind) -> Option<Collection> {
        let id = non_empty(self.id)?;
        Some(Collection {
            kind,
            name: non_empty(self.name).unwrap_or_else(|| format!("#{id}")),
            song_count: self.song_count.and_then(|c| c.trim().parse().ok()),
            id,
        })
    }
}

use serde::{Deserialize, Deserializer};

/// A playable song in the one shape the player understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub cover_url: String,
    pub audio_url: String,
}

impl Track {
    pub fn is_playable(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }

    /// Two entries refer to the same song when the audio URL matches, or
    /// failing that, the id.
    pub fn same_song(&self, other: &Track) -> bool {
        if !self.audio_url.is_empty() && self.audio_url == other.audio_url {
            return true;
        }
        !self.id.is_empty() && self.id == other.id
    }
}

/// A song as returned by any of the catalog endpoints.
///
/// The endpoints disagree on field names (`url` vs `song_url`, `cover` vs
/// `cover_url` vs `cover_photo`, `title` vs `name`), so every variant is
/// captured separately and coalesced in [`RawSong::into_track`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSong {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub artist_name: Option<String>,
    pub url: Option<String>,
    pub song_url: Option<String>,
    pub cover: Option<String>,
    pub cover_url: Option<String>,
    pub cover_photo: Option<String>,
}

impl RawSong {
    /// `position` is the song's place in the list it came from; the catalog
    /// endpoint omits ids and songs are then numbered from 1.
    pub fn into_track(self, position: usize) -> Track {
        Track {
            id: non_empty(self.id).unwrap_or_else(|| (position + 1).to_string()),
            title: first_of([self.title, self.name]),
            artist: first_of([self.artist, self.artist_name]),
            cover_url: first_of([self.cover, self.cover_url, self.cover_photo]),
            audio_url: first_of([self.url, self.song_url]),
        }
    }
}

pub fn normalize(songs: Vec<RawSong>) -> Vec<Track> {
    songs
        .into_iter()
        .enumerate()
        .map(|(position, song)| song.into_track(position))
        .collect()
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn first_of<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .find_map(non_empty)
        .unwrap_or_default()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

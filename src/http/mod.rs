use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    audio::traits::LikesApi,
    config::AppConfig,
    model::{Collection, CollectionKind, RawCollection, RawSong, Track, track::normalize},
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Status(String),
}

#[derive(Debug, Deserialize)]
struct SongsResponse {
    status: String,
    message: Option<String>,
    songs: Option<Vec<RawSong>>,
    data: Option<Vec<RawSong>>,
}

impl SongsResponse {
    fn into_tracks(self) -> Result<Vec<Track>, ApiError> {
        if self.status != "success" {
            return Err(ApiError::Status(
                self.message.unwrap_or(self.status),
            ));
        }
        Ok(normalize(self.songs.or(self.data).unwrap_or_default()))
    }
}

/// Playlists arrive under `data`, artists under `artists`.
#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    status: String,
    message: Option<String>,
    data: Option<Vec<RawCollection>>,
    artists: Option<Vec<RawCollection>>,
}

impl CollectionsResponse {
    fn into_collections(self, kind: CollectionKind) -> Result<Vec<Collection>, ApiError> {
        if self.status != "success" {
            return Err(ApiError::Status(
                self.message.unwrap_or(self.status),
            ));
        }
        Ok(self
            .data
            .or(self.artists)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| raw.into_collection(kind))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

/// Client for the Sunoji REST endpoints.
pub struct ApiService {
    client: reqwest::Client,
    base_url: String,
}

impl ApiService {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().gzip(true).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn http_client(&self) -> reqwest::Client {
        self.client.clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn fetch_songs(&self, limit: Option<usize>) -> Result<Vec<Track>, ApiError> {
        let mut url = self.endpoint("api/songs.php");
        if let Some(limit) = limit {
            url = format!("{url}?limit={limit}");
        }
        let response: SongsResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let tracks = response.into_tracks()?;
        info!(count = tracks.len(), "api_songs_fetched");
        Ok(tracks)
    }

    pub async fn fetch_collections(
        &self,
        kind: CollectionKind,
    ) -> Result<Vec<Collection>, ApiError> {
        let response: CollectionsResponse = self
            .client
            .get(self.endpoint(collections_path(kind)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let collections = response.into_collections(kind)?;
        info!(?kind, count = collections.len(), "api_collections_fetched");
        Ok(collections)
    }

    /// Songs of one playlist or artist, in the order the server lists them.
    pub async fn fetch_collection_songs(
        &self,
        collection: &Collection,
    ) -> Result<Vec<Track>, ApiError> {
        let response: SongsResponse = self
            .client
            .get(self.endpoint(&collection_songs_path(collection)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let tracks = response.into_tracks()?;
        info!(
            kind = ?collection.kind,
            id = collection.id.as_str(),
            count = tracks.len(),
            "api_collection_songs_fetched"
        );
        Ok(tracks)
    }

    async fn post_like(&self, path: &str, track_id: &str) -> Result<(), ApiError> {
        let response: StatusResponse = self
            .client
            .post(self.endpoint(path))
            .json(&like_body(track_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(path, id = track_id, status = response.status.as_str(), "api_like_posted");

        if response.status != "success" {
            return Err(ApiError::Status(
                response.message.unwrap_or(response.status),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LikesApi for ApiService {
    async fn fetch_liked_songs(&self) -> Result<Vec<Track>, ApiError> {
        let response: SongsResponse = self
            .client
            .get(self.endpoint("api/likes/get.php"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_tracks()
    }

    async fn add_like(&self, track_id: &str) -> Result<(), ApiError> {
        self.post_like("api/likes/add.php", track_id).await
    }

    async fn remove_like(&self, track_id: &str) -> Result<(), ApiError> {
        self.post_like("api/likes/remove.php", track_id).await
    }
}

fn collections_path(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Playlist => "api/playlists/get.php",
        CollectionKind::Artist => "artists.php",
    }
}

fn collection_songs_path(collection: &Collection) -> String {
    match collection.kind {
        CollectionKind::Playlist => format!("api/playlists/songs.php?playlist_id={}", collection.id),
        CollectionKind::Artist => format!("artists.php?artist_id={}", collection.id),
    }
}

/// Numeric ids go over the wire as numbers, anything else as a string.
fn like_body(track_id: &str) -> Value {
    match track_id.parse::<i64>() {
        Ok(id) => json!({ "song_id": id }),
        Err(_) => json!({ "song_id": track_id }),
    }
}

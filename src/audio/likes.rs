use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{audio::traits::LikesApi, http::ApiError, model::Track};

/// The ids the user has liked, mirrored from the backend.
///
/// Toggles are applied locally right away and synced in the background.
/// A failed sync is not rolled back, so the local set can drift from the
/// server until the next [`LikedSet::refresh`].
pub struct LikedSet {
    ids: ArcSwap<im::HashSet<String>>,
    api: Arc<dyn LikesApi>,
}

impl LikedSet {
    pub fn new(api: Arc<dyn LikesApi>) -> Self {
        Self {
            ids: ArcSwap::from_pointee(im::HashSet::new()),
            api,
        }
    }

    /// Replaces the local set with the server's and returns the liked songs.
    pub async fn refresh(&self) -> Result<Vec<Track>, ApiError> {
        let songs = self.api.fetch_liked_songs().await?;
        let ids: im::HashSet<String> = songs.iter().map(|t| t.id.clone()).collect();
        info!(count = ids.len(), "likes_refreshed");
        self.ids.store(Arc::new(ids));
        Ok(songs)
    }

    /// Flips membership of `track_id` and returns whether it is now liked.
    pub fn toggle(&self, track_id: &str) -> bool {
        let mut liked = false;
        self.ids.rcu(|ids| {
            let mut ids = (**ids).clone();
            liked = ids.remove(track_id).is_none();
            if liked {
                ids.insert(track_id.to_string());
            }
            ids
        });

        let api = self.api.clone();
        let id = track_id.to_string();
        tokio::spawn(async move {
            let result = if liked {
                api.add_like(&id).await
            } else {
                api.remove_like(&id).await
            };
            if let Err(e) = result {
                warn!(id = id.as_str(), liked, error = %e, "likes_sync_failed");
            }
        });

        liked
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.ids.load().contains(track_id)
    }

    pub fn ids(&self) -> Arc<im::HashSet<String>> {
        self.ids.load_full()
    }

    pub fn len(&self) -> usize {
        self.ids.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.load().is_empty()
    }
}

use crate::model::Track;

/// The candidate list a play request came with, plus the current position in
/// it. Replaced wholesale by every play request.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    current_track_index: Option<usize>,
}

impl Queue {
    pub fn position_of(tracks: &[Track], track: &Track) -> Option<usize> {
        tracks
            .iter()
            .position(|t| !track.audio_url.is_empty() && t.audio_url == track.audio_url)
            .or_else(|| tracks.iter().position(|t| t.same_song(track)))
    }

    /// Returns `false` and leaves the queue untouched when `index` is out of
    /// bounds for `tracks`.
    pub fn replace(&mut self, tracks: Vec<Track>, index: usize) -> bool {
        if index >= tracks.len() {
            return false;
        }
        self.tracks = tracks;
        self.current_track_index = Some(index);
        true
    }

    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current_track_index = Some(index);
        self.tracks.get(index)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_track_index = None;
    }

    pub fn current(&self) -> Option<&Track> {
        self.current_track_index.and_then(|i| self.tracks.get(i))
    }

    pub fn index(&self) -> Option<usize> {
        self.current_track_index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.current_track_index
            .is_some_and(|i| i + 1 == self.tracks.len())
    }

    pub fn next_index(&self) -> Option<usize> {
        let current = self.current_track_index?;
        if self.tracks.is_empty() {
            return None;
        }
        Some((current + 1) % self.tracks.len())
    }

    pub fn previous_index(&self) -> Option<usize> {
        let current = self.current_track_index?;
        if self.tracks.is_empty() {
            return None;
        }
        Some(current.checked_sub(1).unwrap_or(self.tracks.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            title: format!("Song {id}"),
            artist: "Artist".into(),
            cover_url: String::new(),
            audio_url: format!("https://cdn/{id}.mp3"),
        }
    }

    fn queue_at(index: usize) -> Queue {
        let mut queue = Queue::default();
        assert!(queue.replace(vec![track("a"), track("b"), track("c")], index));
        queue
    }

    #[test]
    fn test_next_wraps_to_start() {
        assert_eq!(queue_at(2).next_index(), Some(0));
        assert_eq!(queue_at(0).next_index(), Some(1));
    }

    #[test]
    fn test_previous_wraps_to_end() {
        assert_eq!(queue_at(0).previous_index(), Some(2));
        assert_eq!(queue_at(2).previous_index(), Some(1));
    }

    #[test]
    fn test_empty_queue_has_no_neighbours() {
        let queue = Queue::default();
        assert_eq!(queue.next_index(), None);
        assert_eq!(queue.previous_index(), None);
        assert!(!queue.is_last());
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_position_prefers_audio_url() {
        let tracks = vec![track("a"), track("b")];
        let mut lookup = track("zzz");
        lookup.audio_url = tracks[1].audio_url.clone();
        assert_eq!(Queue::position_of(&tracks, &lookup), Some(1));

        let mut by_id = track("a");
        by_id.audio_url = "https://mirror/a.mp3".into();
        assert_eq!(Queue::position_of(&tracks, &by_id), Some(0));

        assert_eq!(Queue::position_of(&tracks, &track("c")), None);
    }

    #[test]
    fn test_replace_rejects_out_of_bounds() {
        let mut queue = queue_at(1);
        assert!(!queue.replace(vec![track("x")], 3));
        assert_eq!(queue.index(), Some(1));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_single_track_queue_wraps_onto_itself() {
        let mut queue = Queue::default();
        queue.replace(vec![track("solo")], 0);
        assert!(queue.is_last());
        assert_eq!(queue.next_index(), Some(0));
        assert_eq!(queue.previous_index(), Some(0));
    }
}

//! Upcoming-track queue
//!
//! FIFO queue of [`TrackMetadata`]: the head is the next track to play.
//! Shuffling keeps a snapshot of the previous order so it can be undone.
//!
//! ```text
//! Currently Playing: Track A        (never in the queue)
//! ─────────────────────────────
//! Queue:
//!   - Track B   <- head, plays next
//!   - Track C
//!   - Track D
//! ```

use crate::history::History;
use crate::shuffle::shuffle_random;
use crate::types::TrackMetadata;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: VecDeque<TrackMetadata>,

    /// Order before the last shuffle (for undo)
    previous_order: Option<Vec<TrackMetadata>>,

    /// History mark taken when the queue was shuffled
    shuffled_at: u64,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track to the tail
    pub fn push_back(&mut self, track: TrackMetadata) {
        self.tracks.push_back(track);
    }

    /// Put a track at the head (plays next)
    pub fn push_front(&mut self, track: TrackMetadata) {
        self.tracks.push_front(track);
    }

    /// Remove and return the head
    pub fn pop_front(&mut self) -> Option<TrackMetadata> {
        self.tracks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Copy of the queue, head first
    pub fn snapshot(&self) -> Vec<TrackMetadata> {
        self.tracks.iter().cloned().collect()
    }

    /// Whether the queue is currently shuffled
    pub fn is_shuffled(&self) -> bool {
        self.previous_order.is_some()
    }

    /// Remove every track and forget any shuffle snapshot
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.previous_order = None;
    }

    /// Shuffle the queue in place
    ///
    /// The order before this call is kept for [`Queue::undo_shuffle`], along with
    /// where `history` stood. Shuffling an already shuffled queue replaces both.
    pub fn shuffle(&mut self, history: &History) {
        self.previous_order = Some(self.snapshot());
        self.shuffled_at = history.mark();
        shuffle_random(self.tracks.make_contiguous());
    }

    /// Restore the order from before the last shuffle
    ///
    /// Tracks whose URL `history` recorded after the shuffle are dropped. Tracks
    /// added after the shuffle are kept at the tail in their current order.
    ///
    /// Returns false when there was no shuffle to undo.
    pub fn undo_shuffle(&mut self, history: &History) -> bool {
        let Some(original) = self.previous_order.take() else {
            return false;
        };

        // Whatever is queued beyond the snapshot's copies was added later
        let mut pending = original.clone();
        let mut added = Vec::new();
        for track in &self.tracks {
            match pending.iter().position(|t| t == track) {
                Some(index) => {
                    pending.swap_remove(index);
                }
                None => added.push(track.clone()),
            }
        }

        let played: Vec<&str> = history.played_since(self.shuffled_at).collect();
        self.tracks = original
            .into_iter()
            .filter(|track| !played.contains(&track.url.as_str()))
            .chain(added)
            .collect();

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> TrackMetadata {
        TrackMetadata {
            title: Some(format!("Track {}", id)),
            author: Some("Test Artist".to_string()),
            duration: Some(180),
            thumbnail: None,
            source: crate::types::TrackSource::Youtube,
            url: format!("https://youtu.be/{}", id),
        }
    }

    fn urls(queue: &Queue) -> Vec<String> {
        queue.snapshot().into_iter().map(|t| t.url).collect()
    }

    #[test]
    fn fifo_order() {
        let mut queue = Queue::new();
        queue.push_back(create_test_track("1"));
        queue.push_back(create_test_track("2"));
        queue.push_front(create_test_track("0"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop_front().unwrap().url, "https://youtu.be/0");
        assert_eq!(queue.pop_front().unwrap().url, "https://youtu.be/1");
        assert_eq!(queue.pop_front().unwrap().url, "https://youtu.be/2");
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut queue = Queue::new();
        queue.push_back(create_test_track("1"));

        let mut snapshot = queue.snapshot();
        snapshot.clear();

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn shuffle_then_undo_restores_order() {
        let mut queue = Queue::new();
        for i in 0..10 {
            queue.push_back(create_test_track(&i.to_string()));
        }
        let original = urls(&queue);

        queue.shuffle(&History::default());
        assert!(queue.is_shuffled());
        assert_eq!(queue.len(), 10);

        assert!(queue.undo_shuffle(&History::default()));
        assert!(!queue.is_shuffled());
        assert_eq!(urls(&queue), original);
    }

    #[test]
    fn undo_without_shuffle_is_noop() {
        let mut queue = Queue::new();
        queue.push_back(create_test_track("1"));

        assert!(!queue.undo_shuffle(&History::default()));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn undo_drops_played_tracks() {
        let mut queue = Queue::new();
        for i in 0..4 {
            queue.push_back(create_test_track(&i.to_string()));
        }
        let mut history = History::default();
        queue.shuffle(&history);

        let played = queue.pop_front().unwrap();
        history.push(played.url.clone());

        queue.undo_shuffle(&history);

        assert_eq!(queue.len(), 3);
        assert!(!urls(&queue).contains(&played.url));
    }

    #[test]
    fn undo_keeps_tracks_added_after_shuffle() {
        let mut queue = Queue::new();
        queue.push_back(create_test_track("1"));
        queue.push_back(create_test_track("2"));
        queue.shuffle(&History::default());
        queue.push_back(create_test_track("3"));

        queue.undo_shuffle(&History::default());

        assert_eq!(
            urls(&queue),
            vec![
                "https://youtu.be/1".to_string(),
                "https://youtu.be/2".to_string(),
                "https://youtu.be/3".to_string(),
            ]
        );
    }

    #[test]
    fn undo_keeps_tracks_played_before_shuffle() {
        let mut history = History::default();
        history.push("https://youtu.be/1".to_string());

        let mut queue = Queue::new();
        for i in 1..=3 {
            queue.push_back(create_test_track(&i.to_string()));
        }
        queue.shuffle(&history);
        queue.undo_shuffle(&history);

        assert_eq!(
            urls(&queue),
            vec![
                "https://youtu.be/1".to_string(),
                "https://youtu.be/2".to_string(),
                "https://youtu.be/3".to_string(),
            ]
        );
    }

    #[test]
    fn clear_forgets_shuffle() {
        let mut queue = Queue::new();
        queue.push_back(create_test_track("1"));
        queue.shuffle(&History::default());

        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.is_shuffled());
    }
}

//! Play queue
//!
//! Cursor-based navigation over a context track list (the album, playlist or
//! search result playback was started from):
//!
//! ```text
//! Context:  [ A ][ B ][ C ][ D ]
//!                  ^
//!            current_index = 1
//! ─────────────────────────────
//! Explicit queue (user "add to queue"):
//!   - X
//!   - Y
//! ```
//!
//! The explicit queue is shown and persisted but never reorders context
//! navigation. The queue knows nothing about the audio engine.

use crate::history::History;
use orpheon_core::{Track, TrackId};

#[derive(Debug, Clone)]
pub struct PlayQueue {
    /// Tracks that define what comes next
    context: Vec<Track>,

    /// Cursor into `context`; `None` before anything has been selected
    current_index: Option<usize>,

    /// Tracks added explicitly by the user
    explicit: Vec<Track>,

    /// Tracks the cursor has moved away from
    history: History,
}

impl PlayQueue {
    pub fn new(history_size: usize) -> Self {
        Self {
            context: Vec::new(),
            current_index: None,
            explicit: Vec::new(),
            history: History::new(history_size),
        }
    }

    /// Replace the context; the cursor is left where it is
    pub fn set_context_tracks(&mut self, tracks: Vec<Track>) {
        self.context = tracks;
    }

    /// Move the cursor directly
    ///
    /// Not bounds-checked: an index past the end simply yields no current
    /// track and no next track.
    pub fn set_current_index(&mut self, index: Option<usize>) {
        self.current_index = index;
    }

    /// Advance the cursor and return the new current track
    ///
    /// Returns `None` at the end of the context (no wraparound). From the
    /// unselected state the first track is returned.
    pub fn next_track(&mut self) -> Option<Track> {
        let next = self.current_index.map_or(0, |i| i + 1);
        let track = self.context.get(next)?.clone();
        self.move_to(next);
        Some(track)
    }

    /// Step the cursor back and return the new current track
    ///
    /// Returns `None` at the start of the context or when nothing is selected.
    pub fn previous_track(&mut self) -> Option<Track> {
        let prev = self.current_index?.checked_sub(1)?;
        let track = self.context.get(prev)?.clone();
        self.move_to(prev);
        Some(track)
    }

    /// Reset explicit queue, history and cursor (context is kept)
    pub fn clear_queue(&mut self) {
        self.explicit.clear();
        self.history.clear();
        self.current_index = None;
    }

    /// Append tracks to the explicit queue
    pub fn add_to_queue(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.explicit.extend(tracks);
    }

    /// Explicit queue, in insertion order
    pub fn queue(&self) -> &[Track] {
        &self.explicit
    }

    pub fn context_tracks(&self) -> &[Track] {
        &self.context
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Track under the cursor, if the cursor is in range
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.context.get(i))
    }

    /// Position of a track in the context, matched by id
    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.context.iter().position(|t| &t.id == id)
    }

    /// Whether the context holds exactly these tracks, in this order
    pub fn has_context(&self, tracks: &[Track]) -> bool {
        self.context.len() == tracks.len()
            && self.context.iter().zip(tracks).all(|(a, b)| a.id == b.id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn move_to(&mut self, index: usize) {
        if let Some(left) = self.current_track().cloned() {
            self.history.push(left);
        }
        self.current_index = Some(index);
    }
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(TrackId::new(format!("t{i}")), format!("Track {i}"), 180))
            .collect()
    }

    fn ids(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn new_queue_is_unselected() {
        let queue = PlayQueue::default();
        assert_eq!(queue.current_index(), None);
        assert!(queue.current_track().is_none());
        assert!(queue.queue().is_empty());
    }

    #[test]
    fn set_context_keeps_cursor() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        queue.set_current_index(Some(2));
        queue.set_context_tracks(tracks(5));
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn next_walks_to_end_without_wrapping() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        queue.set_current_index(Some(0));

        assert_eq!(queue.next_track().unwrap().id.as_str(), "t1");
        assert_eq!(queue.next_track().unwrap().id.as_str(), "t2");
        assert!(queue.next_track().is_none());
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn next_from_unselected_starts_at_first() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(2));
        assert_eq!(queue.next_track().unwrap().id.as_str(), "t0");
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn next_on_empty_context() {
        let mut queue = PlayQueue::default();
        assert!(queue.next_track().is_none());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn previous_stops_at_start() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        queue.set_current_index(Some(1));

        assert_eq!(queue.previous_track().unwrap().id.as_str(), "t0");
        assert!(queue.previous_track().is_none());
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn previous_when_unselected() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        assert!(queue.previous_track().is_none());
    }

    #[test]
    fn out_of_range_index_is_accepted() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(2));
        queue.set_current_index(Some(7));

        assert!(queue.current_track().is_none());
        assert!(queue.next_track().is_none());
        assert_eq!(queue.current_index(), Some(7));
    }

    #[test]
    fn navigation_records_history() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        queue.set_current_index(Some(0));
        queue.next_track();
        queue.next_track();
        queue.previous_track();

        let left: Vec<_> = queue.history().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(left, vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn clear_queue_keeps_context() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(3));
        queue.set_current_index(Some(1));
        queue.add_to_queue(tracks(1));
        queue.next_track();

        queue.clear_queue();

        assert_eq!(queue.current_index(), None);
        assert!(queue.queue().is_empty());
        assert!(queue.history().is_empty());
        assert_eq!(queue.context_tracks().len(), 3);
    }

    #[test]
    fn explicit_queue_does_not_affect_navigation() {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(tracks(2));
        queue.set_current_index(Some(0));
        queue.add_to_queue(vec![Track::new(TrackId::new("x"), "X", 60)]);

        assert_eq!(ids(queue.queue()), vec!["x"]);
        assert_eq!(queue.next_track().unwrap().id.as_str(), "t1");
    }

    #[test]
    fn context_lookup_by_id() {
        let mut queue = PlayQueue::default();
        let context = tracks(4);
        queue.set_context_tracks(context.clone());

        assert_eq!(queue.index_of(&TrackId::new("t2")), Some(2));
        assert_eq!(queue.index_of(&TrackId::new("zz")), None);
        assert!(queue.has_context(&context));
        assert!(!queue.has_context(&context[..3]));
    }
}

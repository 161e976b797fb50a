//! Bounded navigation history
//!
//! Records tracks the play cursor has moved away from

use orpheon_core::Track;
use std::collections::VecDeque;

/// Ring buffer of recently left tracks (most recent at the back)
#[derive(Debug, Clone)]
pub struct History {
    tracks: VecDeque<Track>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size.min(256)),
            max_size,
        }
    }

    /// Record a track; the oldest entry is discarded when full
    pub fn push(&mut self, track: Track) {
        if self.max_size == 0 {
            return;
        }
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    pub fn last(&self) -> Option<&Track> {
        self.tracks.back()
    }

    /// All entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

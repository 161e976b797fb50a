//! Listening range aggregation
//!
//! Tracks which parts of the current track were actually heard. A range is
//! opened when playback starts, closed by a seek, and the whole batch is
//! flushed when the track ends or stops being current.
//!
//! ```text
//!   Idle ──start──▶ Tracking [s, *]
//!                     │  seek(before, dest): keep [s, before] if long enough,
//!                     │                      reopen at dest
//!                     └─ end / switch ─▶ flush batch ─▶ Idle
//! ```

use crate::types::{ListeningRange, ListeningReport};
use orpheon_core::TrackId;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ListeningRangeTracker {
    /// Ranges must be strictly longer than this to be kept
    threshold: f64,

    /// Start of the open range while tracking
    open: Option<f64>,

    /// Closed ranges waiting for the next flush, in listening order
    finalized: Vec<ListeningRange>,
}

impl ListeningRangeTracker {
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            threshold: threshold_secs,
            open: None,
            finalized: Vec::new(),
        }
    }

    /// Open a range at `progress` unless one is already open
    pub fn on_playback_started(&mut self, progress: f64) {
        if self.open.is_none() {
            self.open = Some(progress);
        }
    }

    /// Explicit seek from `before` to `destination`
    ///
    /// Ignored while idle.
    pub fn on_seek(&mut self, before: f64, destination: f64) {
        let Some(start) = self.open else {
            return;
        };
        self.close_range(start, before);
        self.open = Some(destination);
    }

    /// The track played to its end
    pub fn on_track_end(&mut self, track_id: &TrackId, duration: f64) -> Option<ListeningReport> {
        self.finish(track_id, duration)
    }

    /// The track stops being current (skip, new track, teardown)
    pub fn on_track_switch(&mut self, track_id: &TrackId, progress: f64) -> Option<ListeningReport> {
        self.finish(track_id, progress)
    }

    /// Drop everything without reporting
    pub fn reset(&mut self) {
        self.open = None;
        self.finalized.clear();
    }

    pub fn is_tracking(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_range_start(&self) -> Option<f64> {
        self.open
    }

    pub fn finalized(&self) -> &[ListeningRange] {
        &self.finalized
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn close_range(&mut self, start: f64, end: f64) {
        if end - start > self.threshold {
            self.finalized.push(ListeningRange::new(start, end));
        }
    }

    fn finish(&mut self, track_id: &TrackId, end: f64) -> Option<ListeningReport> {
        if let Some(start) = self.open.take() {
            self.close_range(start, end);
        }
        if self.finalized.is_empty() {
            return None;
        }

        let ranges = std::mem::take(&mut self.finalized);
        debug!(track_id = %track_id, ranges = ranges.len(), "Flushing listening ranges");
        Some(ListeningReport::new(track_id.clone(), &ranges))
    }
}

impl Default for ListeningRangeTracker {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_SIGNIFICANCE_THRESHOLD_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportedRange;

    fn id() -> TrackId {
        TrackId::new("track-1")
    }

    #[test]
    fn starts_idle() {
        let tracker = ListeningRangeTracker::default();
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.threshold(), 2.0);
    }

    #[test]
    fn playback_start_opens_once() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(3.0);
        tracker.on_playback_started(9.0);
        assert_eq!(tracker.open_range_start(), Some(3.0));
    }

    #[test]
    fn short_seek_finalizes_nothing() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(1.0, 20.0);

        assert!(tracker.finalized().is_empty());
        assert_eq!(tracker.open_range_start(), Some(20.0));
    }

    #[test]
    fn long_seek_finalizes_one_range() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(3.0, 20.0);

        assert_eq!(tracker.finalized(), &[ListeningRange::new(0.0, 3.0)]);
    }

    #[test]
    fn exactly_threshold_is_noise() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(2.0, 10.0);
        assert!(tracker.finalized().is_empty());
    }

    #[test]
    fn seek_while_idle_is_ignored() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_seek(10.0, 30.0);
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn track_end_flushes_append_only_ranges() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(5.0, 5.0);

        let report = tracker.on_track_end(&id(), 40.0).unwrap();
        assert_eq!(
            report.ranges,
            vec![
                ReportedRange { start: 0, end: 5 },
                ReportedRange { start: 5, end: 40 }
            ]
        );
        assert!(!tracker.is_tracking());
        assert!(tracker.finalized().is_empty());
    }

    #[test]
    fn switch_uses_progress_as_end() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(1.5);

        let report = tracker.on_track_switch(&id(), 17.9).unwrap();
        assert_eq!(report.track_id, id());
        assert_eq!(report.ranges, vec![ReportedRange { start: 1, end: 17 }]);
    }

    #[test]
    fn nothing_significant_sends_nothing() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        assert!(tracker.on_track_switch(&id(), 1.0).is_none());
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn short_tail_does_not_drop_earlier_ranges() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(10.0, 30.0);

        let report = tracker.on_track_switch(&id(), 30.5).unwrap();
        assert_eq!(report.ranges, vec![ReportedRange { start: 0, end: 10 }]);
    }

    #[test]
    fn custom_threshold() {
        let mut tracker = ListeningRangeTracker::new(0.0);
        tracker.on_playback_started(0.0);
        tracker.on_seek(0.5, 3.0);
        assert_eq!(tracker.finalized().len(), 1);
    }

    #[test]
    fn reset_discards_without_report() {
        let mut tracker = ListeningRangeTracker::default();
        tracker.on_playback_started(0.0);
        tracker.on_seek(10.0, 12.0);
        tracker.reset();

        assert!(tracker.on_track_switch(&id(), 30.0).is_none());
    }
}

//! Core types for playback management

use crate::error::{PlaybackError, Result};
use orpheon_core::{Track, TrackId};
use serde::{Deserialize, Serialize};

/// Minimum listened span (seconds) worth reporting
pub const DEFAULT_SIGNIFICANCE_THRESHOLD_SECS: f64 = 2.0;

/// Distance from the end (seconds) at which a track counts as finished
pub const DEFAULT_END_OF_TRACK_EPSILON_SECS: f64 = 0.1;

/// Storage key of the persisted player state
pub const DEFAULT_STORAGE_KEY: &str = "playerState";

/// Audio locator template; `{base}` and `{id}` are substituted
pub const DEFAULT_AUDIO_PATH_TEMPLATE: &str = "{base}/tracks/{id}/audio";

/// Authoritative playback state
///
/// Invariants maintained by [`crate::PlaybackStateStore`]:
/// - `current_track == None` implies `is_playing == false`
/// - `volume` is within `[0, 1]`
/// - `progress` and `duration` are finite and non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Track shown in the now-playing card
    pub current_track: Option<Track>,

    /// Whether audio is (or has been asked to be) audible
    pub is_playing: bool,

    /// Linear volume in `[0, 1]`
    pub volume: f64,

    /// Playhead in seconds, as last reported by the engine
    pub progress: f64,

    /// Duration in seconds, 0 until metadata has loaded
    pub duration: f64,

    /// Explicit "add to queue" tracks
    pub queue: Vec<Track>,
}

impl PlaybackState {
    /// Id of the current track, if any
    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.current_track.as_ref().map(|t| &t.id)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            volume: 1.0,
            progress: 0.0,
            duration: 0.0,
            queue: Vec::new(),
        }
    }
}

/// Partial update merged by [`crate::PlaybackStateStore::update_state`]
///
/// `None` fields are left untouched. `current_track` is doubly optional so a
/// track can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub current_track: Option<Option<Track>>,
    pub is_playing: Option<bool>,
    pub volume: Option<f64>,
    pub progress: Option<f64>,
    pub duration: Option<f64>,
    pub queue: Option<Vec<Track>>,
}

impl StateUpdate {
    #[must_use]
    pub fn track(mut self, track: Option<Track>) -> Self {
        self.current_track = Some(track);
        self
    }

    #[must_use]
    pub fn playing(mut self, is_playing: bool) -> Self {
        self.is_playing = Some(is_playing);
        self
    }

    #[must_use]
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn queue(mut self, queue: Vec<Track>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// True when only the playhead moves (the `timeupdate` hot path)
    pub fn is_progress_only(&self) -> bool {
        self.progress.is_some()
            && self.current_track.is_none()
            && self.is_playing.is_none()
            && self.volume.is_none()
            && self.duration.is_none()
            && self.queue.is_none()
    }

    /// Merge into `state`
    pub fn apply_to(self, state: &mut PlaybackState) {
        if let Some(track) = self.current_track {
            state.current_track = track;
        }
        if let Some(is_playing) = self.is_playing {
            state.is_playing = is_playing;
        }
        if let Some(volume) = self.volume {
            state.volume = volume;
        }
        if let Some(progress) = self.progress {
            state.progress = progress;
        }
        if let Some(duration) = self.duration {
            state.duration = duration;
        }
        if let Some(queue) = self.queue {
            state.queue = queue;
        }
    }
}

/// When the state store writes to durable storage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PersistPolicy {
    /// Write the whole state on every update
    #[default]
    EveryUpdate,

    /// Progress-only updates are written once the playhead has moved at least
    /// `seconds` from the last written value; other updates write immediately
    ProgressInterval { seconds: f64 },
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Backend API root, e.g. `https://music.example.com/api`
    pub api_base_url: String,

    /// Audio locator template (default: `{base}/tracks/{id}/audio`)
    pub audio_path_template: String,

    /// Key under which the player state is persisted
    pub storage_key: String,

    /// Minimum listened span worth reporting (default: 2.0 s)
    pub significance_threshold_secs: f64,

    /// End-of-track detection window (default: 0.1 s)
    pub end_of_track_epsilon_secs: f64,

    /// Maximum navigation history size (default: 50)
    pub history_size: usize,

    /// Durable write policy (default: every update)
    pub persist: PersistPolicy,

    /// Volume used when no state has been persisted yet (default: 1.0)
    pub initial_volume: f64,
}

impl PlaybackConfig {
    /// Reject values that would break the state machine
    pub fn validate(&self) -> Result<()> {
        if !self.audio_path_template.contains("{id}") {
            return Err(PlaybackError::Config(
                "audio_path_template must contain {id}".to_string(),
            ));
        }
        if !self.significance_threshold_secs.is_finite() || self.significance_threshold_secs < 0.0
        {
            return Err(PlaybackError::Config(format!(
                "significance_threshold_secs must be a non-negative number, got {}",
                self.significance_threshold_secs
            )));
        }
        if !self.end_of_track_epsilon_secs.is_finite() || self.end_of_track_epsilon_secs < 0.0 {
            return Err(PlaybackError::Config(format!(
                "end_of_track_epsilon_secs must be a non-negative number, got {}",
                self.end_of_track_epsilon_secs
            )));
        }
        if let PersistPolicy::ProgressInterval { seconds } = self.persist {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(PlaybackError::Config(format!(
                    "persist interval must be positive, got {}",
                    seconds
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be within [0, 1], got {}",
                self.initial_volume
            )));
        }
        if self.storage_key.is_empty() {
            return Err(PlaybackError::Config("storage_key cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            api_base_url: "/api".to_string(),
            audio_path_template: DEFAULT_AUDIO_PATH_TEMPLATE.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            significance_threshold_secs: DEFAULT_SIGNIFICANCE_THRESHOLD_SECS,
            end_of_track_epsilon_secs: DEFAULT_END_OF_TRACK_EPSILON_SECS,
            history_size: 50,
            persist: PersistPolicy::EveryUpdate,
            initial_volume: 1.0,
        }
    }
}

/// Contiguous span of listened playback time, in seconds
///
/// Full engine precision is kept until the range is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListeningRange {
    pub start: f64,
    pub end: f64,
}

impl ListeningRange {
    /// Create a range; `end` is raised to `start` if it lies before it
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length in seconds
    pub fn len_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Whole-second form sent to the backend
    pub fn floored(&self) -> ReportedRange {
        ReportedRange {
            start: self.start.max(0.0).floor() as u64,
            end: self.end.max(0.0).floor() as u64,
        }
    }
}

/// Range as the stats endpoint receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedRange {
    pub start: u64,
    pub end: u64,
}

/// One flush: every range listened for a track during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningReport {
    pub track_id: TrackId,
    pub ranges: Vec<ReportedRange>,
}

impl ListeningReport {
    /// Build a report, flooring every boundary to whole seconds
    pub fn new(track_id: TrackId, ranges: &[ListeningRange]) -> Self {
        Self {
            track_id,
            ranges: ranges.iter().map(ListeningRange::floored).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state() {
        let state = PlaybackState::default();
        assert!(state.current_track.is_none());
        assert!(!state.is_playing);
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.duration, 0.0);
        assert!(state.queue.is_empty());
    }

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.storage_key, "playerState");
        assert_eq!(config.significance_threshold_secs, 2.0);
        assert_eq!(config.end_of_track_epsilon_secs, 0.1);
        assert_eq!(config.history_size, 50);
        assert_eq!(config.persist, PersistPolicy::EveryUpdate);
        assert_eq!(config.initial_volume, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_template_without_id() {
        let config = PlaybackConfig {
            audio_path_template: "{base}/audio".to_string(),
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_persist_interval() {
        let config = PlaybackConfig {
            persist: PersistPolicy::ProgressInterval { seconds: 0.0 },
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_out_of_range_volume() {
        let config = PlaybackConfig {
            initial_volume: 1.5,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"api_base_url":"https://music.test/api"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://music.test/api");
        assert_eq!(config.storage_key, "playerState");
    }

    #[test]
    fn persist_policy_serde_shape() {
        let json = serde_json::to_string(&PersistPolicy::ProgressInterval { seconds: 5.0 }).unwrap();
        assert_eq!(json, r#"{"mode":"progress_interval","seconds":5.0}"#);

        let parsed: PersistPolicy = serde_json::from_str(r#"{"mode":"every_update"}"#).unwrap();
        assert_eq!(parsed, PersistPolicy::EveryUpdate);
    }

    #[test]
    fn partial_update_merges_only_set_fields() {
        let mut state = PlaybackState {
            volume: 0.4,
            progress: 12.0,
            ..PlaybackState::default()
        };

        StateUpdate::default().progress(15.5).apply_to(&mut state);
        assert_eq!(state.progress, 15.5);
        assert_eq!(state.volume, 0.4);
    }

    #[test]
    fn progress_only_detection() {
        assert!(StateUpdate::default().progress(1.0).is_progress_only());
        assert!(!StateUpdate::default().progress(1.0).playing(true).is_progress_only());
        assert!(!StateUpdate::default().is_progress_only());
    }

    #[test]
    fn clearing_track_with_some_none() {
        let mut state = PlaybackState {
            current_track: Some(Track::new(TrackId::new("t"), "T", 10)),
            ..PlaybackState::default()
        };
        StateUpdate::default().track(None).apply_to(&mut state);
        assert!(state.current_track.is_none());
    }

    #[test]
    fn range_floors_at_report_time() {
        let range = ListeningRange::new(2.9, 41.7);
        assert!((range.len_secs() - 38.8).abs() < 1e-9);
        assert_eq!(range.floored(), ReportedRange { start: 2, end: 41 });
    }

    #[test]
    fn range_end_never_before_start() {
        let range = ListeningRange::new(10.0, 4.0);
        assert_eq!(range.end, 10.0);
    }

    #[test]
    fn report_wire_format() {
        let report = ListeningReport::new(
            TrackId::new("abc"),
            &[ListeningRange::new(0.4, 5.2), ListeningRange::new(5.2, 40.0)],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "track_id": "abc",
                "ranges": [{"start": 0, "end": 5}, {"start": 5, "end": 40}]
            })
        );
    }
}

//! Playback events
//!
//! Recorded by the controller for the UI layer, which drains them after each
//! call (see [`crate::PlaybackController::drain_events`]).

use crate::types::ReportedRange;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Transport started or stopped
    #[serde(rename_all = "camelCase")]
    StateChanged { is_playing: bool },

    /// A different track became current
    #[serde(rename_all = "camelCase")]
    TrackChanged {
        track_id: String,
        previous_track_id: Option<String>,
    },

    /// Track played to its end
    #[serde(rename_all = "camelCase")]
    TrackFinished { track_id: String },

    /// Playhead or duration moved
    PositionUpdate { progress: f64, duration: f64 },

    /// Volume changed (linear, 0-1)
    VolumeChanged { volume: f64 },

    /// Explicit queue changed
    QueueChanged { length: usize },

    /// Listening ranges handed to the stats reporter
    #[serde(rename_all = "camelCase")]
    ListeningFlushed {
        track_id: String,
        ranges: Vec<ReportedRange>,
    },

    /// Recoverable failure (rejected play, etc.)
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_type_tag() {
        let event = PlaybackEvent::TrackChanged {
            track_id: "b".into(),
            previous_track_id: Some("a".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "trackChanged", "trackId": "b", "previousTrackId": "a"})
        );
    }
}

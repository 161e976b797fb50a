//! Platform audio engine abstraction
//!
//! Wraps the single platform media primitive (an `<audio>` element in the
//! browser, a simulated clock in tests and the CLI). Decoding is entirely the
//! platform's job; the engine only exposes transport and timing.

use crate::error::Result;

/// Counter returned by [`AudioEngine::set_source`]
///
/// Every event carries the generation of the source it was raised for, so
/// callbacks that arrive after a source change can be recognised as stale.
pub type SourceGeneration = u64;

/// Timing signal raised by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub generation: SourceGeneration,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(generation: SourceGeneration, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Playhead moved (platform cadence, no fixed period)
    TimeUpdate,

    /// Duration became known
    LoadedMetadata,

    /// Playback reached the end of the media; raised once per completed track
    Ended,

    /// A previously accepted `play()` request failed asynchronously
    PlayRejected { reason: String },
}

/// Platform-agnostic audio engine
///
/// Owned exclusively by [`crate::PlaybackController`]. Reads never fail;
/// `current_time` and `duration` return 0 when nothing is loaded.
pub trait AudioEngine {
    /// Begin playback of the current source
    ///
    /// Engines whose platform confirms asynchronously return `Ok(())` for an
    /// accepted request and raise [`EngineEventKind::PlayRejected`] later.
    fn play(&mut self) -> Result<()>;

    /// Pause playback (no-op when already paused)
    fn pause(&mut self);

    /// Set linear volume, clamped to `[0, 1]`
    fn set_volume(&mut self, volume: f64);

    /// Current linear volume
    fn volume(&self) -> f64;

    /// Seek, clamped to `[0, duration]`
    fn set_progress(&mut self, seconds: f64);

    /// Replace the media source and reset the playhead to 0
    fn set_source(&mut self, locator: &str) -> SourceGeneration;

    /// Detach and release the current source
    fn release_source(&mut self);

    /// Playhead in seconds
    fn current_time(&self) -> f64;

    /// Media duration in seconds (0 until metadata is loaded)
    fn duration(&self) -> f64;

    /// Whether transport is paused
    fn is_paused(&self) -> bool;

    /// Generation of the currently attached source
    fn generation(&self) -> SourceGeneration;

    /// Take all events raised since the last call, oldest first
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}

/// Clamp a requested volume into `[0, 1]`; NaN maps to silence
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Clamp a seek target into `[0, duration]`; NaN maps to 0
pub fn clamp_position(seconds: f64, duration: f64) -> f64 {
    if seconds.is_nan() {
        0.0
    } else {
        seconds.clamp(0.0, duration.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_clamped() {
        assert_eq!(clamp_volume(-0.5), 0.0);
        assert_eq!(clamp_volume(0.3), 0.3);
        assert_eq!(clamp_volume(4.0), 1.0);
        assert_eq!(clamp_volume(f64::NAN), 0.0);
    }

    #[test]
    fn position_clamped() {
        assert_eq!(clamp_position(-3.0, 30.0), 0.0);
        assert_eq!(clamp_position(12.5, 30.0), 12.5);
        assert_eq!(clamp_position(31.0, 30.0), 30.0);
        assert_eq!(clamp_position(f64::NAN, 30.0), 0.0);
        assert_eq!(clamp_position(f64::INFINITY, 30.0), 30.0);
    }
}

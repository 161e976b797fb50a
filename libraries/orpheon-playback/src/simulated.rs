//! Deterministic in-memory audio engine
//!
//! Stands in for the browser `<audio>` element in tests and the headless CLI.
//! Time only moves when the owner of a [`SimulationHandle`] calls
//! [`SimulationHandle::advance`], so every session is reproducible.

use crate::engine::{
    clamp_position, clamp_volume, AudioEngine, EngineEvent, EngineEventKind, SourceGeneration,
};
use crate::error::{PlaybackError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// How the simulated platform answers `play()`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlayBehavior {
    /// Start immediately
    #[default]
    Accept,

    /// Fail synchronously (e.g. autoplay blocked)
    Reject(String),

    /// Accept the request, then raise `PlayRejected` on the next drain
    RejectLater(String),
}

#[derive(Debug)]
struct SimState {
    media: HashMap<String, f64>,
    locator: Option<String>,
    generation: SourceGeneration,
    metadata_loaded: bool,
    duration: f64,
    position: f64,
    pending_seek: Option<f64>,
    volume: f64,
    paused: bool,
    ended: bool,
    play_behavior: PlayBehavior,
    events: Vec<EngineEvent>,
    calls: usize,
    released: usize,
}

impl SimState {
    fn new() -> Self {
        Self {
            media: HashMap::new(),
            locator: None,
            generation: 0,
            metadata_loaded: false,
            duration: 0.0,
            position: 0.0,
            pending_seek: None,
            volume: 1.0,
            paused: true,
            ended: false,
            play_behavior: PlayBehavior::Accept,
            events: Vec::new(),
            calls: 0,
            released: 0,
        }
    }

    fn emit(&mut self, kind: EngineEventKind) {
        self.events.push(EngineEvent::new(self.generation, kind));
    }

    fn load_metadata(&mut self) -> bool {
        if self.metadata_loaded {
            return true;
        }
        let Some(duration) = self.locator.as_ref().and_then(|l| self.media.get(l)).copied() else {
            return false;
        };

        self.duration = duration;
        self.metadata_loaded = true;
        self.emit(EngineEventKind::LoadedMetadata);

        if let Some(target) = self.pending_seek.take() {
            self.position = clamp_position(target, self.duration);
            self.emit(EngineEventKind::TimeUpdate);
        }
        true
    }

    fn advance(&mut self, seconds: f64) {
        if self.locator.is_none() || !self.load_metadata() {
            return;
        }
        if self.paused || self.ended {
            return;
        }

        self.position = (self.position + seconds.max(0.0)).min(self.duration);
        self.emit(EngineEventKind::TimeUpdate);

        if self.position >= self.duration {
            self.ended = true;
            self.paused = true;
            self.emit(EngineEventKind::Ended);
        }
    }
}

/// Simulated engine owned by the controller
#[derive(Debug)]
pub struct SimulatedEngine {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedEngine {
    /// Create an engine that knows no media yet
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new())),
        }
    }

    /// Declare the duration of the media behind `locator`
    #[must_use]
    pub fn with_media(self, locator: impl Into<String>, duration_secs: f64) -> Self {
        self.state
            .borrow_mut()
            .media
            .insert(locator.into(), duration_secs.max(0.0));
        self
    }

    /// Handle for driving the simulated clock from outside the controller
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for SimulatedEngine {
    fn play(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls += 1;

        if state.locator.is_none() {
            return Err(PlaybackError::NoSourceLoaded);
        }

        match state.play_behavior.clone() {
            PlayBehavior::Reject(reason) => Err(PlaybackError::PlayRejected(reason)),
            PlayBehavior::RejectLater(reason) => {
                state.emit(EngineEventKind::PlayRejected { reason });
                Ok(())
            }
            PlayBehavior::Accept => {
                if state.ended {
                    // Playing an ended element restarts it
                    state.ended = false;
                    state.position = 0.0;
                }
                state.paused = false;
                Ok(())
            }
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        state.paused = true;
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        state.volume = clamp_volume(volume);
    }

    fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    fn set_progress(&mut self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.calls += 1;

        if state.metadata_loaded {
            state.position = clamp_position(seconds, state.duration);
            state.ended = false;
            state.emit(EngineEventKind::TimeUpdate);
        } else if seconds.is_finite() {
            state.pending_seek = Some(seconds.max(0.0));
        }
    }

    fn set_source(&mut self, locator: &str) -> SourceGeneration {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        state.generation += 1;
        state.locator = Some(locator.to_string());
        state.metadata_loaded = false;
        state.duration = 0.0;
        state.position = 0.0;
        state.pending_seek = None;
        state.paused = true;
        state.ended = false;
        state.generation
    }

    fn release_source(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        if state.locator.take().is_some() {
            state.released += 1;
        }
        state.metadata_loaded = false;
        state.duration = 0.0;
        state.position = 0.0;
        state.pending_seek = None;
        state.paused = true;
        state.ended = false;
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().position
    }

    fn duration(&self) -> f64 {
        let state = self.state.borrow();
        if state.metadata_loaded {
            state.duration
        } else {
            0.0
        }
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn generation(&self) -> SourceGeneration {
        self.state.borrow().generation
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

/// Clock and inspection handle for a [`SimulatedEngine`]
///
/// Cannot issue transport commands; those belong to the controller.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    state: Rc<RefCell<SimState>>,
}

impl SimulationHandle {
    /// Declare the duration of the media behind `locator`
    pub fn register_media(&self, locator: impl Into<String>, duration_secs: f64) {
        self.state
            .borrow_mut()
            .media
            .insert(locator.into(), duration_secs.max(0.0));
    }

    /// Finish loading metadata for the current source
    ///
    /// Returns false when the source is unknown (metadata never arrives).
    pub fn load_metadata(&self) -> bool {
        self.state.borrow_mut().load_metadata()
    }

    /// Move the playhead forward by `seconds` of playback
    ///
    /// Loads metadata first if needed. Raises one `TimeUpdate` per call while
    /// playing (even for a zero step) and `Ended` when the end is reached.
    pub fn advance(&self, seconds: f64) {
        self.state.borrow_mut().advance(seconds);
    }

    /// Change how subsequent `play()` calls are answered
    pub fn set_play_behavior(&self, behavior: PlayBehavior) {
        self.state.borrow_mut().play_behavior = behavior;
    }

    /// Number of engine method calls that mutate transport or source
    pub fn call_count(&self) -> usize {
        self.state.borrow().calls
    }

    /// Number of sources released via `release_source`
    pub fn released_count(&self) -> usize {
        self.state.borrow().released
    }

    pub fn locator(&self) -> Option<String> {
        self.state.borrow().locator.clone()
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    pub fn is_ended(&self) -> bool {
        self.state.borrow().ended
    }

    pub fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    pub fn generation(&self) -> SourceGeneration {
        self.state.borrow().generation
    }
}

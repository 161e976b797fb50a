//! Playback controller
//!
//! Facade composing the audio engine, play queue, state store and listening
//! tracker. The UI calls the operations below; engine timing events are fed
//! back through [`PlaybackController::pump`].

use crate::engine::{clamp_position, AudioEngine, EngineEventKind, SourceGeneration};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::queue::PlayQueue;
use crate::reporter::StatsReporter;
use crate::source::SourceResolver;
use crate::storage::KeyValueStore;
use crate::store::PlaybackStateStore;
use crate::tracker::ListeningRangeTracker;
use crate::types::{ListeningReport, PlaybackConfig, PlaybackState, StateUpdate};
use orpheon_core::{Track, TrackId};
use tracing::{debug, info, warn};

/// Single owner of a playback session
///
/// Created once per session. Dropping it runs [`PlaybackController::teardown`].
pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    queue: PlayQueue,
    store: PlaybackStateStore,
    tracker: ListeningRangeTracker,
    reporter: Box<dyn StatsReporter>,
    resolver: SourceResolver,
    end_epsilon: f64,

    /// Generation of the source belonging to the current track
    generation: Option<SourceGeneration>,

    /// End of the current source has been handled (timeupdate or ended)
    track_end_handled: bool,

    pending_events: Vec<PlaybackEvent>,
    torn_down: bool,
}

impl<E: AudioEngine> PlaybackController<E> {
    /// Start a session, resuming whatever `storage` holds
    pub fn new(
        config: PlaybackConfig,
        engine: E,
        storage: Box<dyn KeyValueStore>,
        reporter: Box<dyn StatsReporter>,
    ) -> Result<Self> {
        config.validate()?;

        let mut controller = Self {
            engine,
            queue: PlayQueue::new(config.history_size),
            store: PlaybackStateStore::open(storage, &config),
            tracker: ListeningRangeTracker::new(config.significance_threshold_secs),
            reporter,
            resolver: SourceResolver::from_config(&config),
            end_epsilon: config.end_of_track_epsilon_secs,
            generation: None,
            track_end_handled: false,
            pending_events: Vec::new(),
            torn_down: false,
        };
        controller.restore_session();
        Ok(controller)
    }

    // ===== Playback Control =====

    /// Play `track` within `context`
    ///
    /// No-op when the track is not part of the context.
    pub fn start_playback(&mut self, track: &Track, context: &[Track]) {
        let Some(index) = context.iter().position(|t| t.id == track.id) else {
            debug!(track_id = %track.id, "Track not in context, ignoring");
            return;
        };

        self.finish_listening();

        if !self.queue.has_context(context) {
            self.queue.clear_queue();
            if !self.store.state().queue.is_empty() {
                self.store.update_state(StateUpdate::default().queue(Vec::new()));
                self.emit(PlaybackEvent::QueueChanged { length: 0 });
            }
            self.queue.set_context_tracks(context.to_vec());
        }
        self.queue.set_current_index(Some(index));

        let previous = self.store.state().current_track_id().cloned();
        self.load_track(context[index].clone(), previous);
    }

    /// Flip between playing and paused
    ///
    /// No-op without a current track.
    pub fn toggle_play(&mut self) {
        if self.store.state().current_track.is_none() {
            return;
        }

        if self.store.state().is_playing {
            self.engine.pause();
            self.store.update_state(StateUpdate::default().playing(false));
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        } else {
            self.begin_transport();
        }
    }

    /// Set linear volume; the engine's clamped value is what gets stored
    pub fn set_volume(&mut self, volume: f64) {
        self.engine.set_volume(volume);
        let actual = self.engine.volume();
        self.store.update_state(StateUpdate::default().volume(actual));
        self.emit(PlaybackEvent::VolumeChanged { volume: actual });
    }

    /// Seek within the current track
    ///
    /// The only seek entry point: closes the open listening range.
    pub fn set_progress(&mut self, seconds: f64) {
        if self.store.state().current_track.is_none() {
            return;
        }

        let before = self.store.state().progress;
        self.engine.set_progress(seconds);

        let actual = if self.engine.duration() > 0.0 {
            self.engine.current_time()
        } else {
            // Metadata still loading; the engine applies the seek later
            clamp_position(seconds, self.store.state().duration)
        };

        self.tracker.on_seek(before, actual);
        self.store.update_state(StateUpdate::default().progress(actual));

        let state = self.store.state();
        let (progress, duration) = (state.progress, state.duration);
        if self.track_end_handled && progress < duration - self.end_epsilon {
            self.track_end_handled = false;
        }
        self.emit(PlaybackEvent::PositionUpdate { progress, duration });
    }

    /// Skip to the next track of the context
    ///
    /// At the end of the context the current track keeps playing.
    pub fn play_next(&mut self) {
        self.finish_listening();
        match self.queue.next_track() {
            Some(next) => {
                let previous = self.store.state().current_track_id().cloned();
                self.load_track(next, previous);
            }
            None => {
                debug!("No next track");
                self.resume_tracking();
            }
        }
    }

    /// Go back to the previous track of the context
    pub fn play_previous(&mut self) {
        self.finish_listening();
        match self.queue.previous_track() {
            Some(prev) => {
                let previous = self.store.state().current_track_id().cloned();
                self.load_track(prev, previous);
            }
            None => {
                debug!("No previous track");
                self.resume_tracking();
            }
        }
    }

    /// Append tracks to the explicit queue
    pub fn add_to_queue(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }
        self.queue.add_to_queue(tracks);
        let queue = self.queue.queue().to_vec();
        let length = queue.len();
        self.store.update_state(StateUpdate::default().queue(queue));
        self.emit(PlaybackEvent::QueueChanged { length });
    }

    /// Apply every engine event raised since the last call
    ///
    /// Events tagged with a previous source generation are dropped.
    pub fn pump(&mut self) {
        for event in self.engine.drain_events() {
            if Some(event.generation) != self.generation {
                debug!(
                    generation = event.generation,
                    current = ?self.generation,
                    "Ignoring stale engine event"
                );
                continue;
            }

            match event.kind {
                EngineEventKind::TimeUpdate => self.on_time_update(),
                EngineEventKind::LoadedMetadata => self.on_loaded_metadata(),
                EngineEventKind::Ended => self.handle_track_end(),
                EngineEventKind::PlayRejected { reason } if self.engine.is_paused() => {
                    self.fail_playback(&PlaybackError::PlayRejected(reason));
                }
                EngineEventKind::PlayRejected { reason } => {
                    // A later play() already succeeded
                    debug!(reason = %reason, "Ignoring superseded play rejection");
                }
            }
        }
    }

    /// End the session: flush listening stats and state, release the source
    ///
    /// Idempotent. Persisted `is_playing` is left as-is so the next session
    /// resumes playback.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.finish_listening();
        self.engine.pause();
        self.engine.release_source();
        self.generation = None;

        if let Err(e) = self.store.flush() {
            warn!(error = %e, "Failed to flush player state on teardown");
        }
        debug!("Playback session torn down");
    }

    // ===== Accessors =====

    pub fn state(&self) -> &PlaybackState {
        self.store.state()
    }

    pub fn store(&self) -> &PlaybackStateStore {
        &self.store
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tracker(&self) -> &ListeningRangeTracker {
        &self.tracker
    }

    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    pub fn current_generation(&self) -> Option<SourceGeneration> {
        self.generation
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Take the UI events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    /// Re-attach the persisted track; resume only if it was playing
    fn restore_session(&mut self) {
        let state = self.store.state().clone();
        self.engine.set_volume(state.volume);

        if !state.queue.is_empty() {
            self.queue.add_to_queue(state.queue.iter().cloned());
        }

        let Some(track) = state.current_track else {
            return;
        };

        self.queue.set_context_tracks(vec![track.clone()]);
        self.queue.set_current_index(Some(0));

        let mut duration = state.duration;
        if duration <= 0.0 && track.duration > 0 {
            duration = f64::from(track.duration);
            self.store.update_state(StateUpdate::default().duration(duration));
        }
        let progress = self.store.state().progress;

        // Stopped at the very end: playing again starts over
        self.track_end_handled = duration > 0.0 && progress >= duration - self.end_epsilon;

        let locator = self.resolver.resolve(&track);
        info!(
            track_id = %track.id,
            progress,
            resume = state.is_playing,
            "Restoring playback session"
        );
        self.generation = Some(self.engine.set_source(&locator));
        if progress > 0.0 {
            self.engine.set_progress(progress);
        }
        self.emit(PlaybackEvent::TrackChanged {
            track_id: track.id.to_string(),
            previous_track_id: None,
        });

        if state.is_playing {
            self.begin_transport();
        }
    }

    fn load_track(&mut self, track: Track, previous: Option<TrackId>) {
        let locator = self.resolver.resolve(&track);
        info!(track_id = %track.id, locator = %locator, "Loading track");

        self.engine.release_source();
        self.generation = Some(self.engine.set_source(&locator));
        self.track_end_handled = false;
        self.torn_down = false;
        self.tracker.reset();

        // Catalog duration stands in until the engine reports metadata
        let track_id = track.id.to_string();
        let duration = f64::from(track.duration);
        self.store.update_state(
            StateUpdate::default()
                .track(Some(track))
                .playing(true)
                .progress(0.0)
                .duration(duration),
        );
        self.emit(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id: previous.map(|id| id.to_string()),
        });

        self.begin_transport();
    }

    /// Ask the engine to play and mirror the outcome into state
    fn begin_transport(&mut self) {
        // A handled end means the track is over; play it again from the top
        if std::mem::take(&mut self.track_end_handled) {
            self.engine.set_progress(0.0);
            self.store.update_state(StateUpdate::default().progress(0.0));
        }

        match self.engine.play() {
            Ok(()) => {
                self.store.update_state(StateUpdate::default().playing(true));
                self.tracker.on_playback_started(self.store.state().progress);
                self.emit(PlaybackEvent::StateChanged { is_playing: true });
            }
            Err(e) => self.fail_playback(&e),
        }
    }

    fn fail_playback(&mut self, error: &PlaybackError) {
        warn!(
            track_id = ?self.store.state().current_track_id(),
            error = %error,
            "Playback failed"
        );
        self.store.update_state(StateUpdate::default().playing(false));
        self.emit(PlaybackEvent::Error {
            message: error.to_string(),
        });
        self.emit(PlaybackEvent::StateChanged { is_playing: false });
    }

    fn on_time_update(&mut self) {
        let progress = self.engine.current_time();
        self.store.update_state(StateUpdate::default().progress(progress));

        let state = self.store.state();
        let (progress, duration, is_playing) = (state.progress, state.duration, state.is_playing);
        self.emit(PlaybackEvent::PositionUpdate { progress, duration });

        if is_playing && duration > 0.0 && progress >= duration - self.end_epsilon {
            self.handle_track_end();
        }
    }

    fn on_loaded_metadata(&mut self) {
        let duration = self.engine.duration();
        self.store.update_state(StateUpdate::default().duration(duration));
        let progress = self.store.state().progress;
        self.emit(PlaybackEvent::PositionUpdate { progress, duration });
    }

    /// Track reached its end: report, then advance or stop
    ///
    /// Runs at most once per source, whichever of the near-end timeupdate or
    /// `ended` comes first.
    fn handle_track_end(&mut self) {
        if self.track_end_handled {
            return;
        }
        let Some(track_id) = self.store.state().current_track_id().cloned() else {
            return;
        };
        self.track_end_handled = true;

        let duration = match self.store.state().duration {
            d if d > 0.0 => d,
            _ => self.engine.duration(),
        };
        info!(track_id = %track_id, "Track finished");
        self.emit(PlaybackEvent::TrackFinished {
            track_id: track_id.to_string(),
        });

        if let Some(report) = self.tracker.on_track_end(&track_id, duration) {
            self.deliver(report);
        }

        match self.queue.next_track() {
            Some(next) => self.load_track(next, Some(track_id)),
            None => {
                debug!("End of context, stopping");
                self.engine.pause();
                self.store.update_state(StateUpdate::default().playing(false));
                self.emit(PlaybackEvent::StateChanged { is_playing: false });
            }
        }
    }

    /// Flush the current track's listening ranges
    fn finish_listening(&mut self) {
        let Some(track_id) = self.store.state().current_track_id().cloned() else {
            self.tracker.reset();
            return;
        };
        let progress = self.store.state().progress;
        if let Some(report) = self.tracker.on_track_switch(&track_id, progress) {
            self.deliver(report);
        }
    }

    /// Keep tracking when a skip found nothing to switch to
    fn resume_tracking(&mut self) {
        let state = self.store.state();
        if state.is_playing {
            let progress = state.progress;
            self.tracker.on_playback_started(progress);
        }
    }

    fn deliver(&mut self, report: ListeningReport) {
        self.emit(PlaybackEvent::ListeningFlushed {
            track_id: report.track_id.to_string(),
            ranges: report.ranges.clone(),
        });
        let track_id = report.track_id.clone();
        if let Err(e) = self.reporter.report(report) {
            warn!(track_id = %track_id, error = %e, "Dropping listening stats");
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}

impl<E: AudioEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<E: AudioEngine + std::fmt::Debug> std::fmt::Debug for PlaybackController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("engine", &self.engine)
            .field("queue", &self.queue)
            .field("store", &self.store)
            .field("tracker", &self.tracker)
            .field("generation", &self.generation)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

//! Playback state store
//!
//! Owns the single live [`PlaybackState`] and mirrors it into durable storage
//! so a reload resumes where the listener left off.

use crate::engine::clamp_volume;
use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::types::{PersistPolicy, PlaybackConfig, PlaybackState, StateUpdate};
use orpheon_core::{ArtistRef, Track, TrackId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Track as it is written to storage
///
/// Only what the now-playing card needs survives; album, license, locator and
/// catalog counters are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTrack {
    pub id: TrackId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl From<&Track> for PersistedTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            name: track.name.clone(),
            duration: track.duration,
            artists: track.artists.clone(),
            cover_url: track.cover_url.clone(),
        }
    }
}

impl From<PersistedTrack> for Track {
    fn from(persisted: PersistedTrack) -> Self {
        let mut track = Track::new(persisted.id, persisted.name, persisted.duration);
        track.artists = persisted.artists;
        track.cover_url = persisted.cover_url;
        track
    }
}

/// Stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub current_track: Option<PersistedTrack>,
    pub is_playing: bool,
    pub volume: f64,
    pub progress: f64,
    pub duration: f64,
    pub queue: Vec<PersistedTrack>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::from(&PlaybackState::default())
    }
}

impl From<&PlaybackState> for PersistedState {
    fn from(state: &PlaybackState) -> Self {
        Self {
            current_track: state.current_track.as_ref().map(PersistedTrack::from),
            is_playing: state.is_playing,
            volume: state.volume,
            progress: state.progress,
            duration: state.duration,
            queue: state.queue.iter().map(PersistedTrack::from).collect(),
        }
    }
}

impl From<PersistedState> for PlaybackState {
    fn from(persisted: PersistedState) -> Self {
        Self {
            current_track: persisted.current_track.map(Track::from),
            is_playing: persisted.is_playing,
            volume: persisted.volume,
            progress: persisted.progress,
            duration: persisted.duration,
            queue: persisted.queue.into_iter().map(Track::from).collect(),
        }
    }
}

/// Single owner of the live playback state
pub struct PlaybackStateStore {
    state: PlaybackState,
    storage: Box<dyn KeyValueStore>,
    key: String,
    policy: PersistPolicy,
    initial_volume: f64,

    /// Progress value contained in the last successful write
    persisted_progress: f64,

    /// In-memory state is ahead of storage
    dirty: bool,

    /// Last write failed; running from memory
    degraded: bool,
}

impl PlaybackStateStore {
    /// Rehydrate from `storage`, falling back to defaults
    ///
    /// Missing, unreadable or corrupt data is treated as absent.
    pub fn open(storage: Box<dyn KeyValueStore>, config: &PlaybackConfig) -> Self {
        let key = config.storage_key.clone();
        let defaults = PlaybackState {
            volume: clamp_volume(config.initial_volume),
            ..PlaybackState::default()
        };

        let state = match storage.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedState>(&raw) {
                Ok(persisted) => {
                    debug!(key = %key, "Restored persisted player state");
                    sanitize(persisted.into())
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding corrupt persisted player state");
                    defaults
                }
            },
            Ok(None) => defaults,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read persisted player state");
                defaults
            }
        };

        Self {
            persisted_progress: state.progress,
            state,
            storage,
            key,
            policy: config.persist,
            initial_volume: config.initial_volume,
            dirty: false,
            degraded: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Merge a partial update and persist according to the policy
    pub fn update_state(&mut self, update: StateUpdate) {
        let progress_only = update.is_progress_only();
        update.apply_to(&mut self.state);
        enforce_invariants(&mut self.state);
        self.dirty = true;

        let due = match self.policy {
            PersistPolicy::EveryUpdate => true,
            PersistPolicy::ProgressInterval { seconds } => {
                !progress_only || (self.state.progress - self.persisted_progress).abs() >= seconds
            }
        };
        if due {
            // Failures are logged and leave the store in memory-only mode
            let _ = self.write();
        }
    }

    /// Write any change the policy has held back
    pub fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.write()?;
        }
        Ok(())
    }

    /// Forget the session: reset to defaults and delete the stored document
    pub fn clear(&mut self) -> Result<()> {
        self.state = PlaybackState {
            volume: clamp_volume(self.initial_volume),
            ..PlaybackState::default()
        };
        self.persisted_progress = 0.0;
        self.dirty = false;
        self.storage.remove(&self.key)
    }

    /// True while storage writes are failing
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// True when the in-memory state has not been written yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    fn write(&mut self) -> Result<()> {
        let result: Result<()> = serde_json::to_string(&PersistedState::from(&self.state))
            .map_err(Into::into)
            .and_then(|json| self.storage.set(&self.key, &json));

        match result {
            Ok(()) => {
                self.persisted_progress = self.state.progress;
                self.dirty = false;
                if self.degraded {
                    info!(key = %self.key, "Player state persistence recovered");
                    self.degraded = false;
                }
                Ok(())
            }
            Err(e) => {
                if !self.degraded {
                    warn!(
                        key = %self.key,
                        error = %e,
                        "Failed to persist player state, continuing in memory"
                    );
                }
                self.degraded = true;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for PlaybackStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackStateStore")
            .field("state", &self.state)
            .field("key", &self.key)
            .field("policy", &self.policy)
            .field("dirty", &self.dirty)
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn enforce_invariants(state: &mut PlaybackState) {
    state.volume = clamp_volume(state.volume);
    state.progress = non_negative(state.progress);
    state.duration = non_negative(state.duration);
    if state.duration > 0.0 && state.progress > state.duration {
        state.progress = state.duration;
    }
    if state.current_track.is_none() {
        state.is_playing = false;
    }
}

/// Repair whatever a previous session (or a hand-edited file) left behind
fn sanitize(mut state: PlaybackState) -> PlaybackState {
    if state.volume.is_nan() {
        state.volume = 1.0;
    }
    enforce_invariants(&mut state);
    state
}

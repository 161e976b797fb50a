//! Orpheon - Playback Core
//!
//! Client-side playback engine for the Orpheon web client.
//!
//! This crate provides:
//! - An audio engine abstraction over the platform media element
//! - A play queue with cursor navigation, explicit queue and history
//! - Persisted playback state that survives reloads
//! - Listening-range aggregation flushed to a stats reporter on every exit
//!   path (track end, skip, seek, teardown)
//! - [`PlaybackController`], the facade the UI talks to
//!
//! # Architecture
//!
//! Decoding is the platform's job. The controller owns one [`AudioEngine`];
//! the browser uses [`wasm::HtmlAudioEngine`] (feature `wasm`), tests and the
//! CLI use [`SimulatedEngine`], whose clock only moves when told to.
//!
//! Engine callbacks are queued and applied by [`PlaybackController::pump`],
//! which drops anything raised for a source that is no longer current.
//!
//! # Example
//!
//! ```rust
//! use orpheon_core::{Track, TrackId};
//! use orpheon_playback::{
//!     MemoryReporter, MemoryStore, PlaybackConfig, PlaybackController, SimulatedEngine,
//! };
//!
//! let engine = SimulatedEngine::new().with_media("/api/tracks/t1/audio", 180.0);
//! let clock = engine.handle();
//! let reporter = MemoryReporter::new();
//!
//! let mut player = PlaybackController::new(
//!     PlaybackConfig::default(),
//!     engine,
//!     Box::new(MemoryStore::new()),
//!     Box::new(reporter.clone()),
//! )
//! .unwrap();
//!
//! let album = vec![Track::new(TrackId::new("t1"), "Overture", 180)];
//! player.start_playback(&album[0], &album);
//!
//! clock.advance(30.0);
//! player.pump();
//! assert_eq!(player.state().progress, 30.0);
//!
//! player.teardown();
//! assert_eq!(reporter.reports()[0].ranges[0].end, 30);
//! ```

#![forbid(unsafe_code)]

mod controller;
mod engine;
mod error;
mod events;
mod history;
mod queue;
mod reporter;
mod simulated;
mod source;
mod storage;
mod store;
mod tracker;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use controller::PlaybackController;
pub use engine::{
    clamp_position, clamp_volume, AudioEngine, EngineEvent, EngineEventKind, SourceGeneration,
};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use history::History;
pub use queue::PlayQueue;
pub use reporter::{LogReporter, MemoryReporter, StatsReporter};
pub use simulated::{PlayBehavior, SimulatedEngine, SimulationHandle};
pub use source::SourceResolver;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{PersistedState, PersistedTrack, PlaybackStateStore};
pub use tracker::ListeningRangeTracker;
pub use types::{
    ListeningRange, ListeningReport, PersistPolicy, PlaybackConfig, PlaybackState,
    ReportedRange, StateUpdate,
};

#[cfg(feature = "http")]
pub use reporter::HttpStatsReporter;

//! Orpheon Player
//!
//! Headless driver for the Orpheon playback core. Plays a catalog through the
//! simulated engine, persists state to disk like the web client persists it
//! to `localStorage`, and delivers listening stats to the backend.
//!
//! This library exposes the binary's pieces for testing.

pub mod catalog;
pub mod config;
pub mod error;
pub mod script;
pub mod session;

pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use script::{parse_script, Action};
pub use session::{Session, SessionReporter, SessionSummary};

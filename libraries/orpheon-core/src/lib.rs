//! Orpheon Core
//!
//! Catalog domain types shared by every Orpheon client crate.
//!
//! The catalog itself (albums, artists, playlists) lives on the backend; clients
//! receive tracks as JSON and hand them to the playback core, which only clones
//! what it needs for the "now playing" card.
//!
//! # Example
//!
//! ```rust
//! use orpheon_core::types::{ArtistRef, Track, TrackId};
//!
//! let track = Track::new(TrackId::new("7f1c"), "Overture", 212)
//!     .with_artist(ArtistRef::new("a1", "The Quartet"));
//!
//! assert_eq!(track.duration, 212);
//! assert_eq!(track.artist_names(), "The Quartet");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use types::{AlbumRef, ArtistRef, LicenseRef, Track, TrackId};

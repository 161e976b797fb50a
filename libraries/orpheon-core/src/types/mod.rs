//! Catalog domain types

mod ids;
mod track;

pub use ids::TrackId;
pub use track::{parse_track_list, AlbumRef, ArtistRef, LicenseRef, Track};

/// Track domain type
use crate::error::Result;
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Artist credited on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    /// Artist identifier
    pub id: String,

    /// Display name
    pub name: String,
}

impl ArtistRef {
    /// Create a new artist reference
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Album a track belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    /// Album identifier
    pub id: String,

    /// Album title
    pub title: String,

    /// Record label
    #[serde(default)]
    pub label: Option<String>,

    /// Release date as sent by the backend (ISO 8601)
    #[serde(default)]
    pub release_date: Option<String>,
}

/// License a track is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRef {
    /// License identifier
    pub id: String,

    /// Short title ("CC BY-SA 4.0")
    pub title: String,

    /// Link to the license text
    #[serde(default)]
    pub url: Option<String>,
}

/// Catalog track
///
/// Immutable once loaded. Owned by whichever list produced it (album, search
/// results, playlist); the playback core clones what it keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Display name
    pub name: String,

    /// Total duration in whole seconds
    pub duration: u32,

    /// Credited artists, in display order
    #[serde(default)]
    pub artists: Vec<ArtistRef>,

    /// Album reference
    #[serde(default)]
    pub album: Option<AlbumRef>,

    /// License reference
    #[serde(default)]
    pub license: Option<LicenseRef>,

    /// Explicit audio locator; derived from the id when absent
    #[serde(default, rename = "audioUrl", skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Position on the album
    #[serde(default)]
    pub track_number: Option<u32>,

    /// Cover image for the now-playing card
    #[serde(default, rename = "coverUrl", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    /// Lifetime stream counter shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_streams: Option<u64>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: TrackId, name: impl Into<String>, duration: u32) -> Self {
        Self {
            id,
            name: name.into(),
            duration,
            artists: Vec::new(),
            album: None,
            license: None,
            audio_url: None,
            track_number: None,
            cover_url: None,
            total_streams: None,
        }
    }

    /// Add a credited artist
    #[must_use]
    pub fn with_artist(mut self, artist: ArtistRef) -> Self {
        self.artists.push(artist);
        self
    }

    /// Attach an album reference
    #[must_use]
    pub fn with_album(mut self, album: AlbumRef) -> Self {
        self.album = Some(album);
        self
    }

    /// Use an explicit audio locator instead of the derived one
    #[must_use]
    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Artist names joined for display ("A, B")
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a JSON array of tracks as returned by album/search endpoints
pub fn parse_track_list(json: &str) -> Result<Vec<Track>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_names_joined_in_order() {
        let track = Track::new(TrackId::new("t1"), "Song", 100)
            .with_artist(ArtistRef::new("a1", "First"))
            .with_artist(ArtistRef::new("a2", "Second"));

        assert_eq!(track.artist_names(), "First, Second");
    }

    #[test]
    fn parses_backend_payload() {
        let json = r#"[{
            "id": "9b2e",
            "name": "Prelude",
            "duration": 184,
            "track_number": 1,
            "artists": [{"id": "a1", "name": "Quartet"}],
            "album": {"id": "al1", "title": "Suites", "label": "Indie", "release_date": "2021-03-01"},
            "license": {"id": "l1", "title": "CC BY 4.0"},
            "total_streams": 42
        }]"#;

        let tracks = parse_track_list(json).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, TrackId::new("9b2e"));
        assert_eq!(tracks[0].album.as_ref().unwrap().title, "Suites");
        assert_eq!(tracks[0].license.as_ref().unwrap().url, None);
        assert_eq!(tracks[0].total_streams, Some(42));
        assert!(tracks[0].audio_url.is_none());
    }

    #[test]
    fn minimal_payload_uses_defaults() {
        let tracks = parse_track_list(r#"[{"id": "x", "name": "X", "duration": 3}]"#).unwrap();
        assert!(tracks[0].artists.is_empty());
        assert!(tracks[0].album.is_none());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_track_list("{not json").is_err());
    }
}

/// Track catalogs read from disk
///
/// A catalog file holds the JSON array the backend returns for an album or
/// search listing; it becomes the playback context.
use crate::error::{PlayerError, Result};
use orpheon_core::types::parse_track_list;
use orpheon_core::{Track, TrackId};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub fn load_catalog(path: &Path) -> Result<Vec<Track>> {
    let json = fs::read_to_string(path)?;
    let tracks = parse_track_list(&json)?;

    if tracks.is_empty() {
        return Err(PlayerError::catalog(format!(
            "{} contains no tracks",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = tracks.iter().find(|t| !seen.insert(&t.id)) {
        return Err(PlayerError::catalog(format!("duplicate track id {}", dup.id)));
    }

    tracing::debug!(path = %path.display(), tracks = tracks.len(), "Loaded catalog");
    Ok(tracks)
}

pub fn find_track<'a>(catalog: &'a [Track], id: &TrackId) -> Result<&'a Track> {
    catalog
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| PlayerError::catalog(format!("track {id} is not in the catalog")))
}

//! Audio locator resolution

use crate::types::{PlaybackConfig, DEFAULT_AUDIO_PATH_TEMPLATE};
use orpheon_core::Track;

/// Derives the audio locator of a track without touching the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResolver {
    base: String,
    template: String,
}

impl SourceResolver {
    /// `template` may contain `{base}` and must contain `{id}`
    pub fn new(base: impl Into<String>, template: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            template: template.into(),
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.audio_path_template.clone())
    }

    /// The track's own locator if it has one, otherwise the templated path
    pub fn resolve(&self, track: &Track) -> String {
        match track.audio_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self
                .template
                .replace("{base}", &self.base)
                .replace("{id}", track.id.as_str()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new("/api", DEFAULT_AUDIO_PATH_TEMPLATE)
    }
}

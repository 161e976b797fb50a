/// Player configuration
use crate::error::{PlayerError, Result};
use orpheon_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read when present in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "orpheon.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Backend API root receiving listening stats
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with stats
    #[serde(default)]
    pub token: Option<String>,

    /// Post listening stats to the backend (otherwise they are only logged)
    #[serde(default)]
    pub report_stats: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding the persisted player state
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `orpheon.toml` is used if
    /// present. `ORPHEON_`-prefixed variables override both, with `__`
    /// between nesting levels (`ORPHEON_SERVER__BASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ORPHEON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlayerError::config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| PlayerError::config(e.to_string()))?;

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(PlayerError::config("storage.data_dir cannot be empty"));
        }

        if self.server.report_stats
            && !self.server.base_url.starts_with("http://")
            && !self.server.base_url.starts_with("https://")
        {
            return Err(PlayerError::config(format!(
                "server.base_url must be an http(s) URL to report stats, got {:?}",
                self.server.base_url
            )));
        }

        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            playback: PlaybackConfig::default(),
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        base_url: default_base_url(),
        token: None,
        report_stats: false,
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        data_dir: default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/player")
}

#[cfg(test)]
mod tests {
    use super::*;
    use orpheon_playback::PersistPolicy;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.server.report_stats);
        assert_eq!(config.playback.storage_key, "playerState");
    }

    #[test]
    fn loads_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("player.toml");
        fs::write(
            &path,
            r#"
[server]
base_url = "https://music.example.com/api"
report_stats = true

[playback]
significance_threshold_secs = 5.0
persist = { mode = "progress_interval", seconds = 10.0 }
"#,
        )
        .unwrap();

        let config = PlayerConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.server.base_url, "https://music.example.com/api");
        assert!(config.server.report_stats);
        assert_eq!(config.playback.significance_threshold_secs, 5.0);
        assert_eq!(
            config.playback.persist,
            PersistPolicy::ProgressInterval { seconds: 10.0 }
        );
        assert_eq!(config.playback.history_size, 50);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data/player"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = PlayerConfig::load(Some(dir.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(PlayerError::Config(_))));
    }

    #[test]
    fn reporting_requires_absolute_url() {
        let mut config = PlayerConfig::default();
        config.server.report_stats = true;
        config.server.base_url = "/api".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_playback_section_rejected() {
        let mut config = PlayerConfig::default();
        config.playback.initial_volume = 2.0;
        assert!(matches!(config.validate(), Err(PlayerError::Config(_))));
    }
}

//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parent directory for per-job scratch workspaces.
    pub jobs_dir: PathBuf,

    /// Directory where finished renders are written.
    pub output_dir: PathBuf,

    /// Encoder settings.
    pub render: RenderDefaults,

    /// Asset fetching and object storage.
    pub assets: AssetConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Encoder binary.
    pub ffmpeg_path: String,

    /// Probe binary.
    pub ffprobe_path: String,

    /// Video codec passed to `-c:v`.
    pub video_codec: String,

    /// Encoder speed preset.
    pub preset: String,

    /// Constant rate factor (lower = better quality).
    pub crf: u32,

    /// Maximum video bitrate in kbps (0 = unconstrained CRF).
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Film grain strength for the `noise` filter (0 disables grain).
    pub grain_intensity: u32,

    /// Upper bound on a single encode, in seconds.
    pub encode_timeout_secs: u64,
}

/// Asset resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Upper bound on a single download, in seconds.
    pub download_timeout_secs: u64,

    /// Redirect hops followed for HTTP sources.
    pub max_redirects: usize,

    /// Source prefixes that denote object-storage keys (e.g. `/objects/`).
    pub object_prefixes: Vec<String>,

    /// Durable object storage backend.
    pub object_store: ObjectStoreConfig,
}

/// Object storage backend selection.
///
/// `root` selects a directory-backed store, `base_url` an HTTP store.
/// With neither set, uploads are skipped and renders stay local-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub root: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub base_url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            jobs_dir: std::env::temp_dir().join("reelsmith-jobs"),
            output_dir: data.join("renders"),
            render: RenderDefaults::default(),
            assets: AssetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 20,
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
            grain_intensity: 6,
            encode_timeout_secs: 3600,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 120,
            max_redirects: 10,
            object_prefixes: vec!["/objects/".to_string()],
            object_store: ObjectStoreConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ReelError::config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsmith").join("config.json")
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reelsmith")
}

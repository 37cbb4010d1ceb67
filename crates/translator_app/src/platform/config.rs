use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use translator_core::DEFAULT_LANGUAGE;
use translator_engine::{AtomicFileWriter, BackendSettings, EngineSettings, PushSettings};

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "translator.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to write config: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend origin for the HTTP API.
    pub server_url: String,
    /// Push channel origin; the server origin when unset.
    pub push_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub transfer_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    /// Interval of the status fallback poll while a translation runs.
    pub status_poll_secs: u64,
    pub output_dir: PathBuf,
    pub log_destination: LogDestination,
    pub language: String,
    pub use_terminology: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        let push = PushSettings::default();
        Self {
            server_url: backend.base_url,
            push_url: None,
            connect_timeout_secs: backend.connect_timeout.as_secs(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            transfer_timeout_secs: backend.transfer_timeout.as_secs(),
            poll_timeout_secs: push.poll_timeout.as_secs(),
            status_poll_secs: 30,
            output_dir: PathBuf::from("output"),
            log_destination: LogDestination::File,
            language: DEFAULT_LANGUAGE.to_string(),
            use_terminology: true,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                engine_warn!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Write the config as pretty RON to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(self, pretty)
            .map_err(|err| ConfigError::Write(err.to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(CONFIG_FILENAME);
        AtomicFileWriter::new(dir)
            .write(filename, content.as_bytes())
            .map_err(|err| ConfigError::Write(err.to_string()))
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            backend: BackendSettings {
                base_url: self.server_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
            },
            push: PushSettings {
                url: self.push_url.clone().unwrap_or_else(|| self.server_url.clone()),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                poll_timeout: Duration::from_secs(self.poll_timeout_secs),
                ..PushSettings::default()
            },
            output_dir: self.output_dir.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::{SessionConfig, DEFAULT_TIME_LIMIT_SECS};

/// Preferences persisted between runs. The resolution delay is not a
/// preference and always uses the session default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_limit_secs: u64,
    pub sound: bool,
    pub last_board: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            sound: true,
            last_board: None,
        }
    }
}

/// Effective settings for one run: stored preferences with CLI overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub board_id: Option<String>,
    pub time_limit_secs: u64,
    pub sound: bool,
}

impl RuntimeSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            time_limit_secs: self.time_limit_secs,
            ..SessionConfig::default()
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RuntimeSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            board_id: cfg.last_board.clone(),
            time_limit_secs: cfg.time_limit_secs,
            sound: cfg.sound,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            time_limit_secs: rs.time_limit_secs,
            sound: rs.sound,
            last_board: rs.board_id.clone(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("pairflip_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(mut cfg) = serde_json::from_slice::<Config>(&bytes) {
                // A zero limit would time out on the first tick
                cfg.time_limit_secs = cfg.time_limit_secs.max(1);
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

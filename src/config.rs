use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub streets_path: PathBuf,
    pub intersections_path: PathBuf,
    /// Pause between answering and the next question.
    pub answer_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            streets_path: PathBuf::from("street.geojson"),
            intersections_path: PathBuf::from("intersection_pro.geojson"),
            answer_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.answer_delay_ms)
    }
}

/// Read-only source of settings. Nothing is written back.
pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "streetquiz") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("streetquiz_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
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
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "ignoring invalid config")
                }
            }
        }
        Config::default()
    }
}

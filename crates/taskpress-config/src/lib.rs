pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a settings file.
pub const CONFIG_ENV: &str = "TASKPRESS_CONFIG";

const CONFIG_FILE: &str = "config.yaml";
const PROJECT_DIR: &str = ".taskpress";
const APP_DIR: &str = "taskpress";

/// CLI settings read from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API host, e.g. `api.taskpress.dev`.
    pub api_host: String,
    pub api_token: Option<String>,
    /// Image version used when the build names none.
    pub version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_host: "api.taskpress.dev".to_string(),
            api_token: None,
            version: "latest".to_string(),
        }
    }
}

/// User-wide settings file: `<config dir>/taskpress/config.yaml`.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Finds the settings file.
///
/// Search order:
/// 1. `TASKPRESS_CONFIG` (direct path)
/// 2. `./.taskpress/config.yaml`
/// 3. `<config dir>/taskpress/config.yaml`
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!("{} points at a missing file: {}", CONFIG_ENV, path.display());
    }

    let project = std::env::current_dir()?.join(PROJECT_DIR).join(CONFIG_FILE);
    if project.exists() {
        return Ok(Some(project));
    }

    Ok(global_config_path().filter(|path| path.exists()))
}

/// Loads settings from the first file found, or defaults when there is none.
pub fn load_settings() -> Result<Settings> {
    match find_config_file()? {
        Some(path) => load_settings_from(&path),
        None => {
            tracing::debug!("No settings file found, using defaults");
            Ok(Settings::default())
        }
    }
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    tracing::debug!("Loading settings from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

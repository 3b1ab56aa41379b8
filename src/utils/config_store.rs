//! ConfigStore - TOML Configuration Storage
//!
//! Platform-specific locations of `config.toml`:
//! - **Linux**: `~/.config/air-markets/` or `$XDG_CONFIG_HOME/air-markets/`
//! - **macOS**: `~/Library/Application Support/org.air-markets.air-markets/`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\air-markets\air-markets\config\`

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::domain::config::AppConfig;
use crate::error::{Error, Result};

const CONFIG_FILE: &str = "config.toml";

/// Default config file path in the platform config directory
pub fn default_config_path() -> Result<PathBuf> {
    let Some(project_dirs) = ProjectDirs::from("org", "air-markets", "air-markets") else {
        return Err(Error::invalid("Could not determine project directories"));
    };
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

/// Load and validate a config file; a missing file yields defaults
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load from an explicit path, or from the platform config directory
pub fn load_config_or_default(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_config(&default_config_path()?),
    }
}

/// Save a config file, creating its directory if needed
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

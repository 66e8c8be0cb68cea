//! Editor Configuration
//!
//! User settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Display bounds for the page image
    pub display: DisplaySettings,
    /// Interaction tuning
    pub interaction: InteractionSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            display: DisplaySettings::default(),
            interaction: InteractionSettings::default(),
        }
    }
}

/// Maximum size of the displayed page; larger pages are scaled down to fit,
/// smaller ones are shown at native size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 800,
        }
    }
}

/// Pointer interaction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSettings {
    /// Pixel distance within which a click selects an arrow
    pub arrow_hit_threshold: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            arrow_hit_threshold: 10.0,
        }
    }
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("io", "flowedit", "flowedit")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<EditorConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EditorConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &EditorConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Resolve the effective configuration: an explicit path must load, the
/// default path falls back to defaults when the file does not exist yet.
pub fn load_or_default(explicit: Option<&Path>) -> Result<EditorConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = default_config_path()?;
            if path.exists() {
                load_config(&path)
            } else {
                Ok(EditorConfig::default())
            }
        }
    }
}

//! Configuration module for multisearch
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "MULTISEARCH_SETTINGS_PATH";

/// Load settings from the first file found, or use defaults.
///
/// Lookup order: `$MULTISEARCH_SETTINGS_PATH`, `settings.yml`,
/// `config/settings.yml`, then `multisearch/settings.yml` under the user
/// config directory. Environment overrides are applied afterwards and the
/// result is validated.
pub fn load() -> Result<Settings> {
    let mut settings = match find_settings_file() {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

fn find_settings_file() -> Option<PathBuf> {
    let explicit = std::env::var(SETTINGS_PATH_VAR).ok().map(PathBuf::from);

    let mut candidates: Vec<PathBuf> = explicit.into_iter().collect();
    candidates.push(PathBuf::from("settings.yml"));
    candidates.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("multisearch/settings.yml"));
    }

    candidates.into_iter().find(|p| p.exists())
}

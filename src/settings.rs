//! Command line settings persistence
//!
//! Stores the non-secret client defaults in the platform-specific config folder:
//! - Linux: ~/.config/s3-storage/settings.json
//! - Windows: %APPDATA%/s3-storage/settings.json
//! - macOS: ~/Library/Application Support/s3-storage/settings.json
//!
//! Credentials are never written here; they come from the environment or the
//! default credential chain.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::s3::StorageOptions;

/// Client defaults that persist between invocations
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub default_bucket: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Named AWS profile for the default credential chain
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub force_path_style: bool,
}

impl Settings {
    /// Load settings from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        tracing::info!(
            "Loaded settings: bucket={:?}, region={:?}, profile={:?}",
            settings.default_bucket,
            settings.region,
            settings.profile
        );

        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        tracing::debug!("Saved settings to {:?}", path);

        Ok(())
    }

    /// Get the path to the settings file
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "s3-storage", "s3-storage")
            .context("Failed to determine settings directory")?;

        Ok(proj_dirs.config_dir().join("settings.json"))
    }

    pub fn set_default_bucket(&mut self, bucket: Option<&str>) {
        self.default_bucket = bucket.map(|s| s.to_string());
    }

    /// Client options seeded from these settings, without credentials
    pub fn to_options(&self) -> StorageOptions {
        StorageOptions {
            region: self.region.clone(),
            default_bucket: self.default_bucket.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
            force_path_style: self.force_path_style,
            ..Default::default()
        }
    }
}

//! Application Configuration
//!
//! Manages all propctl settings including:
//! - Property file locations
//! - Privileged helper and tool names
//! - Remount commands for the system partition
//! - LCD density limits

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{CoreError, Result};

/// Property file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Primary property file on the protected partition
    pub primary: PathBuf,
    /// Secondary override file, freely writable
    pub secondary: PathBuf,
    /// Mount point that must be remounted before writing below it
    pub protected_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("/system/build.prop"),
            secondary: PathBuf::from("/data/local.prop"),
            protected_root: PathBuf::from("/system"),
        }
    }
}

/// Helper process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Program that runs commands with root privileges
    pub privileged: String,
    /// Tool prefix for sed/printf/chmod (e.g. "busybox"); empty for none
    pub busybox: String,
    /// Program used to query runtime properties
    pub getprop: String,
    /// File mode applied to the primary file after an edit
    pub file_mode: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            privileged: "su".to_string(),
            busybox: "busybox".to_string(),
            getprop: "getprop".to_string(),
            file_mode: "644".to_string(),
        }
    }
}

impl ShellConfig {
    /// Prefix a tool name with the busybox applet launcher, if any
    pub fn tool(&self, name: &str) -> String {
        if self.busybox.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", self.busybox, name)
        }
    }
}

/// Remount commands issued around writes to the protected partition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemountConfig {
    pub read_write: String,
    pub read_only: String,
}

impl Default for RemountConfig {
    fn default() -> Self {
        Self {
            read_write: "busybox mount -o rw,remount /system".to_string(),
            read_only: "busybox mount -o ro,remount /system".to_string(),
        }
    }
}

/// LCD density limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Property holding the density
    pub property: String,
    pub min: u32,
    pub max: u32,
    /// Used when custom input cannot be parsed
    pub fallback: u32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            property: "ro.sf.lcd_density".to_string(),
            min: 180,
            max: 280,
            fallback: 213,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level filter (error, warn, info, debug, trace)
    pub log_level: Option<String>,
    pub paths: PathsConfig,
    pub shell: ShellConfig,
    pub remount: RemountConfig,
    pub density: DensityConfig,
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("org", "propctl", "propctl")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| CoreError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            Self::load_from(&config_file).await
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(&config_file).await?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to an explicit file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Whether writing to `path` requires remounting the protected partition
    pub fn is_protected(&self, path: &Path) -> bool {
        path.starts_with(&self.paths.protected_root)
    }
}

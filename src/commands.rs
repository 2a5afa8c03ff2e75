//! CLI commands for propctl
//!
//! Each command renders its result as text so the binary only has to print it.

use std::path::PathBuf;
use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use propctl_core::{DeviceClass, DisplayInfo};
use propctl_store::{density, files, PropStore};

/// Read a key from a property file
#[derive(Debug, Args)]
pub struct GetCommand {
    pub key: String,
    /// File to read instead of the primary property file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl GetCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        let path = self.file.clone().unwrap_or_else(|| store.config().paths.primary.clone());
        match store.read_property(&path, &self.key).await {
            Some(value) => Ok(value),
            None => bail!("{} not found in {:?}", self.key, path),
        }
    }
}

/// Set a key in the primary property file
#[derive(Debug, Args)]
pub struct SetCommand {
    pub key: String,
    pub value: String,
    /// Also write the secondary override file
    #[arg(long)]
    pub data: bool,
}

impl SetCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        store.try_set_property(&self.key, &self.value, self.data).await?;
        Ok(format!("{}={}", self.key, self.value))
    }
}

/// Query a live system property
#[derive(Debug, Args)]
pub struct GetpropCommand {
    pub name: String,
}

impl GetpropCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        match store.runtime_property(&self.name).await {
            Some(value) => Ok(value),
            None => bail!("Could not query {}", self.name),
        }
    }
}

/// List all properties in a file
#[derive(Debug, Args)]
pub struct ListCommand {
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Print JSON instead of key=value lines
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        let path = self.file.clone().unwrap_or_else(|| store.config().paths.primary.clone());
        let entries = files::parse_props(&files::read_file(&path).await);

        if self.json {
            return Ok(serde_json::to_string_pretty(&entries)?);
        }

        Ok(entries
            .iter()
            .map(|entry| format!("{}={}", entry.key, entry.value))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Change the LCD density
#[derive(Debug, Args)]
pub struct DensityCommand {
    /// Density in dpi
    pub value: String,
    /// Treat the value as free-form input: fall back on parse errors and
    /// clamp to the configured range
    #[arg(long)]
    pub custom: bool,
    /// Reboot when the density changed
    #[arg(long)]
    pub reboot: bool,
}

impl DensityCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        let density = if self.custom {
            density::parse_custom(&self.value, &store.config().density)
        } else {
            density::parse_exact(&self.value)?
        };
        let change = density::apply(store, density).await?;

        if !change.needs_reboot() {
            return Ok(format!("Density already {}", density));
        }
        if self.reboot {
            info!("Density changed, rebooting");
            store.reboot().await;
            return Ok(format!("Density set to {}, rebooting", density));
        }
        Ok(format!("Density set to {}, reboot to apply", density))
    }
}

/// Classify a display as phone, hybrid or tablet
#[derive(Debug, Args)]
pub struct DeviceClassCommand {
    #[arg(long)]
    pub width: u32,
    #[arg(long)]
    pub height: u32,
    /// Density in dpi
    #[arg(long)]
    pub density: u32,
    /// Tablet UI setting is on
    #[arg(long)]
    pub tablet_ui: bool,
    #[arg(long)]
    pub json: bool,
}

impl DeviceClassCommand {
    pub fn execute(&self) -> Result<String> {
        let display = DisplayInfo {
            width_px: self.width,
            height_px: self.height,
            density_dpi: self.density,
            tablet_ui_enabled: self.tablet_ui,
        };
        let class = DeviceClass::detect(&display)?;

        if self.json {
            return Ok(serde_json::to_string(&serde_json::json!({
                "class": class,
                "short_side_dp": display.short_side_dp()?,
            }))?);
        }
        Ok(class.as_str().to_string())
    }
}

/// Restart system UI and settings
pub struct RestartUiCommand;

impl RestartUiCommand {
    pub async fn execute(&self, store: &PropStore) -> Result<String> {
        if !store.restart_ui().await {
            bail!("Privileged shell unavailable");
        }
        Ok("UI restarting".to_string())
    }
}

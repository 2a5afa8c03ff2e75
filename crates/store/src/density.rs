//! LCD density edits.

use tracing::info;

use propctl_core::DensityConfig;

use crate::{PropError, PropStore};

/// Result of applying a density
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityChange {
    /// Runtime value before the edit, if it could be read
    pub previous: Option<String>,
    pub applied: u32,
}

impl DensityChange {
    /// The new density only takes effect after a reboot
    pub fn needs_reboot(&self) -> bool {
        self.previous.as_deref() != Some(self.applied.to_string().as_str())
    }
}

/// Parse user-entered density, falling back and clamping to the configured range
pub fn parse_custom(input: &str, config: &DensityConfig) -> u32 {
    let value = input.trim().parse::<i64>().unwrap_or(config.fallback as i64);
    value.clamp(config.min as i64, config.max as i64) as u32
}

/// Parse a density chosen from the preset list; written unchanged
pub fn parse_exact(input: &str) -> Result<u32, PropError> {
    match input.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(PropError::InvalidValue(input.to_string())),
    }
}

/// Write the density property to the primary file
pub async fn apply(store: &PropStore, density: u32) -> Result<DensityChange, PropError> {
    let property = store.config().density.property.clone();
    let previous = store.runtime_property(&property).await;

    store.try_set_property(&property, &density.to_string(), false).await?;
    info!("Density {:?} -> {}", previous, density);

    Ok(DensityChange { previous, applied: density })
}

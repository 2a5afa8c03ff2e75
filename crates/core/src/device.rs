//! Device Class Detection
//!
//! Classifies the screen as phone, hybrid or tablet from display metrics
//! passed in by the caller.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Baseline density that dp values are measured against
pub const DENSITY_DEFAULT: u32 = 160;

/// Display metrics needed for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Raw width in pixels
    pub width_px: u32,
    /// Raw height in pixels
    pub height_px: u32,
    /// Device density in dpi
    pub density_dpi: u32,
    /// Whether the tablet UI setting is switched on
    pub tablet_ui_enabled: bool,
}

impl DisplayInfo {
    /// Shortest screen side in density-independent pixels
    pub fn short_side_dp(&self) -> Result<u32> {
        if self.density_dpi == 0 {
            return Err(CoreError::Display("density is zero".into()));
        }
        let short = self.width_px.min(self.height_px) as u64;
        let dp = short * DENSITY_DEFAULT as u64 / self.density_dpi as u64;
        u32::try_from(dp).map_err(|_| CoreError::Display(format!("short side of {}dp is out of range", dp)))
    }
}

/// Device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Separate status and navigation bar
    Phone,
    /// Phone UI adjusted for larger screens
    Hybrid,
    /// Combined status and navigation bar
    Tablet,
}

impl DeviceClass {
    /// Classify a display
    pub fn detect(display: &DisplayInfo) -> Result<Self> {
        let short_dp = display.short_side_dp()?;

        let class = if display.tablet_ui_enabled {
            DeviceClass::Tablet
        } else if short_dp < 600 {
            DeviceClass::Phone
        } else {
            // 600dp and up with the tablet UI switched off
            DeviceClass::Hybrid
        };
        Ok(class)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Phone => "phone",
            DeviceClass::Hybrid => "hybrid",
            DeviceClass::Tablet => "tablet",
        }
    }

    pub fn is_phone(&self) -> bool {
        *self == DeviceClass::Phone
    }

    pub fn is_hybrid(&self) -> bool {
        *self == DeviceClass::Hybrid
    }

    pub fn is_tablet(&self) -> bool {
        *self == DeviceClass::Tablet
    }
}

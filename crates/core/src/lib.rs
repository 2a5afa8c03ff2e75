//! propctl Core - configuration and shared types
//!
//! This crate holds the configuration, error type and device-class
//! detection shared by the shell and store crates.

pub mod config;
pub mod device;
pub mod error;

pub use config::{AppConfig, DensityConfig, PathsConfig, RemountConfig, ShellConfig};
pub use device::{DeviceClass, DisplayInfo};
pub use error::{CoreError, Result};

/// propctl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "propctl";

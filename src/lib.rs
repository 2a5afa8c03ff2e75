//! propctl - build.prop editing through a root shell
//!
//! Reads and edits `key=value` property files that live on a read-only
//! system partition. Edits run through `su`, which remounts the partition
//! read-write for the duration of the change.
//!
//! ## Architecture
//!
//! - `propctl-core`: configuration, errors and device-class detection
//! - `propctl-shell`: root shell batches, `getprop` and the remount guard
//! - `propctl-store`: property file reads and privileged upserts

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use propctl_core as core;
pub use propctl_shell as shell;
pub use propctl_store as store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use propctl_core::{AppConfig, DeviceClass, DisplayInfo};
    pub use propctl_shell::{ExecOutcome, PrivilegedShell, PropertyReader};
    pub use propctl_store::{PropError, PropStore, Upsert};
}

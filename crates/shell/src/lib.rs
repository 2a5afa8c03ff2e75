//! Privileged Shell Bridge
//!
//! Talks to the root shell and the `getprop` helper on the device.

pub mod getprop;
pub mod remount;
pub mod shell;

pub use getprop::PropertyReader;
pub use remount::RemountGuard;
pub use shell::{ExecOutcome, PrivilegedShell};

/// Shell errors
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Failed to launch {0}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("Privileged shell unavailable: {0}")]
    Launch(String),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("No output from {0}")]
    NoOutput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

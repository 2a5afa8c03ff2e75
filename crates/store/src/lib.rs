//! Property Store
//!
//! Reads and edits `build.prop`-style files on a read-only system partition.

pub mod command;
pub mod density;
pub mod files;
pub mod store;

pub use command::CommandBuilder;
pub use density::DensityChange;
pub use files::PropEntry;
pub use store::{PropStore, Upsert};

use std::path::PathBuf;
use propctl_shell::ShellError;

/// Property store errors
#[derive(Debug, thiserror::Error)]
pub enum PropError {
    #[error("Invalid property key: {0:?}")]
    InvalidKey(String),
    #[error("Invalid property value: {0:?}")]
    InvalidValue(String),
    #[error("Privileged edit of {path:?} exited with {code:?}")]
    BatchFailed { path: PathBuf, code: Option<i32> },
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

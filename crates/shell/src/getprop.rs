//! Runtime property queries via `getprop`.

use tokio::process::Command;
use tracing::{debug, warn};

use propctl_core::ShellConfig;

use crate::ShellError;

/// Reads live system properties through an unprivileged helper
#[derive(Debug, Clone)]
pub struct PropertyReader {
    program: String,
}

impl PropertyReader {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(config.getprop.clone())
    }

    /// First line of `getprop <name>`, or `None` on any failure
    pub async fn get(&self, name: &str) -> Option<String> {
        match self.try_get(name).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Could not query property {}: {}", name, e);
                None
            }
        }
    }

    pub async fn try_get(&self, name: &str) -> Result<String, ShellError> {
        debug!("{} {}", self.program, name);

        let output = Command::new(&self.program)
            .arg(name)
            .output()
            .await
            .map_err(|e| ShellError::Spawn(self.program.clone(), e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .next()
            .map(str::to_string)
            .ok_or_else(|| ShellError::NoOutput(format!("{} {}", self.program, name)))
    }
}

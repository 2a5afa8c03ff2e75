//! Privileged Shell
//!
//! Feeds batches of commands to a root shell over its stdin.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use propctl_core::ShellConfig;

use crate::ShellError;

/// Result of feeding one batch to the privileged shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Shell exited with status zero
    Completed,
    /// Shell ran the batch but exited non-zero (None when killed by a signal)
    Failed { code: Option<i32> },
    /// Shell could not be started or fed its input
    LaunchFailed { reason: String },
}

impl ExecOutcome {
    /// Whether the shell was launched and received the whole batch.
    ///
    /// This is the coarse signal older callers rely on: it says nothing
    /// about whether individual commands in the batch succeeded.
    pub fn launched(&self) -> bool {
        !matches!(self, ExecOutcome::LaunchFailed { .. })
    }

    /// Whether the shell exited cleanly
    pub fn success(&self) -> bool {
        matches!(self, ExecOutcome::Completed)
    }

    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ExecOutcome::Completed
        } else {
            ExecOutcome::Failed { code: status.code() }
        }
    }
}

/// Root shell driven over stdin
#[derive(Debug, Clone)]
pub struct PrivilegedShell {
    program: String,
}

impl PrivilegedShell {
    /// Create a shell that launches `program` (normally `su`)
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(config.privileged.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run a batch of commands, one per line, after an optional delay.
    ///
    /// Waits for the shell to exit. There is no timeout.
    pub async fn execute<S: AsRef<str>>(&self, commands: &[S], delay: Duration) -> ExecOutcome {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.feed(commands).await {
            Ok(status) => {
                let outcome = ExecOutcome::from_status(status);
                if !outcome.success() {
                    warn!("{} exited with {:?}", self.program, status.code());
                }
                outcome
            }
            Err(e) => {
                warn!("Privileged batch failed: {}", e);
                ExecOutcome::LaunchFailed { reason: e.to_string() }
            }
        }
    }

    /// Run a batch and report only whether the shell was launched
    pub async fn run<S: AsRef<str>>(&self, commands: &[S], delay_ms: u64) -> bool {
        self.execute(commands, Duration::from_millis(delay_ms)).await.launched()
    }

    async fn feed<S: AsRef<str>>(&self, commands: &[S]) -> Result<ExitStatus, ShellError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ShellError::Spawn(self.program.clone(), e))?;

        if let Some(mut stdin) = child.stdin.take() {
            for command in commands {
                debug!("{}> {}", self.program, command.as_ref());
                stdin.write_all(command.as_ref().as_bytes()).await?;
                stdin.write_all(b"\n").await?;
            }
            stdin.flush().await?;
            // Closing stdin ends the batch
        }

        let output = child.wait_with_output().await?;
        if !output.stderr.is_empty() {
            debug!("{} stderr: {}", self.program, String::from_utf8_lossy(&output.stderr).trim_end());
        }
        Ok(output.status)
    }

    /// Blocking variant of [`execute`](Self::execute) without delay.
    ///
    /// Used where no async context is available, such as `Drop`.
    pub fn execute_blocking<S: AsRef<str>>(&self, commands: &[S]) -> ExecOutcome {
        use std::io::Write;

        let spawned = std::process::Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let err = ShellError::Spawn(self.program.clone(), e);
                warn!("Privileged batch failed: {}", err);
                return ExecOutcome::LaunchFailed { reason: err.to_string() };
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            for command in commands {
                debug!("{}> {}", self.program, command.as_ref());
                if let Err(e) = writeln!(stdin, "{}", command.as_ref()) {
                    warn!("Privileged batch failed: {}", e);
                    let _ = child.wait();
                    return ExecOutcome::LaunchFailed { reason: e.to_string() };
                }
            }
        }

        match child.wait() {
            Ok(status) => ExecOutcome::from_status(status),
            Err(e) => {
                warn!("Privileged batch failed: {}", e);
                ExecOutcome::LaunchFailed { reason: e.to_string() }
            }
        }
    }
}

//! Scoped remount of the protected partition.
//!
//! [`RemountGuard::acquire`] remounts read-write. The read-only remount runs
//! when the guard is released, or from `Drop` if the holder bailed out early.

use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

use propctl_core::RemountConfig;

use crate::{ExecOutcome, PrivilegedShell, ShellError};

/// Keeps the protected partition writable while alive
#[must_use = "dropping the guard remounts read-only immediately"]
pub struct RemountGuard<'a> {
    shell: &'a PrivilegedShell,
    read_only: String,
    released: bool,
}

impl<'a> RemountGuard<'a> {
    /// Remount read-write.
    ///
    /// Fails only when the shell cannot be launched. A non-zero exit from the
    /// remount itself is logged and the guard is still returned, so the
    /// read-only remount is issued either way.
    pub async fn acquire(shell: &'a PrivilegedShell, remount: &RemountConfig) -> Result<Self, ShellError> {
        debug!("Remounting read-write");
        match shell.execute(&[remount.read_write.as_str()], Duration::ZERO).await {
            ExecOutcome::LaunchFailed { reason } => Err(ShellError::Launch(reason)),
            outcome => {
                if !outcome.success() {
                    warn!("Read-write remount reported {:?}", outcome);
                }
                Ok(Self {
                    shell,
                    read_only: remount.read_only.clone(),
                    released: false,
                })
            }
        }
    }

    /// Remount read-only
    pub async fn release(mut self) -> ExecOutcome {
        self.released = true;
        debug!("Remounting read-only");
        let outcome = self.shell.execute(&[self.read_only.as_str()], Duration::ZERO).await;
        if !outcome.success() {
            warn!("Read-only remount reported {:?}", outcome);
        }
        outcome
    }
}

impl Drop for RemountGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!("Remount guard dropped without release, remounting read-only");
            let remount = || self.shell.execute_blocking(&[self.read_only.as_str()]);
            // Only reached on early exits; keep other tasks running meanwhile
            match Handle::try_current() {
                Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                    tokio::task::block_in_place(remount);
                }
                _ => {
                    remount();
                }
            }
        }
    }
}

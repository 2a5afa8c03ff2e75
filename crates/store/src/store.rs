//! Property Store
//!
//! Edits `key=value` property files through the privileged shell. Writes
//! below the protected root are wrapped in a [`RemountGuard`].

use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use propctl_core::AppConfig;
use propctl_shell::{ExecOutcome, PrivilegedShell, PropertyReader, RemountGuard, ShellError};

use crate::command::{validate_key, validate_value, CommandBuilder};
use crate::files;
use crate::PropError;

/// Processes killed by [`PropStore::restart_ui`]
pub const UI_PROCESSES: [&str; 2] = ["com.android.systemui", "com.android.settings"];

/// What an upsert did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing `key=` line was rewritten
    Replaced,
    /// A new line was appended
    Appended,
    /// The file did not exist and was created with the single line
    Created,
}

/// Property store backed by the primary and secondary property files
pub struct PropStore {
    config: AppConfig,
    shell: PrivilegedShell,
    props: PropertyReader,
}

impl PropStore {
    /// Create a new property store
    pub fn new(config: AppConfig) -> Self {
        let shell = PrivilegedShell::from_config(&config.shell);
        let props = PropertyReader::from_config(&config.shell);
        Self { config, shell, props }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn shell(&self) -> &PrivilegedShell {
        &self.shell
    }

    /// Live value of a system property
    pub async fn runtime_property(&self, name: &str) -> Option<String> {
        self.props.get(name).await
    }

    /// Value of the first `key=` line in the file at `path`
    pub async fn read_property(&self, path: &Path, key: &str) -> Option<String> {
        let contents = files::read_file(path).await;
        files::parse_props(&contents)
            .into_iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value)
    }

    /// Overwrite a file, remounting first when it lives on the protected root.
    /// Failures are logged.
    pub async fn write_lines<S: AsRef<str>>(&self, path: &Path, lines: &[S]) {
        if let Err(e) = self.try_write_lines(path, lines).await {
            error!("Failed to write {:?}: {}", path, e);
        }
    }

    pub async fn try_write_lines<S: AsRef<str>>(&self, path: &Path, lines: &[S]) -> Result<(), PropError> {
        if self.config.is_protected(path) {
            let guard = RemountGuard::acquire(&self.shell, &self.config.remount).await?;
            let written = files::write_lines(path, lines).await;
            guard.release().await;
            written?;
        } else {
            files::write_lines(path, lines).await?;
        }
        debug!("Wrote {} lines to {:?}", lines.len(), path);
        Ok(())
    }

    /// Set `key=value` in the primary file, and in the secondary file too
    /// when `also_secondary` is set. Failures are logged.
    pub async fn set_property(&self, key: &str, value: &str, also_secondary: bool) {
        if let Err(e) = self.try_set_property(key, value, also_secondary).await {
            error!("Failed to set {}={}: {}", key, value, e);
        }
    }

    pub async fn try_set_property(&self, key: &str, value: &str, also_secondary: bool) -> Result<(), PropError> {
        validate_key(key)?;
        validate_value(value)?;

        let primary = self.config.paths.primary.clone();
        let action = self.upsert_in(&primary, key, value).await?;
        info!("{}={} ({:?} in {:?})", key, value, action, primary);

        if also_secondary {
            let secondary = self.config.paths.secondary.clone();
            let action = if files::file_exists(&secondary) {
                self.upsert_in(&secondary, key, value).await?
            } else {
                self.try_write_lines(&secondary, &[format!("{}={}", key, value)]).await?;
                Upsert::Created
            };
            info!("{}={} ({:?} in {:?})", key, value, action, secondary);
        }

        Ok(())
    }

    /// Replace or append `key=value` in the file at `path`.
    ///
    /// Only the first matching line is rewritten. Files on the protected root
    /// get their mode reset and are edited inside a remount guard.
    pub async fn upsert_in(&self, path: &Path, key: &str, value: &str) -> Result<Upsert, PropError> {
        validate_key(key)?;
        validate_value(value)?;

        let snapshot = files::snapshot(path).await?;
        let commands = CommandBuilder::new(&self.config.shell);
        let protected = self.config.is_protected(path);

        let mut batch = Vec::with_capacity(2);
        let action = if files::has_key(&snapshot.contents, key) {
            batch.push(commands.substitute(path, key, value));
            Upsert::Replaced
        } else {
            batch.push(commands.append(path, key, value, snapshot.missing_final_newline));
            Upsert::Appended
        };
        if protected {
            batch.push(commands.chmod(path));
        }

        let outcome = if protected {
            let guard = RemountGuard::acquire(&self.shell, &self.config.remount).await?;
            let outcome = self.shell.execute(&batch, Duration::ZERO).await;
            guard.release().await;
            outcome
        } else {
            self.shell.execute(&batch, Duration::ZERO).await
        };

        match outcome {
            ExecOutcome::Completed => Ok(action),
            ExecOutcome::Failed { code } => Err(PropError::BatchFailed {
                path: path.to_path_buf(),
                code,
            }),
            ExecOutcome::LaunchFailed { reason } => Err(ShellError::Launch(reason).into()),
        }
    }

    /// Kill the system UI and settings processes so they restart
    pub async fn restart_ui(&self) -> bool {
        let commands = CommandBuilder::new(&self.config.shell);
        let mut launched = true;
        for process in UI_PROCESSES {
            if !self.shell.run(&[commands.pkill(process)], 0).await {
                warn!("Could not signal {}", process);
                launched = false;
            }
        }
        launched
    }

    /// Reboot the device through the privileged shell
    pub async fn reboot(&self) -> bool {
        info!("Rebooting");
        self.shell.run(&["reboot"], 0).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use propctl_core::{PathsConfig, RemountConfig, ShellConfig};

    /// Store rooted in a temp dir: `sh` stands in for `su`, remounts are
    /// recorded in `trace`, and `echo` stands in for `getprop`.
    pub(crate) fn test_store(dir: &Path) -> PropStore {
        let system = dir.join("system");
        let data = dir.join("data");
        std::fs::create_dir_all(&system).unwrap();
        std::fs::create_dir_all(&data).unwrap();
        let trace = dir.join("trace");

        PropStore::new(AppConfig {
            log_level: None,
            paths: PathsConfig {
                primary: system.join("build.prop"),
                secondary: data.join("local.prop"),
                protected_root: system,
            },
            shell: ShellConfig {
                privileged: "sh".into(),
                busybox: String::new(),
                getprop: "echo".into(),
                file_mode: "644".into(),
            },
            remount: RemountConfig {
                read_write: format!("echo rw >> '{}'", trace.display()),
                read_only: format!("echo ro >> '{}'", trace.display()),
            },
            density: Default::default(),
        })
    }

    fn primary(store: &PropStore) -> PathBuf {
        store.config().paths.primary.clone()
    }

    fn trace(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("trace")).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_replace_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\nro.sf.lcd_density=160\nro.b=2\n").unwrap();

        let action = store.upsert_in(&path, "ro.sf.lcd_density", "240").await.unwrap();

        assert_eq!(action, Upsert::Replaced);
        assert_eq!(files::read_file(&path).await, "ro.a=1\nro.sf.lcd_density=240\nro.b=2\n");
    }

    #[tokio::test]
    async fn test_append_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\nro.b=2\n").unwrap();

        let action = store.upsert_in(&path, "ro.c", "3").await.unwrap();

        assert_eq!(action, Upsert::Appended);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ro.a=1\nro.b=2\nro.c=3\n");
    }

    #[tokio::test]
    async fn test_append_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1").unwrap();

        store.upsert_in(&path, "ro.b", "2").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ro.a=1\nro.b=2\n");
    }

    #[tokio::test]
    async fn test_append_after_non_utf8_line_without_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, b"ro.product.model=Caf\xe9").unwrap();

        let action = store.upsert_in(&path, "ro.sf.lcd_density", "240").await.unwrap();

        assert_eq!(action, Upsert::Appended);
        assert_eq!(std::fs::read(&path).unwrap(), b"ro.product.model=Caf\xe9\nro.sf.lcd_density=240\n");
    }

    #[tokio::test]
    async fn test_replace_in_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, b"ro.sf.lcd_density=160\nro.x=\xe9\n").unwrap();

        let action = store.upsert_in(&path, "ro.sf.lcd_density", "240").await.unwrap();

        assert_eq!(action, Upsert::Replaced);
        assert_eq!(std::fs::read(&path).unwrap(), b"ro.sf.lcd_density=240\nro.x=\xe9\n");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_not_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        // A directory in place of the file cannot be read
        let path = dir.path().join("system").join("build.prop");
        std::fs::create_dir_all(&path).unwrap();

        let err = store.upsert_in(&path, "ro.a", "1").await.unwrap_err();

        assert!(matches!(err, PropError::Io(_)));
        assert_eq!(trace(dir.path()), "");
    }

    #[tokio::test]
    async fn test_replaces_first_match_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\nro.b=2\nro.a=3\n").unwrap();

        store.upsert_in(&path, "ro.a", "9").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ro.a=9\nro.b=2\nro.a=3\n");
    }

    #[tokio::test]
    async fn test_dot_in_key_is_literal() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "roXsf=1\nro.sf=2\n").unwrap();

        store.upsert_in(&path, "ro.sf", "5").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "roXsf=1\nro.sf=5\n");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\n").unwrap();

        store.set_property("ro.b", "2", false).await;
        let once = std::fs::read_to_string(&path).unwrap();
        store.set_property("ro.b", "2", false).await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), once);
        assert_eq!(once, "ro.a=1\nro.b=2\n");
    }

    #[tokio::test]
    async fn test_density_scenario_bracketed_by_remounts() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.build.id=JZO54K\nro.sf.lcd_density=160\nro.config.ringtone=Ring.ogg\n").unwrap();

        store.try_set_property("ro.sf.lcd_density", "240", false).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ro.build.id=JZO54K\nro.sf.lcd_density=240\nro.config.ringtone=Ring.ogg\n"
        );
        assert_eq!(trace(dir.path()), "rw\nro\n");
    }

    #[tokio::test]
    async fn test_remount_order_around_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.sf.lcd_density=160\n").unwrap();

        // Snapshot the file at each remount
        let log = dir.path().join("order");
        store = PropStore::new(AppConfig {
            remount: RemountConfig {
                read_write: format!("cat '{}' >> '{}'", path.display(), log.display()),
                read_only: format!("cat '{}' >> '{}'", path.display(), log.display()),
            },
            ..store.config().clone()
        });

        store.try_set_property("ro.sf.lcd_density", "240", false).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "ro.sf.lcd_density=160\nro.sf.lcd_density=240\n"
        );
    }

    #[tokio::test]
    async fn test_secondary_created_then_updated() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let secondary = store.config().paths.secondary.clone();
        std::fs::write(primary(&store), "ro.a=1\n").unwrap();

        store.try_set_property("ro.a", "2", true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&secondary).unwrap(), "ro.a=2\n");

        store.try_set_property("ro.b", "3", true).await.unwrap();
        store.try_set_property("ro.a", "4", true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&secondary).unwrap(), "ro.a=4\nro.b=3\n");
        assert_eq!(std::fs::read_to_string(primary(&store)).unwrap(), "ro.a=4\nro.b=3\n");

        // Secondary edits never remount
        assert_eq!(trace(dir.path()), "rw\nro\n".repeat(3));
    }

    #[tokio::test]
    async fn test_free_text_values_written_literally() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.product.model=Nexus 7\n").unwrap();

        let action = store.upsert_in(&path, "ro.product.model", "Nexus 7 (2013)").await.unwrap();
        assert_eq!(action, Upsert::Replaced);
        let action = store.upsert_in(&path, "ro.x", "$HOME;`id`*").await.unwrap();
        assert_eq!(action, Upsert::Appended);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ro.product.model=Nexus 7 (2013)\nro.x=$HOME;`id`*\n"
        );
    }

    #[tokio::test]
    async fn test_invalid_input_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\n").unwrap();

        let err = store.try_set_property("ro.a", "1'; reboot; '", false).await.unwrap_err();
        assert!(matches!(err, PropError::InvalidValue(_)));
        let err = store.try_set_property("ro a", "1", false).await.unwrap_err();
        assert!(matches!(err, PropError::InvalidKey(_)));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ro.a=1\n");
        assert_eq!(trace(dir.path()), "");
    }

    #[tokio::test]
    async fn test_missing_shell_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let base = test_store(dir.path());
        let path = primary(&base);
        std::fs::write(&path, "ro.a=1\n").unwrap();

        let mut config = base.config().clone();
        config.shell.privileged = "/nonexistent/propctl-su".into();
        let store = PropStore::new(config);

        let err = store.try_set_property("ro.a", "2", false).await.unwrap_err();
        assert!(matches!(err, PropError::Shell(ShellError::Launch(_))));

        store.set_property("ro.a", "2", false).await;
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ro.a=1\n");
    }

    #[tokio::test]
    async fn test_failed_edit_still_remounts_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        // Primary lives in a directory that does not exist, so the append fails
        let path = dir.path().join("system").join("missing").join("build.prop");

        let err = store.upsert_in(&path, "ro.a", "1").await.unwrap_err();

        assert!(matches!(err, PropError::BatchFailed { .. }));
        assert_eq!(trace(dir.path()), "rw\nro\n");
    }

    #[tokio::test]
    async fn test_write_lines_remounts_protected_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let secondary = store.config().paths.secondary.clone();
        store.write_lines(&secondary, &["ro.a=1"]).await;
        assert_eq!(trace(dir.path()), "");
        assert!(files::file_exists(&secondary));

        let path = primary(&store);
        store.write_lines(&path, &["ro.a=1", "ro.b=2"]).await;
        assert_eq!(trace(dir.path()), "rw\nro\n");
        assert_eq!(files::read_file(&path).await, "ro.a=1\nro.b=2\n");
    }

    #[tokio::test]
    async fn test_read_property() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let path = primary(&store);
        std::fs::write(&path, "ro.a=1\nro.b=2\nro.a=3\n").unwrap();

        assert_eq!(store.read_property(&path, "ro.a").await.as_deref(), Some("1"));
        assert_eq!(store.read_property(&path, "ro.c").await, None);
        assert_eq!(store.runtime_property("ro.a").await.as_deref(), Some("ro.a"));
    }

    #[tokio::test]
    async fn test_restart_ui() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        // pkill finds nothing to kill but the shell still launches
        assert!(store.restart_ui().await);

        let mut config = store.config().clone();
        config.shell.privileged = "/nonexistent/propctl-su".into();
        assert!(!PropStore::new(config).restart_ui().await);
    }
}

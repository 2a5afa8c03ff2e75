//! Shell command text for privileged edits.

use std::path::Path;
use once_cell::sync::Lazy;
use regex::Regex;

use propctl_core::ShellConfig;

use crate::PropError;

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("key pattern"));

/// Values sit inside a single-quoted sed replacement delimited by `|`
static VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^'|\\&\r\n]*$").expect("value pattern"));

/// Keys and values end up inside sed and shell text
pub fn validate_key(key: &str) -> Result<(), PropError> {
    if KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(PropError::InvalidKey(key.to_string()))
    }
}

pub fn validate_value(value: &str) -> Result<(), PropError> {
    if VALUE_RE.is_match(value) {
        Ok(())
    } else {
        Err(PropError::InvalidValue(value.to_string()))
    }
}

/// Single-quote a string for sh
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

/// Escape a validated key for use in a basic regular expression
fn escape_key(key: &str) -> String {
    key.replace('.', r"\.")
}

/// Builds command lines using the configured tool prefix
pub struct CommandBuilder<'a> {
    shell: &'a ShellConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(shell: &'a ShellConfig) -> Self {
        Self { shell }
    }

    /// Replace the first line starting with `key=` by `key=value`
    pub fn substitute(&self, path: &Path, key: &str, value: &str) -> String {
        let pattern = escape_key(key);
        format!(
            "{} -i '0,/^{pattern}=/s|^{pattern}=.*|{key}={value}|' {}",
            self.shell.tool("sed"),
            quote_path(path),
        )
    }

    /// Append `key=value` on its own line
    pub fn append(&self, path: &Path, key: &str, value: &str, leading_newline: bool) -> String {
        let format = if leading_newline { r"\n%s\n" } else { r"%s\n" };
        format!(
            "{} '{}' {} >> {}",
            self.shell.tool("printf"),
            format,
            shell_quote(&format!("{}={}", key, value)),
            quote_path(path),
        )
    }

    pub fn chmod(&self, path: &Path) -> String {
        format!("{} {} {}", self.shell.tool("chmod"), self.shell.file_mode, quote_path(path))
    }

    pub fn pkill(&self, process: &str) -> String {
        format!("pkill -TERM -f {}", process)
    }
}

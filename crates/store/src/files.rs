//! Plain file access for property files.
//!
//! Reads never fail loudly: callers get an empty string or `None` and the
//! cause is logged.

use std::path::Path;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// A parsed `key=value` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropEntry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the file
    pub line: usize,
}

/// Whether a regular file exists at `path`
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Whole file with every line terminated by `\n`; empty on any failure
pub async fn read_file(path: &Path) -> String {
    match try_read_file(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            String::new()
        }
    }
}

pub async fn try_read_file(path: &Path) -> std::io::Result<String> {
    let raw = tokio::fs::read(path).await?;
    Ok(reassemble(&raw))
}

/// Decode lossily and terminate every line with `\n`
pub fn reassemble(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut contents = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        contents.push_str(line);
        contents.push('\n');
    }
    contents
}

/// Raw file snapshot used before an edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Lossily decoded contents, one `\n` per line
    pub contents: String,
    /// The bytes on disk end without a newline
    pub missing_final_newline: bool,
}

/// Read a file for editing. A missing file is an empty snapshot; any other
/// failure is returned so the caller does not mistake it for an empty file.
pub async fn snapshot(path: &Path) -> std::io::Result<Snapshot> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Snapshot {
            contents: reassemble(&raw),
            missing_final_newline: raw.last().is_some_and(|byte| *byte != b'\n'),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
        Err(e) => Err(e),
    }
}

/// First line of the file, or `None` on failure or an empty file
pub async fn read_one_line(path: &Path) -> Option<String> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Could not open {:?}: {}", path, e);
            return None;
        }
    };

    match BufReader::new(file).lines().next_line().await {
        Ok(line) => line,
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            None
        }
    }
}

/// Overwrite `path` with `lines`, each followed by `\n`
pub async fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> std::io::Result<()> {
    let mut contents = String::new();
    for line in lines {
        contents.push_str(line.as_ref());
        contents.push('\n');
    }
    tokio::fs::write(path, contents).await
}

/// Write a single value with no trailing newline, for sysfs-style knobs
pub async fn write_one_line(path: &Path, value: &str) -> bool {
    match tokio::fs::write(path, value).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Error writing to {:?}: {}", path, e);
            false
        }
    }
}

/// Whether some line starts with `key=`
pub fn has_key(contents: &str, key: &str) -> bool {
    let prefix = format!("{}=", key);
    contents.lines().any(|line| line.starts_with(&prefix))
}

/// Parse `key=value` lines, skipping comments, blanks and lines without `=`
pub fn parse_props(contents: &str) -> Vec<PropEntry> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with('#'))
        .filter_map(|(idx, line)| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some(PropEntry {
                key: key.to_string(),
                value: value.to_string(),
                line: idx + 1,
            })
        })
        .collect()
}

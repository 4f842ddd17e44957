//! Filesystem primitives shared by every persisted artifact under `state/`.
//!
//! All writes go through [`write_atomic`]: readers observe either the previous
//! file or the complete new one, never a torn write.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::debug;

/// Mode for newly created artifacts, matching a plain `fs::write` under the
/// common 022 umask.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with `contents` via a sibling temp file and rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    if let Some(permissions) = target_permissions(path)? {
        tmp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("set permissions for {}", path.display()))?;
    }
    tmp.write_all(contents)
        .with_context(|| format!("write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "atomic write");
    Ok(())
}

/// Permissions of the existing target, else the usual mode for a new file.
/// Temp files start out owner-only.
fn target_permissions(path: &Path) -> Result<Option<fs::Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(err) => Err(err).with_context(|| format!("stat {}", path.display())),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    write_atomic(path, payload.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse json {}", path.display()))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Append one compact JSON line per record, preserving existing bytes.
///
/// The existing file is read, extended in memory and atomically replaced. Every
/// record is serialized before anything touches disk, so a serialization error
/// leaves the file unchanged.
pub fn append_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut lines = String::new();
    for record in records {
        lines.push_str(&serde_json::to_string(record).context("serialize jsonl record")?);
        lines.push('\n');
    }

    let mut buf = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    if buf.last().is_some_and(|byte| *byte != b'\n') {
        buf.push(b'\n');
    }
    buf.extend_from_slice(lines.as_bytes());
    debug!(path = %path.display(), records = records.len(), "appending jsonl");
    write_atomic(path, &buf)
}

/// Parse every non-blank line of a JSONL file. A missing file yields no records.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), idx + 1))
        })
        .collect()
}

//! File system utilities for the persistence core.
//!
//! Everything here exists to uphold two guarantees the stores rely on:
//!
//! - **Atomic writes**: documents are written to a temporary file created in
//!   the same directory as the target and then renamed over it, so readers
//!   only ever observe the previous complete document or the new complete
//!   document, never a partial one.
//! - **Non-invasive permission probing**: routine validation never leaves
//!   artifacts on disk; a real write is only attempted when the caller
//!   explicitly asks for an aggressive check.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Ensures a directory exists, creating it and all parent directories if
/// necessary.
///
/// On POSIX platforms created directories get mode `0o755`; elsewhere they
/// inherit platform defaults.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or if
/// creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o755)
                .create(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The temporary file is created in the target's own directory so the final
/// rename stays on one filesystem and is atomic. Content is synced to disk
/// before the rename. Parent directories are created if missing.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the
/// temporary file cannot be written, or the rename fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut temp = tempfile::Builder::new()
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync temp file to disk")?;

    temp.persist(path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Writes data as pretty-printed JSON to a file atomically.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: serde::Serialize,
{
    let json = serde_json::to_string_pretty(data)?;
    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

/// Checks whether `directory` is writable, without side effects by default.
///
/// Two tiers:
///
/// 1. A cheap metadata check (`permissions().readonly()`) when the directory
///    exists. This never touches disk contents.
/// 2. Only when the cheap check is negative or inconclusive **and**
///    `aggressive` is set, a real temporary file is written and removed. For
///    a directory that does not exist yet, the probe runs inside the nearest
///    existing ancestor instead; the target directory is never created by a
///    check.
///
/// Returns `true` only on reliable evidence of write permission.
#[must_use]
pub fn check_write_permission(directory: &Path, aggressive: bool) -> bool {
    if directory.exists() {
        match fs::metadata(directory) {
            Ok(meta) if !meta.permissions().readonly() => return true,
            Ok(_) => {}
            Err(e) => {
                debug!("Metadata check failed for {}: {e}", directory.display());
            }
        }
        if !aggressive {
            return false;
        }
        return probe_write(directory);
    }

    if !aggressive {
        debug!(
            "Directory {} does not exist; conservative check returns false",
            directory.display()
        );
        return false;
    }

    // Probe the nearest existing ancestor without creating the target.
    let Some(ancestor) = directory.ancestors().skip(1).find(|p| p.exists()) else {
        return false;
    };
    match tempfile::Builder::new().prefix(".perm_test_").tempdir_in(ancestor) {
        Ok(dir) => {
            let test_path = dir.path().join(".t.tmp");
            fs::write(&test_path, b"ok").is_ok()
        }
        Err(e) => {
            debug!("Aggressive probe in ancestor {} failed: {e}", ancestor.display());
            false
        }
    }
}

fn probe_write(directory: &Path) -> bool {
    match tempfile::Builder::new().prefix(".perm_test_").suffix(".tmp").tempfile_in(directory) {
        Ok(mut tf) => tf.write_all(b"ok").is_ok(),
        Err(e) => {
            debug!("Aggressive probe failed in {}: {e}", directory.display());
            false
        }
    }
}

//! Durable (all-or-nothing) file writes.
//!
//! Readers of a destination written through this module observe either the
//! previous complete content or the new complete content, never a mix.
//!
//! # Implementation Strategy
//!
//! 1. Validate structured content (`.json`, `.ipynb`, `.yaml`, `.yml`) before
//!    any filesystem side effect
//! 2. Ensure the parent directory exists
//! 3. Write content to a uniquely named temporary file in the same directory
//! 4. Sync the temporary file to disk (fsync)
//! 5. Rename the temporary file onto the destination
//!
//! Any failure in steps 3-5 removes the temporary file and leaves the
//! destination untouched.
//!
//! # Important Notes
//!
//! - Source and destination must be on the same filesystem/volume for atomic
//!   rename, which is why the temporary file lives next to the destination
//! - Temporary names are `.{filename}.{pid}.{uuid}.tmp`, so concurrent writers
//!   to the same destination never share a temporary file
//! - Concurrent writers to one destination resolve as last-rename-wins

use super::format::StructuredFormat;
use crate::error::{CellsyncError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix shared by every temporary file this module creates.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Durably write bytes to a file.
///
/// # Arguments
///
/// * `path` - The target file path
/// * `content` - The bytes to write
///
/// # Returns
///
/// * `Ok(())` - On successful durable write
/// * `Err(CellsyncError::ValidationFailed)` - Content does not parse as the
///   target's structured format; nothing was written
/// * `Err(CellsyncError::Io)` - On write, sync or rename failure
///
/// # Example
///
/// ```no_run
/// use cellsync::fs::durable_write;
/// use std::path::Path;
///
/// durable_write(Path::new("state/session.json"), br#"{"status": "idle"}"#)?;
/// # Ok::<(), cellsync::error::CellsyncError>(())
/// ```
pub fn durable_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(format) = StructuredFormat::from_path(path) {
        format
            .validate(content)
            .map_err(|reason| CellsyncError::ValidationFailed {
                path: path.to_path_buf(),
                format: format.as_str().to_string(),
                reason,
            })?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CellsyncError::Io(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = generate_temp_path(path)?;

    if let Err(e) = write_and_sync(&temp_path, content).and_then(|()| replace(&temp_path, path)) {
        remove_temp(&temp_path);
        return Err(e);
    }

    debug!(path = %path.display(), bytes = content.len(), "durable write committed");
    Ok(())
}

/// Durably write a string to a file.
///
/// Convenience wrapper around [`durable_write`] for string content.
pub fn durable_write_str<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    durable_write(path, content.as_bytes())
}

/// Generate a unique temporary file path in the same directory as the target.
pub(crate) fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            CellsyncError::Io(format!("invalid file path '{}'", target.display()))
        })?;

    let token = uuid::Uuid::new_v4().simple();
    let temp_name = format!(".{}.{}.{}{}", filename, std::process::id(), token, TEMP_SUFFIX);
    Ok(parent.join(temp_name))
}

/// Write content to a fresh file and sync it to disk.
pub(crate) fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            CellsyncError::Io(format!(
                "failed to create temporary file '{}': {}",
                path.display(),
                e
            ))
        })?;

    file.write_all(content)
        .map_err(|e| CellsyncError::Io(format!("failed to write to temporary file: {}", e)))?;

    file.sync_all().map_err(|e| {
        CellsyncError::Io(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

/// Atomically replace the target file with the source file.
fn replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        CellsyncError::Io(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    sync_parent_dir(target);
    Ok(())
}

/// Persist the directory entry of a freshly renamed file.
#[cfg(unix)]
fn sync_parent_dir(target: &Path) {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_target: &Path) {}

fn remove_temp(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to remove temporary file"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(TEMP_SUFFIX))
            })
            .collect()
    }

    #[test]
    fn test_durable_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        durable_write(&file_path, b"hello world").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_durable_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        fs::write(&file_path, "original content").unwrap();
        durable_write(&file_path, b"new content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "new content");
    }

    #[test]
    fn test_durable_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("dirs").join("test.txt");

        durable_write_str(&file_path, "nested content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "nested content");
    }

    #[test]
    fn test_durable_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("state.json");

        durable_write_str(&file_path, r#"{"ok": true}"#).unwrap();

        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_invalid_json_rejected_without_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("session.json");

        let err = durable_write_str(&file_path, "{ not json").unwrap_err();

        assert!(matches!(err, CellsyncError::ValidationFailed { .. }));
        assert!(!file_path.exists());
        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_invalid_content_keeps_previous_version() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nb.ipynb");
        let original = r#"{"cells": [], "metadata": {}}"#;
        fs::write(&file_path, original).unwrap();

        let err = durable_write_str(&file_path, r#"{"metadata": {}}"#).unwrap_err();

        assert!(matches!(err, CellsyncError::ValidationFailed { .. }));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), original);
        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_validation_failure_does_not_create_parent() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("missing");
        let file_path = nested.join("config.yaml");

        assert!(durable_write_str(&file_path, "a: [").is_err());
        assert!(!nested.exists());
    }

    #[test]
    fn test_validation_error_names_target() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("broken.json");

        let msg = durable_write_str(&file_path, "[").unwrap_err().to_string();
        assert!(msg.contains("broken.json"));
        assert!(msg.contains("json"));
    }

    #[test]
    fn test_rename_failure_cleans_temp() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the destination makes the final rename fail.
        let file_path = temp_dir.path().join("occupied");
        fs::create_dir(&file_path).unwrap();
        fs::write(file_path.join("keep"), "x").unwrap();

        assert!(durable_write(&file_path, b"data").is_err());
        assert!(temp_files(temp_dir.path()).is_empty());
        assert!(file_path.join("keep").exists());
    }

    #[test]
    fn test_generate_temp_path_is_sibling_and_unique() {
        let target = Path::new("/some/path/file.txt");
        let a = generate_temp_path(target).unwrap();
        let b = generate_temp_path(target).unwrap();

        assert_eq!(a.parent().unwrap(), Path::new("/some/path"));
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".file.txt."));
        assert!(name.ends_with(TEMP_SUFFIX));
        assert_ne!(a, b);
    }

    #[test]
    fn test_durable_write_binary_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("binary.bin");

        let binary_content: Vec<u8> = (0..256).map(|i| i as u8).collect();
        durable_write(&file_path, &binary_content).unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), binary_content);
    }

    #[test]
    fn test_concurrent_writers_same_destination() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("shared.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = file_path.clone();
                std::thread::spawn(move || {
                    let body = format!(r#"{{"writer": {}, "pad": "{}"}}"#, i, "x".repeat(4096));
                    durable_write_str(&path, &body).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Whichever rename landed last, the file is one complete version.
        let content = fs::read_to_string(&file_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(parsed["writer"].as_u64().unwrap() < 8);
        assert!(temp_files(temp_dir.path()).is_empty());
    }
}

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Atomically write content to a file
///
/// Writes to a sibling temporary file, syncs it, then renames it over the
/// target so readers never observe a half-written record.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory_exists(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = File::create(&temp_path).with_context(|| {
            format!("Failed to create temporary file: {}", temp_path.display())
        })?;

        file.write_all(content)
            .context("Failed to write to temporary file")?;

        file.sync_all().context("Failed to sync file to disk")?;
    }

    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Ensure a directory exists, creating it and all parents if needed
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }

    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Remove a file if present; a missing file is not an error
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = tempdir().unwrap();
        let test_file = temp_dir.path().join("usage_today.json");

        atomic_write(&test_file, b"42").unwrap();

        let mut file = File::open(&test_file).unwrap();
        let mut read_content = Vec::new();
        file.read_to_end(&mut read_content).unwrap();

        assert_eq!(b"42", &read_content[..]);
        assert!(!test_file.with_extension("tmp").exists());
    }

    #[test]
    fn test_atomic_write_nested_path() {
        let temp_dir = tempdir().unwrap();
        let test_file = temp_dir.path().join("nested").join("store").join("bypass_log.json");

        atomic_write(&test_file, b"[]").unwrap();

        assert_eq!(std::fs::read_to_string(&test_file).unwrap(), "[]");
    }

    #[test]
    fn test_atomic_write_replaces_existing_content() {
        let temp_dir = tempdir().unwrap();
        let test_file = temp_dir.path().join("bypass_count.json");

        atomic_write(&test_file, b"1").unwrap();
        atomic_write(&test_file, b"2").unwrap();

        assert_eq!(std::fs::read_to_string(&test_file).unwrap(), "2");
    }

    #[test]
    fn test_ensure_directory_exists_idempotent() {
        let temp_dir = tempdir().unwrap();
        let test_dir = temp_dir.path().join("idempotent_test");

        ensure_directory_exists(&test_dir).unwrap();
        assert!(test_dir.is_dir());

        ensure_directory_exists(&test_dir).unwrap();
        assert!(test_dir.is_dir());
    }

    #[test]
    fn test_remove_if_exists_tolerates_missing_file() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("session_start_time.json");

        remove_if_exists(&missing).unwrap();

        atomic_write(&missing, b"1").unwrap();
        remove_if_exists(&missing).unwrap();
        assert!(!missing.exists());
    }
}

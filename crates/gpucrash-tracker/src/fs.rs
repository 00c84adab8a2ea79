//! Filesystem primitives behind a trait.
//!
//! The tracker performs a small, fixed set of filesystem operations;
//! keeping them behind [`DumpFs`] lets tests inject failures and short
//! writes without touching the capture logic.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub trait DumpFs: Send + Sync {
    /// Per-user directory where the host application keeps its logs.
    fn user_log_dir(&self) -> Option<PathBuf>;

    /// Recursive delete of a directory tree.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create-or-truncate `path` with `bytes`, returning the number of
    /// bytes actually written so callers can detect short writes.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<usize>;
}

/// [`DumpFs`] over `std::fs`.
#[derive(Debug, Default, Clone)]
pub struct StdFs;

impl DumpFs for StdFs {
    fn user_log_dir(&self) -> Option<PathBuf> {
        dirs::data_local_dir()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<usize> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_reports_full_length() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");

        let written = StdFs.write(&path, b"payload").unwrap();

        assert_eq!(written, 7);
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");

        StdFs.write(&path, b"a longer first payload").unwrap();
        StdFs.write(&path, b"short").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn test_remove_then_create_dir_all() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("dump");

        StdFs.create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.bin"), b"old").unwrap();

        StdFs.remove_dir_all(&dir).unwrap();
        StdFs.create_dir_all(&dir).unwrap();

        assert!(dir.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }
}

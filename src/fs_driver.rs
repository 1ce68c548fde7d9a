//! Filesystem driver: reads, writes, and path-sandboxing checks.
//!
//! Atomic writes follow a write-to-temp-then-rename convention used for
//! editor workspace files and the status document alike.

use std::path::{Path, PathBuf};

use crate::error::OrchestratorError;

pub trait FsDriver: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, OrchestratorError>;
    fn write(&self, path: &Path, contents: &str) -> Result<(), OrchestratorError>;
    fn atomic_write(&self, path: &Path, contents: &str) -> Result<(), OrchestratorError>;
    fn exists(&self, path: &Path) -> bool;
    fn mkdir_all(&self, path: &Path) -> Result<(), OrchestratorError>;
    fn remove_dir_all(&self, path: &Path) -> Result<(), OrchestratorError>;
    fn remove_file(&self, path: &Path) -> Result<(), OrchestratorError>;
    fn resolve(&self, path: &Path) -> PathBuf;
    fn is_within_base(&self, path: &Path, base: &Path) -> bool;
    fn prune_empty_parents(&self, path: &Path, stop_at: &Path);
}

pub struct RealFsDriver;

impl RealFsDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFsDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FsDriver for RealFsDriver {
    fn read(&self, path: &Path) -> Result<String, OrchestratorError> {
        std::fs::read_to_string(path).map_err(|e| OrchestratorError::other(format!("failed to read {}: {e}", path.display())))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), OrchestratorError> {
        if let Some(parent) = path.parent() {
            self.mkdir_all(parent)?;
        }
        std::fs::write(path, contents).map_err(|e| OrchestratorError::other(format!("failed to write {}: {e}", path.display())))
    }

    /// Write-to-temp-then-rename so readers never observe a partial file
    /// (editor workspace files, the status document).
    fn atomic_write(&self, path: &Path, contents: &str) -> Result<(), OrchestratorError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        self.mkdir_all(parent)?;
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("fleet")
        ));
        std::fs::write(&tmp_path, contents)
            .map_err(|e| OrchestratorError::other(format!("failed to write {}: {e}", tmp_path.display())))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| OrchestratorError::other(format!("failed to rename into {}: {e}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn mkdir_all(&self, path: &Path) -> Result<(), OrchestratorError> {
        std::fs::create_dir_all(path).map_err(|e| OrchestratorError::other(format!("failed to create {}: {e}", path.display())))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), OrchestratorError> {
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_dir_all(path).map_err(|e| OrchestratorError::other(format!("failed to remove {}: {e}", path.display())))
    }

    fn remove_file(&self, path: &Path) -> Result<(), OrchestratorError> {
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_file(path).map_err(|e| OrchestratorError::other(format!("failed to remove {}: {e}", path.display())))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    fn is_within_base(&self, path: &Path, base: &Path) -> bool {
        let resolved_path = self.resolve(path);
        let resolved_base = self.resolve(base);
        resolved_path.starts_with(&resolved_base)
    }

    /// Remove empty directories walking up from `path` toward (but never
    /// including) `stop_at`, used after repository deletion to avoid
    /// leaving behind an empty `<url>/<remote>/` skeleton.
    fn prune_empty_parents(&self, path: &Path, stop_at: &Path) {
        let mut current = path.parent().map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir == stop_at || !dir.starts_with(stop_at) {
                break;
            }
            match std::fs::read_dir(&dir) {
                Ok(mut entries) if entries.next().is_none() => {
                    if std::fs::remove_dir(&dir).is_err() {
                        break;
                    }
                    current = dir.parent().map(Path::to_path_buf);
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("file.json");
        let driver = RealFsDriver::new();
        driver.atomic_write(&path, "hello").unwrap();
        assert_eq!(driver.read(&path).unwrap(), "hello");
    }

    #[test]
    fn is_within_base_detects_sandboxed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let driver = RealFsDriver::new();
        let inner = dir.path().join("repo");
        std::fs::create_dir_all(&inner).unwrap();
        assert!(driver.is_within_base(&inner, dir.path()));
        assert!(!driver.is_within_base(Path::new("/etc"), dir.path()));
    }

    #[test]
    fn prune_empty_parents_removes_up_to_stop_at() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::remove_dir(&nested).unwrap();
        let driver = RealFsDriver::new();
        driver.prune_empty_parents(&nested, dir.path());
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().exists());
    }
}

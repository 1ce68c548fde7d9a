//! Editor workspace file: the JSON `.code-workspace` descriptor
//! that groups a workspace's per-branch worktrees for an external editor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::fs_driver::FsDriver;
use crate::url::sanitize_branch_for_filename;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EditorWorkspaceFile {
    pub folders: Vec<Folder>,
}

/// `<workspace>-<sanitized-branch>.code-workspace`.
pub fn per_branch_file_path(workspaces_dir: &Path, workspace_name: &str, branch: &str) -> PathBuf {
    let sanitized = sanitize_branch_for_filename(branch);
    workspaces_dir.join(format!("{workspace_name}-{sanitized}.code-workspace"))
}

/// The bare `<workspace>.code-workspace` file, kept for "open the whole
/// workspace" convenience; not tied to a single branch.
pub fn main_file_path(workspaces_dir: &Path, workspace_name: &str) -> PathBuf {
    workspaces_dir.join(format!("{workspace_name}.code-workspace"))
}

/// Extract the trailing path segment of a normalized URL (or local path) to
/// use as an editor folder's display name.
pub fn extract_repository_name_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Read an editor workspace file, treating a missing file as empty rather
/// than an error.
pub fn read(fs: &dyn FsDriver, path: &Path) -> Result<EditorWorkspaceFile, OrchestratorError> {
    if !fs.exists(path) {
        return Ok(EditorWorkspaceFile::default());
    }
    let contents = fs.read(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| OrchestratorError::other(format!("malformed editor workspace file at {}: {e}", path.display())))
}

/// Write with tab indentation, atomically.
pub fn write(fs: &dyn FsDriver, path: &Path, file: &EditorWorkspaceFile) -> Result<(), OrchestratorError> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, serde_json::ser::PrettyFormatter::with_indent(b"\t"));
    file.serialize(&mut serializer)
        .map_err(|e| OrchestratorError::other(format!("failed to serialize editor workspace file: {e}")))?;
    let contents = String::from_utf8(buf).expect("serde_json always emits valid UTF-8");
    fs.atomic_write(path, &contents)
}

/// Append a folder if no existing entry already has the same path
/// (idempotent).
pub fn upsert_folder(file: &mut EditorWorkspaceFile, name: String, path: String) {
    if !file.folders.iter().any(|f| f.path == path) {
        file.folders.push(Folder { name, path });
    }
}

/// Remove every folder whose path matches `path` (the "Remove
/// repository from workspace" step 4.
pub fn remove_folder_by_path(file: &mut EditorWorkspaceFile, path: &str) {
    file.folders.retain(|f| f.path != path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_driver::RealFsDriver;

    #[test]
    fn per_branch_file_path_sanitizes_branch() {
        let path = per_branch_file_path(Path::new("/ws"), "team", "feature/foo");
        assert_eq!(path, PathBuf::from("/ws/team-feature-foo.code-workspace"));
    }

    #[test]
    fn extract_repository_name_takes_trailing_segment() {
        assert_eq!(extract_repository_name_from_url("github.com/o/r"), "r");
    }

    #[test]
    fn upsert_folder_is_idempotent() {
        let mut file = EditorWorkspaceFile::default();
        upsert_folder(&mut file, "r".to_string(), "/p".to_string());
        upsert_folder(&mut file, "r".to_string(), "/p".to_string());
        assert_eq!(file.folders.len(), 1);
    }

    #[test]
    fn remove_folder_by_path_filters_matching_entries() {
        let mut file = EditorWorkspaceFile {
            folders: vec![
                Folder { name: "a".to_string(), path: "/a".to_string() },
                Folder { name: "b".to_string(), path: "/b".to_string() },
            ],
        };
        remove_folder_by_path(&mut file, "/a");
        assert_eq!(file.folders, vec![Folder { name: "b".to_string(), path: "/b".to_string() }]);
    }

    #[test]
    fn read_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFsDriver::new();
        let result = read(&fs, &dir.path().join("missing.code-workspace")).unwrap();
        assert_eq!(result, EditorWorkspaceFile::default());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFsDriver::new();
        let path = dir.path().join("x.code-workspace");
        let mut file = EditorWorkspaceFile::default();
        upsert_folder(&mut file, "r".to_string(), "/p".to_string());
        write(&fs, &path, &file).unwrap();
        let read_back = read(&fs, &path).unwrap();
        assert_eq!(read_back, file);
    }
}

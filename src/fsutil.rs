// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Filesystem collaborator used by the directory navigator and downloader.

use std::io;
use std::path::{Path, PathBuf};

/// The filesystem operations the navigator needs.
pub trait Filesystem: Send + Sync {
    /// Names of the immediate subdirectories of `path`, in any order.
    fn list_directories(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Parent directory, or `None` at the root.
    fn parent_of(&self, path: &Path) -> Option<PathBuf>;

    fn join(&self, path: &Path, name: &str) -> PathBuf {
        path.join(name)
    }

    fn default_download_dir(&self) -> PathBuf;

    fn is_hidden(&self, name: &str) -> bool {
        name.starts_with('.')
    }
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn list_directories(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            // Follows symlinks so linked directories are navigable.
            let is_dir = std::fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn parent_of(&self, path: &Path) -> Option<PathBuf> {
        path.parent().map(Path::to_path_buf)
    }

    fn default_download_dir(&self) -> PathBuf {
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Free bytes on the volume holding `path`.
pub fn available_space(path: &Path) -> io::Result<u64> {
    fs2::available_space(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_directories_skips_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("music")).unwrap();
        std::fs::create_dir(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let mut names = LocalFs.list_directories(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec![".cache", "music"]);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(LocalFs.list_directories(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn test_parent_and_hidden() {
        assert_eq!(LocalFs.parent_of(Path::new("/a/b")), Some(PathBuf::from("/a")));
        assert_eq!(LocalFs.parent_of(Path::new("/")), None);
        assert!(LocalFs.is_hidden(".git"));
        assert!(!LocalFs.is_hidden("videos"));
        assert_eq!(LocalFs.join(Path::new("/a"), "b"), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_available_space_on_temp_dir() {
        let dir = TempDir::new().unwrap();
        assert!(available_space(dir.path()).is_ok());
    }
}

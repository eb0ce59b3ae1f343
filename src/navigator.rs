// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Directory navigator used to pick the download destination.
//!
//! The listing is synthetic: a "select here" entry first, then `..` unless
//! at the filesystem root, then the visible subdirectories sorted by name.
//! If a directory cannot be listed the navigator falls back to its parent
//! exactly once before giving up with a [`ErrorKind::FilesystemError`].
//!
//! [`ErrorKind::FilesystemError`]: crate::error::ErrorKind::FilesystemError

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ClassifiedError;
use crate::fsutil::Filesystem;

/// One row of the directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Choose the current directory as the destination
    SelectHere,
    /// Go to the parent directory
    Parent,
    /// A visible subdirectory
    Dir(String),
}

impl Entry {
    pub fn label(&self) -> String {
        match self {
            Entry::SelectHere => "[ Select this directory ]".to_string(),
            Entry::Parent => "..".to_string(),
            Entry::Dir(name) => format!("{}/", name),
        }
    }
}

/// What activating the entry under the cursor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The user chose this directory
    Selected(PathBuf),
    /// The listing moved to another directory
    Navigated,
}

pub struct DirectoryNavigator {
    fs: Arc<dyn Filesystem>,
    current: PathBuf,
    entries: Vec<Entry>,
    cursor: usize,
}

impl std::fmt::Debug for DirectoryNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNavigator")
            .field("current", &self.current)
            .field("entries", &self.entries)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl DirectoryNavigator {
    /// Open the navigator at `start`.
    pub fn open(fs: Arc<dyn Filesystem>, start: impl Into<PathBuf>) -> Result<Self, ClassifiedError> {
        let (current, entries) = load_with_fallback(fs.as_ref(), &start.into())?;
        Ok(Self {
            fs,
            current,
            entries,
            cursor: 0,
        })
    }

    /// Open the navigator at the filesystem's default download directory.
    pub fn open_default(fs: Arc<dyn Filesystem>) -> Result<Self, ClassifiedError> {
        let start = fs.default_download_dir();
        Self::open(fs, start)
    }

    pub fn current_path(&self) -> &Path {
        &self.current
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> &Entry {
        // entries always holds at least SelectHere
        &self.entries[self.cursor]
    }

    /// Move the cursor by `delta`, clamped to the listing.
    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.entries.len().saturating_sub(1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
    }

    /// Descend into the named subdirectory.
    pub fn enter(&mut self, name: &str) -> Result<(), ClassifiedError> {
        let target = self.fs.join(&self.current, name);
        self.navigate(&target)
    }

    /// Go to the parent directory. No-op at the root.
    pub fn up(&mut self) -> Result<(), ClassifiedError> {
        match self.fs.parent_of(&self.current) {
            Some(parent) => self.navigate(&parent),
            None => Ok(()),
        }
    }

    /// Activate the entry under the cursor.
    pub fn activate(&mut self) -> Result<Activation, ClassifiedError> {
        match self.selected().clone() {
            Entry::SelectHere => Ok(Activation::Selected(self.current.clone())),
            Entry::Parent => self.up().map(|_| Activation::Navigated),
            Entry::Dir(name) => self.enter(&name).map(|_| Activation::Navigated),
        }
    }

    fn navigate(&mut self, target: &Path) -> Result<(), ClassifiedError> {
        let (current, entries) = load_with_fallback(self.fs.as_ref(), target)?;
        self.current = current;
        self.entries = entries;
        self.cursor = 0;
        Ok(())
    }
}

/// Build the synthetic listing for `path`.
fn load(fs: &dyn Filesystem, path: &Path) -> std::io::Result<Vec<Entry>> {
    let mut names: Vec<String> = fs
        .list_directories(path)?
        .into_iter()
        .filter(|name| !fs.is_hidden(name))
        .collect();
    names.sort_by_key(|name| name.to_lowercase());

    let mut entries = Vec::with_capacity(names.len() + 2);
    entries.push(Entry::SelectHere);
    if fs.parent_of(path).is_some() {
        entries.push(Entry::Parent);
    }
    entries.extend(names.into_iter().map(Entry::Dir));
    Ok(entries)
}

fn load_with_fallback(fs: &dyn Filesystem, path: &Path) -> Result<(PathBuf, Vec<Entry>), ClassifiedError> {
    let first_err = match load(fs, path) {
        Ok(entries) => return Ok((path.to_path_buf(), entries)),
        Err(e) => e,
    };

    tracing::warn!(
        "DIR_LIST_FAILED | path={} error={} action=retry_parent",
        path.display(),
        first_err
    );

    let parent = fs.parent_of(path).ok_or_else(|| {
        ClassifiedError::filesystem(format!("cannot read {}: {}", path.display(), first_err))
    })?;

    load(fs, &parent)
        .map(|entries| (parent.clone(), entries))
        .map_err(|e| {
            let err = ClassifiedError::filesystem(format!(
                "cannot read {} or its parent {}: {}",
                path.display(),
                parent.display(),
                e
            ));
            tracing::error!("DIR_LIST_FAILED | path={} error={}", parent.display(), e);
            err
        })
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session state owned by the presentation thread.

use std::fmt;
use std::path::PathBuf;

use crate::download::DownloadProgress;
use crate::error::ClassifiedError;
use crate::types::{FormatDescriptor, VideoInfo};

/// Longest URL the input field accepts, in characters.
pub const MAX_URL_CHARS: usize = 256;

/// The screen the user is on. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Input,
    Loading,
    QualitySelect,
    DirectoryPick,
    Downloading,
    Complete,
    Error,
}

impl AppState {
    /// Whether quitting is allowed without cancelling first.
    pub fn can_quit(&self) -> bool {
        matches!(self, AppState::Input | AppState::Complete | AppState::Error)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppState::Input => "input",
            AppState::Loading => "loading",
            AppState::QualitySelect => "quality_select",
            AppState::DirectoryPick => "directory_pick",
            AppState::Downloading => "downloading",
            AppState::Complete => "complete",
            AppState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Data gathered across one pass through the workflow.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Text in the URL field
    pub url: String,
    pub video: Option<VideoInfo>,
    pub format: Option<FormatDescriptor>,
    pub destination: Option<PathBuf>,
    pub progress: Option<DownloadProgress>,
    /// Final file path once the transfer finished
    pub output_path: Option<PathBuf>,
    pub error: Option<ClassifiedError>,
}

impl Session {
    /// Reset for a new pass, keeping the allocation.
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    /// Append a character to the URL field, respecting [`MAX_URL_CHARS`].
    pub fn push_url_char(&mut self, c: char) -> bool {
        if c.is_control() || self.url.chars().count() >= MAX_URL_CHARS {
            return false;
        }
        self.url.push(c);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_states() {
        assert!(AppState::Input.can_quit());
        assert!(AppState::Complete.can_quit());
        assert!(AppState::Error.can_quit());
        assert!(!AppState::Loading.can_quit());
        assert!(!AppState::QualitySelect.can_quit());
        assert!(!AppState::DirectoryPick.can_quit());
        assert!(!AppState::Downloading.can_quit());
    }

    #[test]
    fn test_url_limit() {
        let mut session = Session::default();
        for _ in 0..MAX_URL_CHARS {
            assert!(session.push_url_char('a'));
        }
        assert!(!session.push_url_char('b'));
        assert_eq!(session.url.len(), MAX_URL_CHARS);
        assert!(!Session::default().push_url_char('\n'));
    }

    #[test]
    fn test_clear() {
        let mut session = Session {
            url: "x".to_string(),
            destination: Some(PathBuf::from("/tmp")),
            ..Session::default()
        };
        session.clear();
        assert!(session.url.is_empty());
        assert!(session.destination.is_none());
    }
}

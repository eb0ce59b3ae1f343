// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Canonical types used across tubegrab.
//!
//! This module provides the value types shared by the catalog, the
//! downloader and the state machine.

use std::sync::Arc;

use crate::catalog;
use crate::format::{format_duration_hms, format_views};
use crate::resolver::VideoManifest;

/// A selectable encoding/quality variant of the source media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Resolver-specific format id (itag / yt-dlp format_id)
    pub id: String,
    /// Display label ("720p", "Audio - High", ...)
    pub quality: String,
    /// "{width}x{height}" when known
    pub resolution: Option<String>,
    /// File extension / container ("mp4", "webm", "m4a", ...)
    pub container: String,
    /// Declared size in bytes
    pub byte_size: u64,
    pub has_video: bool,
    pub has_audio: bool,
    pub is_audio_only: bool,
}

impl FormatDescriptor {
    /// Whether the container is in the compatibility class sorted first.
    pub fn is_preferred_container(&self) -> bool {
        catalog::is_preferred_container(&self.container)
    }
}

/// Resolved video metadata. Set once per session and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_secs: u64,
    pub view_count: u64,
    /// Upload date as YYYY-MM-DD (empty when unknown)
    pub upload_date: String,
    /// Catalog output: filtered, labeled, ordered
    formats: Arc<[FormatDescriptor]>,
}

impl VideoInfo {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        duration_secs: u64,
        view_count: u64,
        upload_date: impl Into<String>,
        formats: Vec<FormatDescriptor>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            duration_secs,
            view_count,
            upload_date: upload_date.into(),
            formats: formats.into(),
        }
    }

    /// Run the raw manifest through the format catalog.
    pub fn from_manifest(manifest: VideoManifest) -> Self {
        let formats = catalog::build(&manifest.formats);
        Self::new(
            manifest.id,
            manifest.title,
            manifest.author,
            manifest.duration_secs,
            manifest.view_count,
            manifest.upload_date,
            formats,
        )
    }

    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    pub fn duration_display(&self) -> String {
        format_duration_hms(self.duration_secs)
    }

    pub fn views_display(&self) -> String {
        format_views(self.view_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RawFormat;

    #[test]
    fn test_from_manifest_applies_catalog() {
        let manifest = VideoManifest {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Song".to_string(),
            author: "Artist".to_string(),
            duration_secs: 213,
            view_count: 1_500_000,
            upload_date: "2009-10-25".to_string(),
            formats: vec![
                RawFormat::video("22", "video/mp4", 50_000_000, 1280, 720),
                RawFormat::video("18", "video/mp4", 0, 640, 360),
            ],
        };

        let info = VideoInfo::from_manifest(manifest);
        assert_eq!(info.formats().len(), 1);
        assert_eq!(info.formats()[0].quality, "720p");
        assert_eq!(info.duration_display(), "3:33");
        assert_eq!(info.views_display(), "1.5M");
    }
}

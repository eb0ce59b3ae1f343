// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metadata resolution and stream source lookup.
//!
//! The wire protocol used to talk to YouTube lives behind the
//! [`MetadataResolver`] trait. The shipped implementation,
//! [`YtDlpResolver`], shells out to `yt-dlp -J` for the manifest and fetches
//! the chosen stream over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use tubegrab::cancel::CancelSignal;
//! use tubegrab::resolver::{MetadataResolver, YtDlpResolver};
//!
//! let resolver = YtDlpResolver::new("yt-dlp");
//! let manifest = resolver.resolve("https://youtu.be/dQw4w9WgXcQ", &CancelSignal::new())?;
//! println!("{} has {} raw formats", manifest.title, manifest.formats.len());
//! # Ok::<(), tubegrab::error::ClassifiedError>(())
//! ```

pub mod url;
pub mod ytdlp;

use std::io::Read;

use crate::cancel::CancelSignal;
use crate::error::ClassifiedError;
use crate::types::FormatDescriptor;

pub use url::{extract_video_id, is_supported_url, URL_PATTERNS};
pub use ytdlp::YtDlpResolver;

/// A raw format descriptor as reported by the remote manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFormat {
    pub id: String,
    /// MIME type, e.g. "video/mp4" or "audio/webm"
    pub mime_type: String,
    /// Declared length in bytes; zero or negative when unknown
    pub content_length: i64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Bits per second
    pub bitrate: u64,
    pub audio_channels: u32,
}

impl RawFormat {
    /// A muxed video format (video + audio).
    pub fn video(id: &str, mime_type: &str, content_length: i64, width: u32, height: u32) -> Self {
        Self {
            id: id.to_string(),
            mime_type: mime_type.to_string(),
            content_length,
            width: Some(width),
            height: Some(height),
            bitrate: 0,
            audio_channels: 2,
        }
    }

    /// An audio-only format.
    pub fn audio(id: &str, mime_type: &str, content_length: i64, bitrate: u64) -> Self {
        Self {
            id: id.to_string(),
            mime_type: mime_type.to_string(),
            content_length,
            width: None,
            height: None,
            bitrate,
            audio_channels: 2,
        }
    }

    pub fn has_video(&self) -> bool {
        self.mime_type.contains("video")
    }

    pub fn is_audio_only(&self) -> bool {
        self.mime_type.contains("audio")
    }

    pub fn has_audio(&self) -> bool {
        self.audio_channels > 0
    }
}

/// Video metadata plus the unfiltered format list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoManifest {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_secs: u64,
    pub view_count: u64,
    pub upload_date: String,
    pub formats: Vec<RawFormat>,
}

/// A readable byte source for one chosen format.
pub struct ByteSource {
    pub reader: Box<dyn Read + Send>,
    /// Declared total length, if the source reported one
    pub total_len: Option<u64>,
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("total_len", &self.total_len)
            .finish_non_exhaustive()
    }
}

/// Resolves a link into metadata and a chosen format into bytes.
///
/// Both calls block; the dispatcher runs them off the presentation thread.
/// Implementations should poll `cancel` while waiting on slow work and return
/// [`ClassifiedError::cancelled`] once it is raised.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, url: &str, cancel: &CancelSignal) -> Result<VideoManifest, ClassifiedError>;

    fn open_stream(
        &self,
        video_id: &str,
        format: &FormatDescriptor,
        cancel: &CancelSignal,
    ) -> Result<ByteSource, ClassifiedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags_follow_mime() {
        let video = RawFormat::video("22", "video/mp4", 10, 1280, 720);
        assert!(video.has_video());
        assert!(!video.is_audio_only());
        assert!(video.has_audio());

        let audio = RawFormat::audio("140", "audio/mp4", 10, 128_000);
        assert!(!audio.has_video());
        assert!(audio.is_audio_only());

        let storyboard = RawFormat {
            mime_type: "application/mhtml".to_string(),
            audio_channels: 0,
            ..RawFormat::audio("sb0", "", 10, 0)
        };
        assert!(!storyboard.has_video());
        assert!(!storyboard.is_audio_only());
        assert!(!storyboard.has_audio());
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Format catalog: turns the raw manifest formats into the list the user
//! picks from.
//!
//! Three passes, in order:
//! 1. **Filter** - drop formats with no declared length, keep only formats
//!    that carry video or are audio-only.
//! 2. **Label** - `"{height}p"` for video, bitrate tiers for audio-only.
//! 3. **Order** - stable partition with the mp4/m4a containers first.

use crate::format::format_bytes;
use crate::resolver::RawFormat;
use crate::types::FormatDescriptor;

/// Containers that play nearly everywhere; listed first.
pub const PREFERRED_CONTAINERS: [&str; 2] = ["mp4", "m4a"];

const AUDIO_HIGH_BPS: u64 = 128_000;
const AUDIO_MEDIUM_BPS: u64 = 96_000;

pub fn is_preferred_container(container: &str) -> bool {
    PREFERRED_CONTAINERS.contains(&container)
}

/// Derive the output container from a MIME type.
pub fn container_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();

    if mime.contains("audio") {
        return if mime.contains("webm") { "webm" } else { "m4a" };
    }
    if mime.contains("mp4") {
        "mp4"
    } else if mime.contains("webm") {
        "webm"
    } else if mime.contains("3gpp") {
        "3gp"
    } else {
        "mp4"
    }
}

/// Quality label for a raw format.
pub fn quality_label(raw: &RawFormat) -> String {
    match raw.height {
        Some(height) if height > 0 => format!("{}p", height),
        _ if raw.bitrate >= AUDIO_HIGH_BPS => "Audio - High".to_string(),
        _ if raw.bitrate >= AUDIO_MEDIUM_BPS => "Audio - Medium".to_string(),
        _ => "Audio - Low".to_string(),
    }
}

fn describe(raw: &RawFormat) -> FormatDescriptor {
    let resolution = match (raw.width, raw.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(format!("{}x{}", w, h)),
        _ => None,
    };

    FormatDescriptor {
        id: raw.id.clone(),
        quality: quality_label(raw),
        resolution,
        container: container_for_mime(&raw.mime_type).to_string(),
        byte_size: raw.content_length.max(0) as u64,
        has_video: raw.has_video(),
        has_audio: raw.has_audio(),
        is_audio_only: raw.is_audio_only(),
    }
}

/// Filter, label and order raw formats.
pub fn build(raw: &[RawFormat]) -> Vec<FormatDescriptor> {
    let kept: Vec<FormatDescriptor> = raw
        .iter()
        .filter(|f| f.content_length > 0)
        .filter(|f| f.has_video() || f.is_audio_only())
        .map(describe)
        .collect();

    let dropped = raw.len() - kept.len();
    if dropped > 0 {
        tracing::debug!("CATALOG_FILTERED | kept={} dropped={}", kept.len(), dropped);
    }

    stable_partition(kept, FormatDescriptor::is_preferred_container)
}

/// Elements satisfying `pred` first, each group in its original order.
pub fn stable_partition<T>(items: Vec<T>, pred: impl Fn(&T) -> bool) -> Vec<T> {
    let (mut first, rest): (Vec<T>, Vec<T>) = items.into_iter().partition(|item| pred(item));
    first.extend(rest);
    first
}

// ============================================================================
// List items
// ============================================================================

/// One row of the quality list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Text matched when filtering (the quality label)
    pub filter_key: String,
    pub title: String,
    pub subtitle: String,
}

impl From<&FormatDescriptor> for ListItem {
    fn from(format: &FormatDescriptor) -> Self {
        let kind = if format.is_audio_only { "♪" } else { "▶" };
        let size = format_bytes(format.byte_size);

        let subtitle = match (&format.resolution, format.is_audio_only) {
            (Some(resolution), false) => format!("{} - {} - {}", resolution, format.container, size),
            _ => format!("{} - {}", format.container, size),
        };

        Self {
            filter_key: format.quality.clone(),
            title: format!("{} {}", kind, format.quality),
            subtitle,
        }
    }
}

pub fn list_items(formats: &[FormatDescriptor]) -> Vec<ListItem> {
    formats.iter().map(ListItem::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webm_video(id: &str, len: i64, height: u32) -> RawFormat {
        RawFormat::video(id, "video/webm", len, height * 16 / 9, height)
    }

    #[test]
    fn test_two_format_catalog() {
        let raw = vec![
            RawFormat::video("22", "video/mp4", 50_000_000, 1280, 720),
            RawFormat::audio("251", "audio/webm", 5_000_000, 160_000),
        ];

        let formats = build(&raw);
        let labels: Vec<&str> = formats.iter().map(|f| f.quality.as_str()).collect();
        assert_eq!(labels, vec!["720p", "Audio - High"]);
        assert!(formats[0].is_preferred_container());
        assert_eq!(formats[0].resolution.as_deref(), Some("1280x720"));
        assert_eq!(formats[1].container, "webm");
    }

    #[test]
    fn test_drops_non_positive_lengths() {
        let raw = vec![
            RawFormat::video("a", "video/mp4", 0, 640, 360),
            RawFormat::video("b", "video/mp4", -1, 640, 360),
            RawFormat::video("c", "video/mp4", 1, 640, 360),
            RawFormat::audio("d", "audio/mp4", -5, 128_000),
        ];

        let formats = build(&raw);
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].id, "c");
        assert!(formats.iter().all(|f| f.byte_size > 0));
    }

    #[test]
    fn test_drops_formats_without_media() {
        let storyboard = RawFormat {
            mime_type: "application/mhtml".to_string(),
            ..RawFormat::audio("sb0", "", 100, 0)
        };
        assert!(build(&[storyboard]).is_empty());
    }

    #[test]
    fn test_audio_tiers() {
        let tier = |bps| quality_label(&RawFormat::audio("x", "audio/mp4", 1, bps));
        assert_eq!(tier(160_000), "Audio - High");
        assert_eq!(tier(128_000), "Audio - High");
        assert_eq!(tier(127_999), "Audio - Medium");
        assert_eq!(tier(96_000), "Audio - Medium");
        assert_eq!(tier(48_000), "Audio - Low");
    }

    #[test]
    fn test_ordering_is_stable_partition() {
        let raw = vec![
            webm_video("w1", 10, 1080),
            RawFormat::video("m1", "video/mp4", 10, 1920, 1080),
            webm_video("w2", 10, 720),
            RawFormat::audio("a1", "audio/m4a", 10, 128_000),
            RawFormat::video("m2", "video/mp4", 10, 1280, 720),
            webm_video("w3", 10, 360),
        ];

        let ids: Vec<String> = build(&raw).into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["m1", "a1", "m2", "w1", "w2", "w3"]);
    }

    #[test]
    fn test_stable_partition_generic() {
        let out = stable_partition(vec![1, 2, 3, 4, 5, 6], |n| n % 2 == 0);
        assert_eq!(out, vec![2, 4, 6, 1, 3, 5]);
        assert!(stable_partition(Vec::<u8>::new(), |_| true).is_empty());
    }

    #[test]
    fn test_container_for_mime() {
        assert_eq!(container_for_mime("video/mp4; codecs=\"avc1.42001E\""), "mp4");
        assert_eq!(container_for_mime("video/webm; codecs=\"vp9\""), "webm");
        assert_eq!(container_for_mime("video/3gpp"), "3gp");
        assert_eq!(container_for_mime("audio/mp4"), "m4a");
        assert_eq!(container_for_mime("audio/m4a"), "m4a");
        assert_eq!(container_for_mime("audio/ogg"), "m4a");
        assert_eq!(container_for_mime("audio/webm"), "webm");
        assert_eq!(container_for_mime("application/octet-stream"), "mp4");
    }

    #[test]
    fn test_list_items() {
        let formats = build(&[
            RawFormat::video("22", "video/mp4", 1536, 1280, 720),
            RawFormat::audio("140", "audio/mp4", 2048, 128_000),
        ]);
        let items = list_items(&formats);

        assert_eq!(items[0].filter_key, "720p");
        assert_eq!(items[0].title, "▶ 720p");
        assert_eq!(items[0].subtitle, "1280x720 - mp4 - 1.50 KB");
        assert_eq!(items[1].title, "♪ Audio - High");
        assert_eq!(items[1].subtitle, "m4a - 2.00 KB");
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Recognising YouTube links and extracting the video id.

use regex::Regex;
use std::sync::LazyLock;

/// Substrings that mark a link as a YouTube video link (matched case-insensitively).
pub const URL_PATTERNS: [&str; 4] = [
    "youtube.com/watch",
    "youtu.be/",
    "youtube.com/v/",
    "youtube.com/embed/",
];

/// A bare video id: exactly 11 characters of the URL-safe base64 alphabet.
static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

/// Whether the input looks like a supported video link.
pub fn is_supported_url(input: &str) -> bool {
    let lower = input.to_lowercase();
    URL_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Extract the video id from a link or a bare id.
///
/// Accepts `.../watch?v=ID`, `youtu.be/ID`, `.../v/ID`, `.../embed/ID` and a
/// bare 11-character id. Returns `None` for anything else.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    // ASCII lowering keeps byte offsets valid for slicing `input`.
    let lower = input.to_ascii_lowercase();

    if let Some(pos) = lower.find("youtube.com/watch") {
        let rest = &input[pos + "youtube.com/watch".len()..];
        let query = rest.split_once('?').map(|(_, q)| q)?;
        let id = query
            .split(|c: char| c == '&' || c == '#')
            .find_map(|param| param.strip_prefix("v="))?;
        return non_empty(id);
    }

    for marker in ["youtu.be/", "youtube.com/v/", "youtube.com/embed/"] {
        if let Some(pos) = lower.find(marker) {
            let rest = &input[pos + marker.len()..];
            let id = rest
                .split(|c: char| c == '?' || c == '&' || c == '#' || c == '/')
                .next()
                .unwrap_or_default();
            return non_empty(id);
        }
    }

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    None
}

fn non_empty(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_supported_url_patterns() {
        assert!(is_supported_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_supported_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_supported_url("https://www.youtube.com/v/dQw4w9WgXcQ"));
        assert!(is_supported_url("https://www.youtube.com/embed/dQw4w9WgXcQ"));
        assert!(is_supported_url("HTTPS://WWW.YOUTUBE.COM/WATCH?V=X"));
        assert!(!is_supported_url("https://vimeo.com/12345"));
        assert!(!is_supported_url(""));
    }

    #[test]
    fn test_extract_watch_url() {
        let url = format!("https://www.youtube.com/watch?v={}", ID);
        assert_eq!(extract_video_id(&url).as_deref(), Some(ID));

        let with_params = format!("https://www.youtube.com/watch?v={}&t=42s", ID);
        assert_eq!(extract_video_id(&with_params).as_deref(), Some(ID));

        let v_not_first = format!("https://youtube.com/watch?feature=share&v={}", ID);
        assert_eq!(extract_video_id(&v_not_first).as_deref(), Some(ID));
    }

    #[test]
    fn test_extract_short_v_and_embed_urls() {
        for url in [
            format!("https://youtu.be/{}", ID),
            format!("https://youtu.be/{}?si=abc", ID),
            format!("https://www.youtube.com/v/{}", ID),
            format!("https://www.youtube.com/embed/{}?autoplay=1", ID),
        ] {
            assert_eq!(extract_video_id(&url).as_deref(), Some(ID), "url: {}", url);
        }
    }

    #[test]
    fn test_extract_bare_id() {
        assert_eq!(extract_video_id(ID).as_deref(), Some(ID));
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  ").as_deref(), Some(ID));
    }

    #[test]
    fn test_extract_rejects_everything_else() {
        for input in [
            "",
            "not a url",
            "https://vimeo.com/12345",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?list=abc",
            "https://youtu.be/",
            "dQw4w9WgXc",
            "dQw4w9WgXcQQ",
            "hello world",
        ] {
            assert_eq!(extract_video_id(input), None, "input: {:?}", input);
        }
    }
}

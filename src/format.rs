// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Human-readable formatting for sizes, speeds, durations and counts.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// Format a byte count ("1.50 MB").
pub fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= TB {
        format!("{:.2} TB", b / TB)
    } else if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a transfer rate in bytes per second.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= GB {
        format!("{:.2} GB/s", bytes_per_sec / GB)
    } else if bytes_per_sec >= MB {
        format!("{:.2} MB/s", bytes_per_sec / MB)
    } else if bytes_per_sec >= KB {
        format!("{:.2} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}

/// Format a remaining time ("1h 2m 3s", "4m 5s", "6s").
pub fn format_eta(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a video length as H:MM:SS or M:SS.
pub fn format_duration_hms(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Compact view count ("1.2K", "3.4M", "1.0B").
pub fn format_views(views: u64) -> String {
    let v = views as f64;
    if views >= 1_000_000_000 {
        format!("{:.1}B", v / 1_000_000_000.0)
    } else if views >= 1_000_000 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        views.to_string()
    }
}

/// Truncate to a display width, appending "..." when cut.
pub fn truncate_display(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let budget = max_width - 3;
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(50_000_000), "47.68 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(2048.0), "2.00 KB/s");
        assert_eq!(format_speed(5.0 * 1024.0 * 1024.0), "5.00 MB/s");
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(5), "5s");
        assert_eq!(format_eta(65), "1m 5s");
        assert_eq!(format_eta(3725), "1h 2m 5s");
    }

    #[test]
    fn test_format_duration_hms() {
        assert_eq!(format_duration_hms(59), "0:59");
        assert_eq!(format_duration_hms(213), "3:33");
        assert_eq!(format_duration_hms(3661), "1:01:01");
    }

    #[test]
    fn test_format_views() {
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(1_200), "1.2K");
        assert_eq!(format_views(3_400_000), "3.4M");
        assert_eq!(format_views(1_000_000_000), "1.0B");
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("a long title here", 10), "a long ...");
        assert_eq!(truncate_display("abcdef", 2), "..");
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Progress types for the streaming downloader.

use chrono::{DateTime, Utc};

use crate::format::{format_bytes, format_eta, format_speed};

/// A progress sample for one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Bytes written so far; never decreases and never exceeds `total_bytes`
    pub bytes_downloaded: u64,
    /// Declared (or final) total size in bytes
    pub total_bytes: u64,
    /// 0.0 - 100.0
    pub percentage: f64,
    /// Average transfer rate since start, bytes per second
    pub speed_bps: f64,
    /// Estimated time remaining; `None` while speed is zero
    pub eta_secs: Option<u64>,
    /// When the transfer started
    pub started_at: DateTime<Utc>,
}

impl DownloadProgress {
    /// Sample with speed = bytes / elapsed and ETA = remaining / speed.
    pub fn sample(bytes_downloaded: u64, total_bytes: u64, elapsed_secs: f64, started_at: DateTime<Utc>) -> Self {
        let bytes_downloaded = bytes_downloaded.min(total_bytes);
        let percentage = if total_bytes == 0 {
            0.0
        } else {
            bytes_downloaded as f64 / total_bytes as f64 * 100.0
        };
        let speed_bps = if elapsed_secs > 0.0 {
            bytes_downloaded as f64 / elapsed_secs
        } else {
            0.0
        };
        let eta_secs = if speed_bps > 0.0 {
            Some(((total_bytes - bytes_downloaded) as f64 / speed_bps).round() as u64)
        } else {
            None
        };

        Self {
            bytes_downloaded,
            total_bytes,
            percentage,
            speed_bps,
            eta_secs,
            started_at,
        }
    }

    /// Initial zero sample.
    pub fn starting(total_bytes: u64) -> Self {
        Self::sample(0, total_bytes, 0.0, Utc::now())
    }

    pub fn is_finished(&self) -> bool {
        self.total_bytes > 0 && self.bytes_downloaded >= self.total_bytes
    }

    /// Get formatted speed string.
    pub fn speed_string(&self) -> String {
        format_speed(self.speed_bps)
    }

    /// Get formatted ETA string.
    pub fn eta_string(&self) -> Option<String> {
        self.eta_secs.map(format_eta)
    }

    /// "12.00 MB / 48.00 MB"
    pub fn bytes_string(&self) -> String {
        format!(
            "{} / {}",
            format_bytes(self.bytes_downloaded),
            format_bytes(self.total_bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_math() {
        let p = DownloadProgress::sample(40, 100, 2.0, Utc::now());
        assert_eq!(p.percentage, 40.0);
        assert_eq!(p.speed_bps, 20.0);
        assert_eq!(p.eta_secs, Some(3));
        assert!(!p.is_finished());
    }

    #[test]
    fn test_eta_undefined_at_zero_speed() {
        let p = DownloadProgress::sample(0, 100, 5.0, Utc::now());
        assert_eq!(p.speed_bps, 0.0);
        assert_eq!(p.eta_secs, None);
        assert_eq!(p.eta_string(), None);

        let start = DownloadProgress::starting(100);
        assert_eq!(start.eta_secs, None);
    }

    #[test]
    fn test_bytes_clamped_to_total() {
        let p = DownloadProgress::sample(150, 100, 1.0, Utc::now());
        assert_eq!(p.bytes_downloaded, 100);
        assert_eq!(p.percentage, 100.0);
        assert_eq!(p.eta_secs, Some(0));
        assert!(p.is_finished());
    }

    #[test]
    fn test_display_strings() {
        let p = DownloadProgress::sample(1024 * 1024, 4 * 1024 * 1024, 1.0, Utc::now());
        assert_eq!(p.bytes_string(), "1.00 MB / 4.00 MB");
        assert_eq!(p.speed_string(), "1.00 MB/s");
        assert_eq!(p.eta_string().as_deref(), Some("3s"));
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Optional configuration file at `~/.tubegrab/config.json`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! A file that is not valid JSON is a startup error.
//!
//! ```json
//! {
//!   "download_dir": "/home/me/Videos",
//!   "chunk_size": 65536,
//!   "progress_interval_ms": 250,
//!   "yt_dlp_path": "/usr/local/bin/yt-dlp",
//!   "log_file": "/tmp/tubegrab.log",
//!   "log_level": "debug"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::download::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL};

/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Smallest accepted progress interval.
pub const MIN_PROGRESS_INTERVAL_MS: u64 = 10;

/// Environment variable naming a log file; overrides `log_file`.
pub const LOG_ENV_VAR: &str = "TUBEGRAB_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Initial directory for the destination picker
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Bytes read per chunk (default: 32 KiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Minimum gap between progress updates (default: 100 ms)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// yt-dlp executable name or path (default: "yt-dlp")
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,
    /// Write logs here; logging is off when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// tracing level filter (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_progress_interval_ms() -> u64 {
    DEFAULT_PROGRESS_INTERVAL.as_millis() as u64
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: None,
            chunk_size: default_chunk_size(),
            progress_interval_ms: default_progress_interval_ms(),
            yt_dlp_path: default_yt_dlp_path(),
            log_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// `~/.tubegrab/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tubegrab").join("config.json"))
    }

    /// Load from the default location.
    pub fn load() -> Result<(Self, Vec<String>)> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// Returns the config plus warnings for values that were clamped.
    pub fn load_from(path: &Path) -> Result<(Self, Vec<String>)> {
        let config: Config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Config::default()
        };
        Ok(config.validated())
    }

    /// Clamp out-of-range values, reporting what changed.
    pub fn validated(mut self) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        if self.chunk_size < MIN_CHUNK_SIZE {
            warnings.push(format!(
                "chunk_size {} is below the minimum of {}. Using {}.",
                self.chunk_size, MIN_CHUNK_SIZE, MIN_CHUNK_SIZE
            ));
            self.chunk_size = MIN_CHUNK_SIZE;
        }

        if self.progress_interval_ms < MIN_PROGRESS_INTERVAL_MS {
            warnings.push(format!(
                "progress_interval_ms {} is below the minimum of {}. Using {}.",
                self.progress_interval_ms, MIN_PROGRESS_INTERVAL_MS, MIN_PROGRESS_INTERVAL_MS
            ));
            self.progress_interval_ms = MIN_PROGRESS_INTERVAL_MS;
        }

        let home = dirs::home_dir();
        self.download_dir = self
            .download_dir
            .map(|dir| expand_home(&dir, home.as_deref()));
        self.log_file = self.log_file.map(|file| expand_home(&file, home.as_deref()));

        if self.yt_dlp_path.trim().is_empty() {
            warnings.push("yt_dlp_path is empty. Using \"yt-dlp\".".to_string());
            self.yt_dlp_path = default_yt_dlp_path();
        }

        (self, warnings)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Log destination: `TUBEGRAB_LOG` wins over `log_file`.
    pub fn log_destination(&self) -> Option<PathBuf> {
        std::env::var_os(LOG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.log_file.clone())
    }
}

/// Replace a leading `~` component with `home`. `~user` forms are left alone.
fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

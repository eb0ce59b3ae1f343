// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Streaming download of a single chosen format.
//!
//! ```text
//! ┌────────────────────┐ open_stream ┌──────────────────┐
//! │ StreamingDownloader│────────────▶│ MetadataResolver │
//! └─────────┬──────────┘             └──────────────────┘
//!           │ copy_with_progress (32 KiB chunks)
//!           ▼
//! ┌────────────────────┐   samples   ┌──────────────────┐
//! │ destination file   │   ───────▶  │ progress sink    │
//! └────────────────────┘             └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tubegrab::cancel::CancelSignal;
//! use tubegrab::download::{DownloadJob, StreamingDownloader};
//! use tubegrab::resolver::YtDlpResolver;
//!
//! # fn example(job: DownloadJob) -> Result<(), tubegrab::error::ClassifiedError> {
//! let downloader = StreamingDownloader::new(Arc::new(YtDlpResolver::new("yt-dlp")));
//! let path = downloader.download(&job, |p| println!("{:.0}%", p.percentage), &CancelSignal::new())?;
//! println!("saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod downloader;
pub mod types;

pub use downloader::{
    copy_with_progress, sanitize_filename, DownloadJob, StreamingDownloader, DEFAULT_CHUNK_SIZE,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use types::DownloadProgress;

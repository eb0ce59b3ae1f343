// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! tubegrab - terminal YouTube downloader library
//!
//! Paste a link, pick a quality, pick a folder, watch the progress bar.
//!
//! The presentation loop is single-threaded and never blocks: metadata
//! lookups and transfers run as background tasks whose results come back
//! through one ordered inbox.
//!
//! **Input** -> **Loading** -> **QualitySelect** -> **DirectoryPick** ->
//! **Downloading** -> **Complete** (or **Error**)
//!
//! # Core Modules
//!
//! - [`app`] - Presentation state machine, session, key handling
//! - [`dispatcher`] - Background tasks and the messages they send back
//! - [`download`] - Chunked streaming transfer with progress sampling
//! - [`catalog`] - Filtering, labelling and ordering of formats
//! - [`navigator`] - Destination directory picker
//! - [`resolver`] - URL parsing and yt-dlp based metadata/stream lookup
//! - [`runtime`] - Terminal setup and the event loop
//! - [`ui`] - Theme and screen rendering
//! - [`error`] - Error taxonomy and explanations

pub mod app;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod download;
pub mod error;
pub mod format;
pub mod fsutil;
pub mod navigator;
pub mod resolver;
pub mod runtime;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use app::{App, AppState, DispatchRequest, Event, Key, Transition};
pub use cancel::CancelSignal;
pub use config::Config;
pub use dispatcher::{Command, Dispatcher, Message, TaskHandle, TaskId};
pub use download::{DownloadJob, DownloadProgress, StreamingDownloader};
pub use error::{ClassifiedError, ErrorKind, MetadataFailure};
pub use resolver::{extract_video_id, is_supported_url, MetadataResolver, YtDlpResolver};
pub use types::{FormatDescriptor, VideoInfo};

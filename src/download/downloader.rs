// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chunked streaming transfer with throttled progress sampling.

use std::fs::File;
use std::io::{BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::types::DownloadProgress;
use crate::cancel::CancelSignal;
use crate::error::ClassifiedError;
use crate::fsutil;
use crate::resolver::MetadataResolver;
use crate::types::FormatDescriptor;

/// Default read size per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Default minimum gap between progress samples.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Longest file stem produced by [`sanitize_filename`], in characters.
pub const MAX_FILENAME_CHARS: usize = 200;

const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a video title into a safe file stem.
///
/// Directory components are stripped first, then every forbidden character
/// is replaced with `_`, then the result is cut to [`MAX_FILENAME_CHARS`].
pub fn sanitize_filename(title: &str) -> String {
    let base = title.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "video".to_string(),
        _ => cleaned,
    }
}

/// What to download and where.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub video_id: String,
    pub title: String,
    pub format: FormatDescriptor,
    pub destination: PathBuf,
}

impl DownloadJob {
    /// `destination / sanitize(title) . container`
    pub fn output_path(&self) -> PathBuf {
        self.destination
            .join(format!("{}.{}", sanitize_filename(&self.title), self.format.container))
    }
}

/// Copy `reader` into `writer` in `chunk_size` pieces.
///
/// Samples go to `sink` at most once per `interval`, plus once when the byte
/// count first reaches `total` and once at EOF. The EOF sample reports
/// `total = bytes written`. Cancellation is checked after every chunk.
pub fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    total: u64,
    chunk_size: usize,
    interval: Duration,
    mut sink: F,
    cancel: &CancelSignal,
) -> Result<u64, ClassifiedError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(DownloadProgress),
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut written: u64 = 0;
    let started = Instant::now();
    let started_at = Utc::now();
    let mut last_sample = started;
    let mut reached_total = false;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(ClassifiedError::transfer(format!("read failed: {}", e))),
        };

        writer
            .write_all(&buffer[..n])
            .map_err(|e| ClassifiedError::transfer(format!("write failed: {}", e)))?;
        written += n as u64;

        if cancel.is_raised() {
            return Err(ClassifiedError::cancelled());
        }

        let now = Instant::now();
        let hit_total = !reached_total && total > 0 && written >= total;
        if hit_total || now.duration_since(last_sample) >= interval {
            // Hold back 100% until the writer is flushed.
            if hit_total {
                writer
                    .flush()
                    .map_err(|e| ClassifiedError::transfer(format!("flush failed: {}", e)))?;
                reached_total = true;
            }
            let elapsed = now.duration_since(started).as_secs_f64();
            sink(DownloadProgress::sample(written, total, elapsed, started_at));
            last_sample = now;
        }
    }

    writer
        .flush()
        .map_err(|e| ClassifiedError::transfer(format!("flush failed: {}", e)))?;

    let elapsed = started.elapsed().as_secs_f64();
    sink(DownloadProgress::sample(written, written, elapsed, started_at));
    Ok(written)
}

/// Fetches one format of one video to disk.
pub struct StreamingDownloader {
    resolver: Arc<dyn MetadataResolver>,
    chunk_size: usize,
    progress_interval: Duration,
}

impl StreamingDownloader {
    pub fn new(resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            resolver,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Run the transfer, returning the final file path.
    ///
    /// Partial output is left on disk on failure or cancellation.
    pub fn download<F>(&self, job: &DownloadJob, sink: F, cancel: &CancelSignal) -> Result<PathBuf, ClassifiedError>
    where
        F: FnMut(DownloadProgress),
    {
        let mut source = self.resolver.open_stream(&job.video_id, &job.format, cancel)?;
        let total = source
            .total_len
            .filter(|len| *len > 0)
            .unwrap_or(job.format.byte_size);

        ensure_free_space(&job.destination, total)?;

        let path = job.output_path();
        let file = File::create(&path).map_err(|e| {
            ClassifiedError::filesystem(format!("cannot create {}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);

        tracing::info!(
            "DOWNLOAD_START | video={} format={} total={} path={}",
            job.video_id,
            job.format.id,
            total,
            path.display()
        );

        let result = copy_with_progress(
            &mut source.reader,
            &mut writer,
            total,
            self.chunk_size,
            self.progress_interval,
            sink,
            cancel,
        );

        match result {
            Ok(bytes) => {
                tracing::info!("DOWNLOAD_COMPLETE | video={} bytes={} path={}", job.video_id, bytes, path.display());
                Ok(path)
            }
            Err(err) => {
                if err.is_cancelled() {
                    tracing::info!("DOWNLOAD_CANCELLED | video={} path={}", job.video_id, path.display());
                } else {
                    tracing::error!("DOWNLOAD_FAILED | video={} error={}", job.video_id, err);
                }
                Err(err)
            }
        }
    }
}

/// Fail early when the destination volume is known to be too small.
fn ensure_free_space(dir: &Path, needed: u64) -> Result<(), ClassifiedError> {
    match fsutil::available_space(dir) {
        Ok(free) if free < needed => Err(ClassifiedError::filesystem(format!(
            "not enough disk space in {}: need {}, {} free",
            dir.display(),
            crate::format::format_bytes(needed),
            crate::format::format_bytes(free)
        ))),
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!("FREE_SPACE_UNKNOWN | path={} error={}", dir.display(), e);
            Ok(())
        }
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `yt-dlp` backed resolver.
//!
//! Metadata comes from `yt-dlp -J` (a single JSON document per video). The
//! chosen stream is fetched directly over HTTP with the headers yt-dlp
//! reports for that format.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{extract_video_id, ByteSource, MetadataResolver, RawFormat, VideoManifest};
use crate::cancel::CancelSignal;
use crate::error::{ClassifiedError, MetadataFailure};
use crate::types::FormatDescriptor;

/// Canonical watch URL handed to yt-dlp.
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// How often the child process is polled for exit / cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Connect timeout for the stream request. There is no overall deadline.
const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Top-level `yt-dlp -J` document (only the fields we use).
#[derive(Debug, Deserialize)]
struct YtDlpVideo {
    id: String,
    #[serde(default)]
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    ext: Option<String>,
    url: Option<String>,
    protocol: Option<String>,
    filesize: Option<i64>,
    filesize_approx: Option<i64>,
    width: Option<u32>,
    height: Option<u32>,
    /// Total bitrate in kbit/s
    tbr: Option<f64>,
    /// Audio bitrate in kbit/s
    abr: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    audio_channels: Option<u32>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// `Some(false)` for the literal codec "none", `None` when unreported.
fn codec_present(codec: &Option<String>) -> Option<bool> {
    codec.as_deref().map(|c| c != "none")
}

impl YtDlpFormat {
    fn mime_type(&self) -> String {
        let ext = self.ext.as_deref().unwrap_or("mp4");
        match (codec_present(&self.vcodec), codec_present(&self.acodec)) {
            (Some(true), _) => format!("video/{}", ext),
            (Some(false), Some(true)) => format!("audio/{}", ext),
            (Some(false), _) => format!("application/{}", ext),
            (None, Some(true)) if self.height.is_none() => format!("audio/{}", ext),
            (None, _) => format!("video/{}", ext),
        }
    }

    /// Only plain HTTP(S) formats can be streamed directly; manifests
    /// (m3u8, dash) are reported with an unknown length so the catalog drops them.
    fn content_length(&self) -> i64 {
        let direct = self
            .protocol
            .as_deref()
            .map(|p| p == "https" || p == "http")
            .unwrap_or(true);
        if !direct {
            return -1;
        }
        self.filesize.or(self.filesize_approx).unwrap_or(0)
    }

    fn to_raw(&self) -> RawFormat {
        let kbps = self.abr.or(self.tbr).unwrap_or(0.0);
        let audio_channels = self
            .audio_channels
            .unwrap_or(if codec_present(&self.acodec) == Some(true) { 2 } else { 0 });

        RawFormat {
            id: self.format_id.clone(),
            mime_type: self.mime_type(),
            content_length: self.content_length(),
            width: self.width,
            height: self.height,
            bitrate: (kbps.max(0.0) * 1000.0) as u64,
            audio_channels,
        }
    }
}

impl YtDlpVideo {
    fn to_manifest(&self) -> VideoManifest {
        let upload_date = self
            .upload_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        VideoManifest {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self
                .uploader
                .clone()
                .or_else(|| self.channel.clone())
                .unwrap_or_default(),
            duration_secs: self.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
            view_count: self.view_count.unwrap_or(0),
            upload_date,
            formats: self.formats.iter().map(YtDlpFormat::to_raw).collect(),
        }
    }
}

/// Parse a `yt-dlp -J` document into a manifest.
pub fn parse_manifest(json: &str) -> Result<VideoManifest, ClassifiedError> {
    parse_document(json).map(|video| video.to_manifest())
}

fn parse_document(json: &str) -> Result<YtDlpVideo, ClassifiedError> {
    serde_json::from_str(json).map_err(|e| {
        ClassifiedError::metadata(
            MetadataFailure::Generic,
            format!("unexpected yt-dlp output: {}", e),
        )
    })
}

/// Map yt-dlp's stderr to a metadata failure kind.
pub fn classify_failure(stderr: &str) -> ClassifiedError {
    let detail = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp exited with an error")
        .to_string();
    let lower = stderr.to_lowercase();

    let failure = if lower.contains("confirm your age")
        || lower.contains("age-restricted")
        || lower.contains("sign in")
        || lower.contains("login required")
        || lower.contains("members-only")
        || lower.contains("http error 403")
        || lower.contains("http error 400")
    {
        MetadataFailure::AuthOrAgeRestricted
    } else if lower.contains("private video")
        || lower.contains("video unavailable")
        || lower.contains("not available")
        || lower.contains("does not exist")
        || lower.contains("http error 404")
    {
        MetadataFailure::NotFound
    } else {
        MetadataFailure::Generic
    };

    ClassifiedError::metadata(failure, detail)
}

/// Resolver that drives the `yt-dlp` executable.
pub struct YtDlpResolver {
    binary: PathBuf,
    http: reqwest::blocking::Client,
}

impl YtDlpResolver {
    /// Create a resolver using the given yt-dlp executable (name or path).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Option::<Duration>::None)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            binary: binary.into(),
            http,
        }
    }

    /// Run `yt-dlp -J` for one video id, killing the child if cancelled.
    fn fetch_document(&self, video_id: &str, cancel: &CancelSignal) -> Result<YtDlpVideo, ClassifiedError> {
        let url = format!("{}{}", WATCH_URL, video_id);
        tracing::debug!("YTDLP_SPAWN | binary={} video={}", self.binary.display(), video_id);

        let mut child = Command::new(&self.binary)
            .args(["-J", "--no-playlist", "--no-warnings", &url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                let message = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("{} is not installed or not on PATH", self.binary.display())
                } else {
                    format!("failed to start {}: {}", self.binary.display(), e)
                };
                ClassifiedError::metadata(MetadataFailure::Generic, message)
            })?;

        // Drain both pipes on their own threads so a large manifest cannot
        // fill the pipe buffer while we poll for exit.
        let stdout_reader = child.stdout.take().map(spawn_drain);
        let stderr_reader = child.stderr.take().map(spawn_drain);

        let status = loop {
            if cancel.is_raised() {
                let _ = child.kill();
                let _ = child.wait();
                tracing::info!("YTDLP_CANCELLED | video={}", video_id);
                return Err(ClassifiedError::cancelled());
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(ClassifiedError::metadata(
                        MetadataFailure::Generic,
                        format!("failed to wait for yt-dlp: {}", e),
                    ));
                }
            }
        };

        let stdout = join_drain(stdout_reader);
        let stderr = join_drain(stderr_reader);

        if !status.success() {
            let err = classify_failure(&stderr);
            tracing::warn!("YTDLP_FAILED | video={} kind={} detail={}", video_id, err.kind, err.message);
            return Err(err);
        }

        parse_document(&stdout)
    }
}

fn spawn_drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

impl MetadataResolver for YtDlpResolver {
    fn resolve(&self, url: &str, cancel: &CancelSignal) -> Result<VideoManifest, ClassifiedError> {
        let video_id = extract_video_id(url).ok_or_else(|| ClassifiedError::invalid_url(url))?;
        let document = self.fetch_document(&video_id, cancel)?;
        let manifest = document.to_manifest();

        tracing::info!(
            "METADATA_RESOLVED | video={} formats={}",
            manifest.id,
            manifest.formats.len()
        );
        Ok(manifest)
    }

    fn open_stream(
        &self,
        video_id: &str,
        format: &FormatDescriptor,
        cancel: &CancelSignal,
    ) -> Result<ByteSource, ClassifiedError> {
        // Stream URLs expire, so the manifest is fetched again right before
        // the transfer.
        let document = self.fetch_document(video_id, cancel)?;
        let remote = document
            .formats
            .iter()
            .find(|f| f.format_id == format.id)
            .ok_or_else(|| ClassifiedError::format_not_found(&format.id))?;
        let url = remote
            .url
            .as_deref()
            .ok_or_else(|| ClassifiedError::format_not_found(&format.id))?;

        if cancel.is_raised() {
            return Err(ClassifiedError::cancelled());
        }

        let mut request = self.http.get(url);
        for (name, value) in &remote.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .map_err(|e| ClassifiedError::transfer(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 404 || status.as_u16() == 410 {
            return Err(ClassifiedError::format_not_found(&format.id));
        }
        if !status.is_success() {
            return Err(ClassifiedError::transfer(format!("server returned HTTP {}", status)));
        }

        let total_len = response.content_length();
        tracing::info!(
            "STREAM_OPENED | video={} format={} length={:?}",
            video_id,
            format.id,
            total_len
        );

        Ok(ByteSource {
            reader: Box::new(response),
            total_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const DOCUMENT: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Never Gonna Give You Up",
        "uploader": "Rick Astley",
        "duration": 212.0,
        "view_count": 1500000000,
        "upload_date": "20091025",
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "protocol": "mhtml", "vcodec": "none", "acodec": "none"},
            {"format_id": "140", "ext": "m4a", "protocol": "https", "filesize": 3400000,
             "abr": 129.5, "vcodec": "none", "acodec": "mp4a.40.2", "audio_channels": 2,
             "url": "https://example.invalid/140"},
            {"format_id": "251", "ext": "webm", "protocol": "https", "filesize_approx": 3600000,
             "abr": 160.0, "vcodec": "none", "acodec": "opus", "audio_channels": 2},
            {"format_id": "18", "ext": "mp4", "protocol": "https", "filesize": 9000000,
             "width": 640, "height": 360, "tbr": 500.0, "vcodec": "avc1", "acodec": "mp4a.40.2"},
            {"format_id": "137", "ext": "mp4", "protocol": "m3u8_native",
             "width": 1920, "height": 1080, "vcodec": "avc1", "acodec": "none"}
        ]
    }"#;

    #[test]
    fn test_parse_manifest_fields() {
        let manifest = parse_manifest(DOCUMENT).unwrap();
        assert_eq!(manifest.id, "dQw4w9WgXcQ");
        assert_eq!(manifest.author, "Rick Astley");
        assert_eq!(manifest.duration_secs, 212);
        assert_eq!(manifest.upload_date, "2009-10-25");
        assert_eq!(manifest.formats.len(), 5);
    }

    #[test]
    fn test_parse_manifest_format_mapping() {
        let manifest = parse_manifest(DOCUMENT).unwrap();
        let by_id = |id: &str| manifest.formats.iter().find(|f| f.id == id).unwrap().clone();

        let storyboard = by_id("sb0");
        assert!(!storyboard.has_video() && !storyboard.is_audio_only());

        let m4a = by_id("140");
        assert_eq!(m4a.mime_type, "audio/m4a");
        assert_eq!(m4a.bitrate, 129_500);
        assert_eq!(m4a.content_length, 3_400_000);

        assert_eq!(by_id("251").content_length, 3_600_000);

        let muxed = by_id("18");
        assert_eq!(muxed.mime_type, "video/mp4");
        assert_eq!(muxed.height, Some(360));
        assert!(muxed.has_audio());

        assert_eq!(by_id("137").content_length, -1);
    }

    #[test]
    fn test_parse_manifest_rejects_garbage() {
        let err = parse_manifest("not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::Generic));
    }

    #[test]
    fn test_classify_failure() {
        let age = classify_failure("ERROR: [youtube] abc: Sign in to confirm your age\n");
        assert_eq!(age.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::AuthOrAgeRestricted));
        assert_eq!(age.message, "ERROR: [youtube] abc: Sign in to confirm your age");

        let private = classify_failure("ERROR: [youtube] abc: Private video");
        assert_eq!(private.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::NotFound));

        let other = classify_failure("ERROR: unable to download webpage: timed out");
        assert_eq!(other.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::Generic));

        let empty = classify_failure("");
        assert_eq!(empty.message, "yt-dlp exited with an error");
    }

    #[test]
    fn test_classify_failure_status_codes() {
        let forbidden = classify_failure("ERROR: unable to download video data: HTTP Error 403: Forbidden");
        assert_eq!(forbidden.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::AuthOrAgeRestricted));

        let missing = classify_failure("ERROR: [youtube] abc: HTTP Error 404: Not Found");
        assert_eq!(missing.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::NotFound));

        // Digits elsewhere in the text are not status codes
        let noise = classify_failure("ERROR: [youtube] x4040abc: read 14003 bytes, connection reset");
        assert_eq!(noise.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::Generic));
    }

    #[test]
    fn test_missing_binary_is_generic_failure() {
        let resolver = YtDlpResolver::new("/nonexistent/yt-dlp-binary");
        let err = resolver
            .resolve("https://youtu.be/dQw4w9WgXcQ", &CancelSignal::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetadataFetchFailed(MetadataFailure::Generic));
        assert!(err.message.contains("not installed"));
    }

    #[test]
    fn test_resolve_rejects_unparseable_url() {
        let resolver = YtDlpResolver::new("yt-dlp");
        let err = resolver
            .resolve("https://www.youtube.com/watch", &CancelSignal::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUrl);
    }
}

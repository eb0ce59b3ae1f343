// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error taxonomy for tubegrab.
//!
//! Every failure a background task can hit is reduced to a [`ClassifiedError`]
//! before it reaches the presentation thread. The state machine treats all
//! kinds the same way (it moves to the error screen); the kind only selects
//! the explanation shown to the user, built with [`ErrorBuilder`].

use std::fmt;

/// Subkinds of a failed metadata lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFailure {
    /// The video is private, deleted or otherwise missing
    NotFound,
    /// The video requires sign-in or age verification
    AuthOrAgeRestricted,
    /// Anything else (network, resolver crash, unparseable manifest)
    Generic,
}

/// Kind of a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submitted text is not a supported video URL
    InvalidUrl,
    /// Resolving the video metadata failed
    MetadataFetchFailed(MetadataFailure),
    /// The chosen format could not be resolved at transfer time
    FormatNotFound,
    /// Permission denied, missing directory, disk full
    FilesystemError,
    /// I/O failure while copying the stream
    TransferError,
    /// The user aborted the operation
    Cancelled,
}

impl ErrorKind {
    /// Short title shown at the top of the error screen.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "Invalid YouTube URL",
            ErrorKind::MetadataFetchFailed(MetadataFailure::NotFound) => "Video not found",
            ErrorKind::MetadataFetchFailed(MetadataFailure::AuthOrAgeRestricted) => {
                "Video requires sign-in"
            }
            ErrorKind::MetadataFetchFailed(MetadataFailure::Generic) => {
                "Failed to fetch video information"
            }
            ErrorKind::FormatNotFound => "Selected format is no longer available",
            ErrorKind::FilesystemError => "Filesystem error",
            ErrorKind::TransferError => "Download failed",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidUrl => "INVALID_URL",
            ErrorKind::MetadataFetchFailed(MetadataFailure::NotFound) => "METADATA_NOT_FOUND",
            ErrorKind::MetadataFetchFailed(MetadataFailure::AuthOrAgeRestricted) => {
                "METADATA_AUTH_REQUIRED"
            }
            ErrorKind::MetadataFetchFailed(MetadataFailure::Generic) => "METADATA_FAILED",
            ErrorKind::FormatNotFound => "FORMAT_NOT_FOUND",
            ErrorKind::FilesystemError => "FILESYSTEM_ERROR",
            ErrorKind::TransferError => "TRANSFER_ERROR",
            ErrorKind::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// An error reduced to a kind plus a human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_url(input: &str) -> Self {
        Self::new(
            ErrorKind::InvalidUrl,
            format!("'{}' is not a recognised YouTube link", input),
        )
    }

    pub fn metadata(failure: MetadataFailure, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MetadataFetchFailed(failure), message)
    }

    pub fn format_not_found(format_id: &str) -> Self {
        Self::new(
            ErrorKind::FormatNotFound,
            format!("format {} is not offered by the video anymore", format_id),
        )
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FilesystemError, message)
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransferError, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "operation cancelled by user")
    }

    /// Whether this error is a user-initiated abort.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Build the explanation block for the error screen.
    pub fn explain(&self) -> Explanation {
        let builder = ErrorBuilder::new(self.kind.title()).detail(self.message.clone());
        let builder = match self.kind {
            ErrorKind::InvalidUrl => builder
                .cause("The text is not a youtube.com or youtu.be link")
                .fix("Paste a link like https://www.youtube.com/watch?v=..."),
            ErrorKind::MetadataFetchFailed(MetadataFailure::NotFound) => builder
                .cause("The video is private or was deleted")
                .cause("The video is unavailable in your region")
                .fix("Check the link in a browser"),
            ErrorKind::MetadataFetchFailed(MetadataFailure::AuthOrAgeRestricted) => builder
                .cause("The video is age-restricted or requires sign-in")
                .fix("Try a different video"),
            ErrorKind::MetadataFetchFailed(MetadataFailure::Generic) => builder
                .cause("Network problem or yt-dlp is not installed")
                .fix("Check your connection")
                .fix("Install yt-dlp or set yt_dlp_path in ~/.tubegrab/config.json"),
            ErrorKind::FormatNotFound => builder
                .cause("YouTube changed the offered formats since the lookup")
                .fix("Submit the link again and pick another quality"),
            ErrorKind::FilesystemError => builder
                .cause("Permission denied or directory missing")
                .cause("Not enough disk space")
                .fix("Pick a different download directory"),
            ErrorKind::TransferError => builder
                .cause("The connection dropped during the download")
                .cause("Writing to disk failed")
                .fix("Retry the download"),
            ErrorKind::Cancelled => builder.fix("Submit the link again to restart"),
        };
        builder.build()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}

impl std::error::Error for ClassifiedError {}

// =============================================================================
// EXPLANATIONS
// =============================================================================

/// Structured explanation: title, the raw detail, possible causes and fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub title: String,
    pub detail: Option<String>,
    pub causes: Vec<String>,
    pub fixes: Vec<String>,
}

impl Explanation {
    /// Render as plain text lines (no styling).
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("[X] {}", self.title)];

        if let Some(detail) = &self.detail {
            lines.push(String::new());
            lines.push(detail.clone());
        }

        if !self.causes.is_empty() {
            lines.push(String::new());
            lines.push("Possible causes:".to_string());
            for cause in &self.causes {
                lines.push(format!("  - {}", cause));
            }
        }

        if !self.fixes.is_empty() {
            lines.push(String::new());
            lines.push("Try these fixes:".to_string());
            for (i, fix) in self.fixes.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, fix));
            }
        }

        lines
    }
}

/// Builder for error explanations.
///
/// # Example
///
/// ```
/// use tubegrab::error::ErrorBuilder;
///
/// let explanation = ErrorBuilder::new("Download failed")
///     .cause("The connection dropped")
///     .fix("Retry the download")
///     .build();
/// assert_eq!(explanation.lines()[0], "[X] Download failed");
/// ```
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    title: String,
    detail: Option<String>,
    causes: Vec<String>,
    fixes: Vec<String>,
}

impl ErrorBuilder {
    /// Create a new error builder with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            causes: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// Attach the underlying error message.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.detail = if detail.is_empty() { None } else { Some(detail) };
        self
    }

    /// Add a possible cause.
    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a suggested fix.
    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    pub fn build(self) -> Explanation {
        Explanation {
            title: self.title,
            detail: self.detail,
            causes: self.causes,
            fixes: self.fixes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explanation_lines() {
        let explanation = ErrorBuilder::new("Test error")
            .detail("boom")
            .cause("Cause 1")
            .fix("Fix 1")
            .fix("Fix 2")
            .build();
        let lines = explanation.lines();

        assert_eq!(lines[0], "[X] Test error");
        assert!(lines.contains(&"boom".to_string()));
        assert!(lines.contains(&"  - Cause 1".to_string()));
        assert!(lines.contains(&"  1. Fix 1".to_string()));
        assert!(lines.contains(&"  2. Fix 2".to_string()));
    }

    #[test]
    fn test_empty_detail_is_dropped() {
        let explanation = ErrorBuilder::new("Title").detail("").build();
        assert_eq!(explanation.detail, None);
        assert_eq!(explanation.lines(), vec!["[X] Title".to_string()]);
    }

    #[test]
    fn test_kind_selects_explanation() {
        let not_found = ClassifiedError::metadata(MetadataFailure::NotFound, "HTTP 404");
        let restricted =
            ClassifiedError::metadata(MetadataFailure::AuthOrAgeRestricted, "HTTP 403");

        assert_eq!(not_found.explain().title, "Video not found");
        assert_eq!(restricted.explain().title, "Video requires sign-in");
        assert_ne!(not_found.explain().causes, restricted.explain().causes);
    }

    #[test]
    fn test_cancelled_helper() {
        assert!(ClassifiedError::cancelled().is_cancelled());
        assert!(!ClassifiedError::transfer("eof").is_cancelled());
    }

    #[test]
    fn test_display() {
        let err = ClassifiedError::filesystem("permission denied");
        assert_eq!(err.to_string(), "Filesystem error: permission denied");
        assert_eq!(err.kind.to_string(), "FILESYSTEM_ERROR");
    }
}

// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Color palette and drawing primitives.
//!
//! A [`Theme`] is built once at startup and handed to the renderer; nothing
//! reads colors from global state.
//!
//! Color usage conventions:
//! - error = failures and the error screen
//! - success = completion and the finished progress bar
//! - warning = cancellation in progress, hints
//! - accent = title, cursor, active progress bar
//! - muted = secondary text (metadata, subtitles, key help)

/// Box drawing characters.
pub mod box_chars {
    pub const HORIZONTAL: char = '─';
    pub const VERTICAL: char = '│';
    pub const TOP_LEFT: char = '┌';
    pub const TOP_RIGHT: char = '┐';
    pub const BOTTOM_LEFT: char = '└';
    pub const BOTTOM_RIGHT: char = '┘';
}

/// Status markers (no emoji).
pub mod symbols {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[X]";
    pub const WARNING: &str = "[!]";
    pub const CURSOR: &str = ">";
}

/// Loading spinner frames.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// ANSI escape sequences for each role. Empty strings disable styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub reset: &'static str,
    pub bold: &'static str,
    pub accent: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
    pub muted: &'static str,
    pub text: &'static str,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            reset: "\x1b[0m",
            bold: "\x1b[1m",
            accent: "\x1b[96m",
            success: "\x1b[32m",
            warning: "\x1b[33m",
            error: "\x1b[31m",
            muted: "\x1b[90m",
            text: "\x1b[37m",
        }
    }
}

impl Theme {
    /// No escape sequences at all.
    pub fn plain() -> Self {
        Self {
            reset: "",
            bold: "",
            accent: "",
            success: "",
            warning: "",
            error: "",
            muted: "",
            text: "",
        }
    }

    /// Plain when `NO_COLOR` is set, colored otherwise.
    pub fn from_env() -> Self {
        if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            Self::plain()
        } else {
            Self::default()
        }
    }

    pub fn paint(&self, color: &str, text: &str) -> String {
        if color.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", color, text, self.reset)
        }
    }

    pub fn spinner(&self, frame: usize) -> &'static str {
        SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
    }

    /// Horizontal rule.
    pub fn separator(&self, width: usize) -> String {
        self.paint(self.muted, &box_chars::HORIZONTAL.to_string().repeat(width))
    }

    /// Block progress bar with a percentage suffix.
    pub fn progress_bar(&self, percent: f64, width: usize) -> String {
        let percent = percent.clamp(0.0, 100.0);
        let filled = ((percent / 100.0) * width as f64).round() as usize;
        let empty = width.saturating_sub(filled);
        let color = if percent >= 100.0 { self.success } else { self.accent };

        format!(
            "{} {:>5.1}%",
            self.paint(color, &format!("{}{}", "█".repeat(filled), "░".repeat(empty))),
            percent
        )
    }

    /// Three-line box around a title and one line of content.
    pub fn boxed(&self, title: &str, content: &str, border: &str, width: usize) -> Vec<String> {
        let title_width = unicode_width::UnicodeWidthStr::width(title);
        let fill = width.saturating_sub(title_width + 4);
        vec![
            self.paint(
                border,
                &format!(
                    "{} {} {}{}",
                    box_chars::TOP_LEFT,
                    title,
                    box_chars::HORIZONTAL.to_string().repeat(fill),
                    box_chars::TOP_RIGHT
                ),
            ),
            format!("{}  {}", self.paint(border, &box_chars::VERTICAL.to_string()), content),
            self.paint(
                border,
                &format!(
                    "{}{}{}",
                    box_chars::BOTTOM_LEFT,
                    box_chars::HORIZONTAL.to_string().repeat(width.saturating_sub(2)),
                    box_chars::BOTTOM_RIGHT
                ),
            ),
        ]
    }
}

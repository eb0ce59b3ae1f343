// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Screen rendering.
//!
//! [`compose`] turns the app state into lines of styled text; [`Renderer`]
//! writes them to the terminal with crossterm.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use super::theme::{symbols, Theme};
use crate::app::{App, AppState};
use crate::catalog::list_items;
use crate::format::truncate_display;
use crate::navigator::Entry;

const TITLE: &str = "tubegrab";

/// Build the lines for the current screen.
pub fn compose(app: &App, theme: &Theme) -> Vec<String> {
    let (width, height) = app.viewport();
    let width = (width as usize).clamp(20, 100);
    let height = height as usize;

    let mut lines = vec![
        theme.paint(theme.bold, &theme.paint(theme.accent, TITLE)),
        theme.separator(width),
        String::new(),
    ];

    let (body, help) = match app.state() {
        AppState::Input => (input_screen(app, theme, width), "Enter submit  Ctrl+U clear  Ctrl+C quit"),
        AppState::Loading => (loading_screen(app, theme), "Esc cancel"),
        AppState::QualitySelect => (
            quality_screen(app, theme, width, height),
            "↑/k ↓/j move  Enter choose  Esc back",
        ),
        AppState::DirectoryPick => (
            directory_screen(app, theme, width, height),
            "↑/↓ move  Enter open  Space select here  ←/h parent  →/l enter",
        ),
        AppState::Downloading => (downloading_screen(app, theme, width), "Esc cancel"),
        AppState::Complete => (complete_screen(app, theme, width), "Enter/n new download  q quit"),
        AppState::Error => (error_screen(app, theme), "Enter/r try again  q quit"),
    };

    lines.extend(body);
    lines.push(String::new());
    lines.push(theme.paint(theme.muted, help));
    lines
}

fn input_screen(app: &App, theme: &Theme, width: usize) -> Vec<String> {
    let url = app.session().url.as_str();
    // Show the tail of long URLs so the caret stays visible.
    let room = width.saturating_sub(4);
    let chars: Vec<char> = url.chars().collect();
    let visible: String = chars[chars.len().saturating_sub(room)..].iter().collect();

    vec![
        "Paste a YouTube link:".to_string(),
        String::new(),
        format!("{} {}█", theme.paint(theme.accent, symbols::CURSOR), visible),
    ]
}

fn loading_screen(app: &App, theme: &Theme) -> Vec<String> {
    let spinner = theme.paint(theme.accent, theme.spinner(app.spinner_frame()));
    let mut lines = vec![format!("{} Fetching video information...", spinner)];
    if app.is_cancelling() {
        lines.push(theme.paint(theme.warning, "Cancelling..."));
    }
    lines
}

/// Window of `len` rows of size `rows` that keeps `cursor` visible.
fn visible_window(len: usize, cursor: usize, rows: usize) -> std::ops::Range<usize> {
    let rows = rows.max(1);
    if len <= rows {
        return 0..len;
    }
    let start = cursor.saturating_sub(rows - 1).min(len - rows);
    start..start + rows
}

fn quality_screen(app: &App, theme: &Theme, width: usize, height: usize) -> Vec<String> {
    let Some(video) = app.session().video.as_ref() else {
        return Vec::new();
    };

    let mut lines = vec![
        theme.paint(theme.bold, &truncate_display(&video.title, width)),
        theme.paint(
            theme.muted,
            &format!(
                "{}  ·  {}  ·  {} views  ·  {}",
                video.author,
                video.duration_display(),
                video.views_display(),
                video.upload_date
            ),
        ),
        String::new(),
        "Select quality:".to_string(),
    ];

    let items = list_items(video.formats());
    // Two lines per item; leave room for header and footer.
    let rows = height.saturating_sub(lines.len() + 6) / 2;
    for i in visible_window(items.len(), app.quality_cursor(), rows) {
        let item = &items[i];
        if i == app.quality_cursor() {
            lines.push(format!(
                "{} {}",
                theme.paint(theme.accent, symbols::CURSOR),
                theme.paint(theme.bold, &item.title)
            ));
        } else {
            lines.push(format!("  {}", item.title));
        }
        lines.push(format!("    {}", theme.paint(theme.muted, &item.subtitle)));
    }
    lines
}

fn directory_screen(app: &App, theme: &Theme, width: usize, height: usize) -> Vec<String> {
    let Some(navigator) = app.navigator() else {
        return Vec::new();
    };

    let mut lines = vec![
        "Choose download directory:".to_string(),
        theme.paint(
            theme.muted,
            &truncate_display(&navigator.current_path().display().to_string(), width),
        ),
        String::new(),
    ];

    let entries = navigator.entries();
    let rows = height.saturating_sub(lines.len() + 6);
    for i in visible_window(entries.len(), navigator.cursor(), rows) {
        let entry = &entries[i];
        let label = match entry {
            Entry::SelectHere => theme.paint(theme.success, &entry.label()),
            _ => entry.label(),
        };
        if i == navigator.cursor() {
            lines.push(format!("{} {}", theme.paint(theme.accent, symbols::CURSOR), label));
        } else {
            lines.push(format!("  {}", label));
        }
    }
    lines
}

fn downloading_screen(app: &App, theme: &Theme, width: usize) -> Vec<String> {
    let session = app.session();
    let mut lines = Vec::new();

    if let (Some(video), Some(format)) = (session.video.as_ref(), session.format.as_ref()) {
        lines.push(theme.paint(theme.bold, &truncate_display(&video.title, width)));
        lines.push(theme.paint(theme.muted, &format!("{} · {}", format.quality, format.container)));
        lines.push(String::new());
    }

    if let Some(progress) = session.progress.as_ref() {
        lines.push(theme.progress_bar(progress.percentage, width.saturating_sub(8).min(50)));
        lines.push(String::new());
        lines.push(format!(
            "{}  {}  ETA {}",
            progress.bytes_string(),
            progress.speed_string(),
            progress.eta_string().unwrap_or_else(|| "--".to_string())
        ));
    }

    if app.is_cancelling() {
        lines.push(theme.paint(theme.warning, "Cancelling..."));
    }
    lines
}

fn complete_screen(app: &App, theme: &Theme, width: usize) -> Vec<String> {
    let session = app.session();
    let location = session
        .output_path
        .as_ref()
        .or(session.destination.as_ref())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut lines = vec![format!(
        "{} Download complete",
        theme.paint(theme.success, symbols::SUCCESS)
    )];
    lines.push(String::new());
    lines.extend(theme.boxed(
        "Saved to",
        &truncate_display(&location, width.saturating_sub(4)),
        theme.success,
        width.min(60),
    ));
    if let Some(progress) = session.progress.as_ref() {
        lines.push(theme.paint(
            theme.muted,
            &format!("{} at {}", crate::format::format_bytes(progress.total_bytes), progress.speed_string()),
        ));
    }
    lines
}

fn error_screen(app: &App, theme: &Theme) -> Vec<String> {
    let Some(error) = app.session().error.as_ref() else {
        return Vec::new();
    };

    let color = if error.is_cancelled() { theme.warning } else { theme.error };
    error
        .explain()
        .lines()
        .into_iter()
        .enumerate()
        .map(|(i, line)| if i == 0 { theme.paint(color, &line) } else { line })
        .collect()
}

/// Writes composed screens to a terminal.
pub struct Renderer<W: Write> {
    out: W,
    theme: Theme,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Redraw the whole screen.
    pub fn draw(&mut self, app: &App) -> io::Result<()> {
        let lines = compose(app, &self.theme);
        let (_, height) = app.viewport();

        queue!(self.out, Clear(ClearType::All))?;
        for (row, line) in lines.iter().take(height as usize).enumerate() {
            queue!(self.out, MoveTo(1, row as u16), Print(line))?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Event, Key};
    use crate::dispatcher::Message;
    use crate::fsutil::Filesystem;
    use crate::resolver::{RawFormat, VideoManifest};
    use crate::types::VideoInfo;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct EmptyFs;

    impl Filesystem for EmptyFs {
        fn list_directories(&self, _path: &Path) -> io::Result<Vec<String>> {
            Ok(vec!["clips".to_string()])
        }

        fn parent_of(&self, path: &Path) -> Option<PathBuf> {
            path.parent().map(Path::to_path_buf)
        }

        fn default_download_dir(&self) -> PathBuf {
            PathBuf::from("/media")
        }
    }

    fn text(app: &App) -> String {
        compose(app, &Theme::plain()).join("\n")
    }

    fn loaded_app() -> App {
        let mut app = App::new(Arc::new(EmptyFs), None);
        for c in "https://youtu.be/dQw4w9WgXcQ".chars() {
            app.accept(Event::Key(Key::Char(c)));
        }
        app.accept(Event::Key(Key::Enter));
        let task = app.active_task().unwrap();
        let info = VideoInfo::from_manifest(VideoManifest {
            id: "dQw4w9WgXcQ".to_string(),
            title: "A Song".to_string(),
            author: "Band".to_string(),
            duration_secs: 61,
            view_count: 2_000,
            upload_date: "2020-01-01".to_string(),
            formats: vec![RawFormat::video("22", "video/mp4", 2048, 1280, 720)],
        });
        app.accept(Event::Message(Message::VideoInfoReady { task, info }));
        app
    }

    #[test]
    fn test_input_screen_shows_url() {
        let mut app = App::new(Arc::new(EmptyFs), None);
        for c in "abc".chars() {
            app.accept(Event::Key(Key::Char(c)));
        }
        let screen = text(&app);
        assert!(screen.contains("> abc█"));
        assert!(screen.contains("Ctrl+C quit"));
    }

    #[test]
    fn test_quality_screen_lists_formats() {
        let app = loaded_app();
        let screen = text(&app);
        assert!(screen.contains("A Song"));
        assert!(screen.contains("Band  ·  1:01  ·  2.0K views"));
        assert!(screen.contains("> ▶ 720p"));
        assert!(screen.contains("1280x720 - mp4 - 2.00 KB"));
    }

    #[test]
    fn test_directory_screen() {
        let mut app = loaded_app();
        app.accept(Event::Key(Key::Enter));
        let screen = text(&app);
        assert!(screen.contains("/media"));
        assert!(screen.contains("> [ Select this directory ]"));
        assert!(screen.contains("  clips/"));
    }

    #[test]
    fn test_error_screen_uses_explanation() {
        let mut app = App::new(Arc::new(EmptyFs), None);
        for c in "hello".chars() {
            app.accept(Event::Key(Key::Char(c)));
        }
        app.accept(Event::Key(Key::Enter));
        let screen = text(&app);
        assert!(screen.contains("[X] Invalid YouTube URL"));
        assert!(screen.contains("Try these fixes:"));
    }

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(3, 0, 10), 0..3);
        assert_eq!(visible_window(10, 0, 4), 0..4);
        assert_eq!(visible_window(10, 5, 4), 2..6);
        assert_eq!(visible_window(10, 9, 4), 6..10);
        assert_eq!(visible_window(10, 3, 0), 3..4);
    }

    #[test]
    fn test_draw_writes_to_output() {
        let app = loaded_app();
        let mut renderer = Renderer::new(Vec::new(), Theme::plain());
        renderer.draw(&app).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("720p"));
    }
}

// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tubegrab::config::Config;
use tubegrab::fsutil::LocalFs;
use tubegrab::runtime::{self, EventLoop, TerminalGuard, TICK_INTERVAL};
use tubegrab::ui::{Renderer, Theme};
use tubegrab::{App, CancelSignal, Dispatcher, Event, MetadataResolver, StreamingDownloader, YtDlpResolver};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grace period for background tasks when the program exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// ANSI color codes for messages printed before/after the UI owns the screen
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
}

use colors::*;

/// Exit codes
mod exit_codes {
    /// Normal quit
    pub const SUCCESS: i32 = 0;
    /// Unrecoverable startup failure
    pub const ERROR: i32 = 1;
}

use exit_codes::*;

#[derive(Parser)]
#[command(name = "tubegrab")]
#[command(version = VERSION)]
#[command(about = "Download YouTube videos from an interactive terminal UI.")]
#[command(long_about = "tubegrab - terminal YouTube downloader\n\n\
    Paste a link, pick a quality and a destination folder, and watch the\n\
    download progress. Requires yt-dlp on PATH (or yt_dlp_path in\n\
    ~/.tubegrab/config.json).")]
struct Cli {}

/// Install a file logger when one is configured. The terminal belongs to the
/// UI, so logs never go to stdout/stderr.
fn init_logging(config: &Config) -> Result<bool> {
    let Some(path) = config.log_destination() else {
        return Ok(false);
    };

    let level = match config.log_level.parse::<tracing::Level>() {
        Ok(level) => level,
        Err(_) => {
            eprintln!(
                "{YELLOW}[!]{RESET} Unknown log_level '{}'. Using info.",
                config.log_level
            );
            tracing::Level::INFO
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();

    tracing::info!("STARTUP | version={} log={}", VERSION, path.display());
    Ok(true)
}

fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let result = runtime.block_on(async move {
        let (inbox_tx, mut inbox_rx) = runtime::inbox();

        let resolver: Arc<dyn MetadataResolver> = Arc::new(YtDlpResolver::new(&config.yt_dlp_path));
        let downloader = StreamingDownloader::new(Arc::clone(&resolver))
            .with_chunk_size(config.chunk_size)
            .with_progress_interval(config.progress_interval());
        let dispatcher = Dispatcher::new(resolver, downloader, inbox_tx.clone());

        let mut app = App::new(Arc::new(LocalFs), config.download_dir.clone());

        let guard = TerminalGuard::enter()?;
        let (width, height) = TerminalGuard::size();
        app.accept(Event::Resize(width, height));

        let stop_input = CancelSignal::new();
        let input = runtime::spawn_input_thread(inbox_tx.clone(), stop_input.clone());
        let ticker = runtime::spawn_ticker(inbox_tx, TICK_INTERVAL);

        let renderer = Renderer::new(io::stdout(), Theme::from_env());
        let mut event_loop = EventLoop::new(app, dispatcher, renderer);
        let result = event_loop.run(&mut inbox_rx).await;

        stop_input.raise();
        ticker.abort();
        drop(guard);
        let _ = input.join();
        result
    });

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn main() {
    let _cli = Cli::parse();

    let (config, warnings) = match Config::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{RED}[X]{RESET} {:#}", e);
            std::process::exit(ERROR);
        }
    };

    for warning in &warnings {
        eprintln!("{YELLOW}[!]{RESET} {}", warning);
    }

    match init_logging(&config) {
        Ok(true) => {
            for warning in &warnings {
                tracing::warn!("CONFIG_CLAMPED | {}", warning);
            }
        }
        Ok(false) => {}
        Err(e) => eprintln!("{YELLOW}[!]{RESET} Logging disabled: {:#}", e),
    }

    if let Err(e) = run(config) {
        tracing::error!("FATAL | error={:#}", e);
        eprintln!("{RED}[X]{RESET} {:#}", e);
        std::process::exit(ERROR);
    }

    tracing::info!("SHUTDOWN | clean");
    std::process::exit(SUCCESS);
}

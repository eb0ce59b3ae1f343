// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The presentation state machine.
//!
//! [`App::accept`] consumes one event, updates the session and returns the
//! background work to start or cancel. It never blocks; the runtime owns the
//! dispatcher and carries out the returned requests.

use std::path::PathBuf;
use std::sync::Arc;

use super::input::{Event, Key};
use super::state::{AppState, Session};
use crate::dispatcher::{Message, TaskId};
use crate::download::{DownloadJob, DownloadProgress};
use crate::error::{ClassifiedError, ErrorKind};
use crate::fsutil::Filesystem;
use crate::navigator::{Activation, DirectoryNavigator, Entry};
use crate::resolver::is_supported_url;
use crate::types::VideoInfo;

/// Background work requested by a transition.
#[derive(Debug, Clone)]
pub enum DispatchRequest {
    FetchMetadata { task: TaskId, url: String },
    StartDownload { task: TaskId, job: DownloadJob },
    Cancel { task: TaskId },
}

/// Outcome of accepting one event.
#[derive(Debug, Default)]
pub struct Transition {
    pub requests: Vec<DispatchRequest>,
    pub quit: bool,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn request(request: DispatchRequest) -> Self {
        Self {
            requests: vec![request],
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            requests: Vec::new(),
            quit: true,
        }
    }
}

pub struct App {
    state: AppState,
    session: Session,
    fs: Arc<dyn Filesystem>,
    /// Configured start directory for the picker
    start_dir: Option<PathBuf>,
    navigator: Option<DirectoryNavigator>,
    quality_cursor: usize,
    /// Task whose messages are currently accepted
    active_task: Option<TaskId>,
    next_task: TaskId,
    /// Cancellation requested for the active task
    cancelling: bool,
    spinner_frame: usize,
    viewport: (u16, u16),
}

impl App {
    pub fn new(fs: Arc<dyn Filesystem>, start_dir: Option<PathBuf>) -> Self {
        Self {
            state: AppState::Input,
            session: Session::default(),
            fs,
            start_dir,
            navigator: None,
            quality_cursor: 0,
            active_task: None,
            next_task: 1,
            cancelling: false,
            spinner_frame: 0,
            viewport: (80, 24),
        }
    }

    // ========================================================================
    // Accessors for rendering
    // ========================================================================

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn navigator(&self) -> Option<&DirectoryNavigator> {
        self.navigator.as_ref()
    }

    pub fn quality_cursor(&self) -> usize {
        self.quality_cursor
    }

    pub fn active_task(&self) -> Option<TaskId> {
        self.active_task
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancelling
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn viewport(&self) -> (u16, u16) {
        self.viewport
    }

    // ========================================================================
    // Event handling
    // ========================================================================

    /// Consume one event.
    pub fn accept(&mut self, event: Event) -> Transition {
        let before = self.state;
        let transition = match event {
            Event::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Transition::none()
            }
            Event::Resize(width, height) => {
                self.viewport = (width, height);
                Transition::none()
            }
            Event::Key(key) => self.on_key(key),
            Event::Message(message) => self.on_message(message),
        };

        if self.state != before {
            tracing::debug!("STATE_CHANGE | from={} to={}", before, self.state);
        }
        transition
    }

    fn on_key(&mut self, key: Key) -> Transition {
        if self.is_quit_key(key) && self.state.can_quit() {
            return Transition::quit();
        }

        match self.state {
            AppState::Input => self.on_input_key(key),
            AppState::Loading | AppState::Downloading => self.on_busy_key(key),
            AppState::QualitySelect => self.on_quality_key(key),
            AppState::DirectoryPick => self.on_directory_key(key),
            AppState::Complete => match key {
                Key::Enter | Key::Char('n') => self.restart(false),
                _ => Transition::none(),
            },
            AppState::Error => match key {
                Key::Enter | Key::Char('r') => self.restart(true),
                _ => Transition::none(),
            },
        }
    }

    /// Ctrl+C everywhere; `q` too, except while typing a URL.
    fn is_quit_key(&self, key: Key) -> bool {
        match key {
            Key::Ctrl('c') => true,
            Key::Char('q') => self.state != AppState::Input,
            _ => false,
        }
    }

    fn on_input_key(&mut self, key: Key) -> Transition {
        match key {
            Key::Ctrl('u') => {
                self.session.url.clear();
                Transition::none()
            }
            Key::Char(c) => {
                self.session.push_url_char(c);
                Transition::none()
            }
            Key::Backspace => {
                self.session.url.pop();
                Transition::none()
            }
            Key::Enter => self.submit_url(),
            _ => Transition::none(),
        }
    }

    fn submit_url(&mut self) -> Transition {
        let url = self.session.url.trim().to_string();
        if url.is_empty() {
            return Transition::none();
        }
        if !is_supported_url(&url) {
            self.fail(ClassifiedError::invalid_url(&url));
            return Transition::none();
        }

        let task = self.begin_task();
        self.state = AppState::Loading;
        tracing::info!("URL_SUBMITTED | task={} url={}", task, url);
        Transition::request(DispatchRequest::FetchMetadata { task, url })
    }

    fn on_busy_key(&mut self, key: Key) -> Transition {
        match key {
            Key::Ctrl('c') | Key::Esc => match self.active_task {
                Some(task) if !self.cancelling => {
                    self.cancelling = true;
                    Transition::request(DispatchRequest::Cancel { task })
                }
                _ => Transition::none(),
            },
            _ => Transition::none(),
        }
    }

    fn on_quality_key(&mut self, key: Key) -> Transition {
        let count = self.formats_len();
        match key {
            Key::Up | Key::Char('k') => {
                self.quality_cursor = self.quality_cursor.saturating_sub(1);
            }
            Key::Down | Key::Char('j') => {
                if self.quality_cursor + 1 < count {
                    self.quality_cursor += 1;
                }
            }
            Key::Enter => self.confirm_format(),
            Key::Esc => {
                self.session.clear();
                self.quality_cursor = 0;
                self.state = AppState::Input;
            }
            _ => {}
        }
        Transition::none()
    }

    fn confirm_format(&mut self) {
        let Some(format) = self
            .session
            .video
            .as_ref()
            .and_then(|video| video.formats().get(self.quality_cursor))
            .cloned()
        else {
            return;
        };

        let opened = match &self.start_dir {
            Some(dir) => DirectoryNavigator::open(Arc::clone(&self.fs), dir.clone()),
            None => DirectoryNavigator::open_default(Arc::clone(&self.fs)),
        };

        tracing::info!("FORMAT_CHOSEN | format={} quality={}", format.id, format.quality);
        self.session.format = Some(format);

        match opened {
            Ok(navigator) => {
                self.navigator = Some(navigator);
                self.state = AppState::DirectoryPick;
            }
            Err(err) => self.fail(err),
        }
    }

    fn on_directory_key(&mut self, key: Key) -> Transition {
        let Some(navigator) = self.navigator.as_mut() else {
            return Transition::none();
        };

        let outcome = match key {
            Key::Up | Key::Char('k') => {
                navigator.move_cursor(-1);
                Ok(None)
            }
            Key::Down | Key::Char('j') => {
                navigator.move_cursor(1);
                Ok(None)
            }
            Key::Enter => navigator.activate().map(|activation| match activation {
                Activation::Selected(path) => Some(path),
                Activation::Navigated => None,
            }),
            Key::Char(' ') => Ok(Some(navigator.current_path().to_path_buf())),
            Key::Left | Key::Char('h') | Key::Backspace => navigator.up().map(|_| None),
            Key::Right | Key::Char('l') => match navigator.selected().clone() {
                Entry::Dir(name) => navigator.enter(&name).map(|_| None),
                _ => Ok(None),
            },
            _ => Ok(None),
        };

        match outcome {
            Ok(Some(destination)) => self.start_download(destination),
            Ok(None) => Transition::none(),
            Err(err) => {
                self.fail(err);
                Transition::none()
            }
        }
    }

    fn start_download(&mut self, destination: PathBuf) -> Transition {
        let (Some(video), Some(format)) = (self.session.video.as_ref(), self.session.format.as_ref()) else {
            return Transition::none();
        };

        let job = DownloadJob {
            video_id: video.id.clone(),
            title: video.title.clone(),
            format: format.clone(),
            destination: destination.clone(),
        };

        self.session.progress = Some(DownloadProgress::starting(format.byte_size));
        self.session.destination = Some(destination);
        self.navigator = None;

        let task = self.begin_task();
        self.state = AppState::Downloading;
        tracing::info!(
            "DESTINATION_CHOSEN | task={} path={}",
            task,
            job.destination.display()
        );
        Transition::request(DispatchRequest::StartDownload { task, job })
    }

    fn on_message(&mut self, message: Message) -> Transition {
        if self.active_task != Some(message.task_id()) {
            tracing::debug!(
                "STALE_MESSAGE | task={} active={:?}",
                message.task_id(),
                self.active_task
            );
            return Transition::none();
        }

        match (self.state, message) {
            (AppState::Loading, Message::VideoInfoReady { info, .. }) => {
                self.finish_task();
                self.on_video_info(info);
            }
            (AppState::Loading, Message::FetchFailed { error, .. }) => {
                self.finish_task();
                self.fail(error);
            }
            (AppState::Downloading, Message::DownloadProgress { progress, .. }) => {
                let finished = progress.is_finished();
                self.record_progress(progress);
                if finished {
                    self.state = AppState::Complete;
                }
            }
            (AppState::Complete, Message::DownloadProgress { progress, .. }) => {
                self.record_progress(progress);
            }
            (AppState::Downloading | AppState::Complete, Message::DownloadComplete { path, .. }) => {
                self.finish_task();
                if let Some(progress) = self.session.progress.as_mut() {
                    progress.bytes_downloaded = progress.total_bytes;
                    progress.percentage = 100.0;
                }
                self.session.output_path = Some(path);
                self.state = AppState::Complete;
            }
            (AppState::Downloading | AppState::Complete, Message::DownloadFailed { error, .. }) => {
                self.finish_task();
                self.fail(error);
            }
            (state, message) => {
                tracing::warn!(
                    "UNEXPECTED_MESSAGE | state={} task={}",
                    state,
                    message.task_id()
                );
            }
        }
        Transition::none()
    }

    fn on_video_info(&mut self, info: VideoInfo) {
        tracing::info!(
            "VIDEO_INFO | id={} formats={}",
            info.id,
            info.formats().len()
        );
        if info.formats().is_empty() {
            self.fail(ClassifiedError::new(
                ErrorKind::FormatNotFound,
                "the video offers no downloadable formats",
            ));
            return;
        }
        self.session.video = Some(info);
        self.quality_cursor = 0;
        self.state = AppState::QualitySelect;
    }

    /// Keep bytes_downloaded non-decreasing across samples.
    fn record_progress(&mut self, progress: DownloadProgress) {
        let regressed = self
            .session
            .progress
            .as_ref()
            .map(|current| progress.bytes_downloaded < current.bytes_downloaded)
            .unwrap_or(false);
        if !regressed {
            self.session.progress = Some(progress);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn formats_len(&self) -> usize {
        self.session
            .video
            .as_ref()
            .map(|video| video.formats().len())
            .unwrap_or(0)
    }

    fn begin_task(&mut self) -> TaskId {
        let task = self.next_task;
        self.next_task += 1;
        self.active_task = Some(task);
        self.cancelling = false;
        task
    }

    fn finish_task(&mut self) {
        self.active_task = None;
        self.cancelling = false;
    }

    fn fail(&mut self, error: ClassifiedError) {
        if error.is_cancelled() {
            tracing::info!("SESSION_CANCELLED | state={}", self.state);
        } else {
            tracing::error!("SESSION_ERROR | state={} kind={} message={}", self.state, error.kind, error.message);
        }
        self.navigator = None;
        self.session.error = Some(error);
        self.state = AppState::Error;
    }

    /// Back to Input. Retrying from Error keeps the URL in the field.
    ///
    /// Complete can be reached before the transfer's terminal message, so a
    /// task still in flight is cancelled rather than left running untracked.
    fn restart(&mut self, keep_url: bool) -> Transition {
        let transition = match self.active_task {
            Some(task) => {
                tracing::info!("TASK_ABANDONED | task={} state={}", task, self.state);
                Transition::request(DispatchRequest::Cancel { task })
            }
            None => Transition::none(),
        };

        let url = std::mem::take(&mut self.session.url);
        self.session.clear();
        if keep_url {
            self.session.url = url;
        }
        self.navigator = None;
        self.quality_cursor = 0;
        self.active_task = None;
        self.cancelling = false;
        self.state = AppState::Input;
        transition
    }
}

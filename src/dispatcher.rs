// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Command dispatcher: runs background work and funnels the results back to
//! the presentation thread as [`Message`]s.
//!
//! Every task sends zero or more progress messages followed by exactly one
//! terminal message, all tagged with the [`TaskId`] the state machine chose
//! when it requested the work. Nothing is sent after the terminal message.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::cancel::CancelSignal;
use crate::download::{DownloadJob, DownloadProgress, StreamingDownloader};
use crate::error::ClassifiedError;
use crate::resolver::MetadataResolver;
use crate::types::VideoInfo;

/// Identifies one dispatched task.
pub type TaskId = u64;

/// Result and progress messages produced by background tasks.
#[derive(Debug, Clone)]
pub enum Message {
    VideoInfoReady { task: TaskId, info: VideoInfo },
    FetchFailed { task: TaskId, error: ClassifiedError },
    DownloadProgress { task: TaskId, progress: DownloadProgress },
    DownloadComplete { task: TaskId, path: PathBuf },
    DownloadFailed { task: TaskId, error: ClassifiedError },
}

impl Message {
    pub fn task_id(&self) -> TaskId {
        match self {
            Message::VideoInfoReady { task, .. }
            | Message::FetchFailed { task, .. }
            | Message::DownloadProgress { task, .. }
            | Message::DownloadComplete { task, .. }
            | Message::DownloadFailed { task, .. } => *task,
        }
    }

    /// Whether this is the last message a task sends.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Message::DownloadProgress { .. })
    }
}

/// Work the dispatcher knows how to run.
#[derive(Debug, Clone)]
pub enum Command {
    FetchMetadata { url: String },
    Download(DownloadJob),
}

/// Handle to a running task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancel: CancelSignal,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Raise the task's cancellation signal. The task still sends its
    /// terminal (`Cancelled`) message.
    pub fn cancel(&self) {
        tracing::info!("TASK_CANCEL | task={}", self.id);
        self.cancel.raise();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Spawns tasks onto tokio's blocking pool.
///
/// `E` is the inbox event type; messages are converted with `E::from`.
pub struct Dispatcher<E> {
    resolver: Arc<dyn MetadataResolver>,
    downloader: Arc<StreamingDownloader>,
    inbox: UnboundedSender<E>,
}

impl<E> Dispatcher<E>
where
    E: From<Message> + Send + 'static,
{
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        downloader: StreamingDownloader,
        inbox: UnboundedSender<E>,
    ) -> Self {
        Self {
            resolver,
            downloader: Arc::new(downloader),
            inbox,
        }
    }

    /// Start `command` as task `id`. Must be called within a tokio runtime.
    pub fn dispatch(&self, id: TaskId, command: Command) -> TaskHandle {
        let cancel = CancelSignal::new();
        let signal = cancel.clone();
        let inbox = self.inbox.clone();

        let join = match command {
            Command::FetchMetadata { url } => {
                let resolver = Arc::clone(&self.resolver);
                tracing::info!("TASK_START | task={} kind=fetch_metadata url={}", id, url);
                tokio::task::spawn_blocking(move || {
                    let message = match resolver.resolve(&url, &signal) {
                        Ok(manifest) => Message::VideoInfoReady {
                            task: id,
                            info: VideoInfo::from_manifest(manifest),
                        },
                        Err(error) => Message::FetchFailed { task: id, error },
                    };
                    send(&inbox, message);
                })
            }
            Command::Download(job) => {
                let downloader = Arc::clone(&self.downloader);
                tracing::info!("TASK_START | task={} kind=download format={}", id, job.format.id);
                tokio::task::spawn_blocking(move || {
                    let progress_inbox = inbox.clone();
                    let result = downloader.download(
                        &job,
                        |progress| send(&progress_inbox, Message::DownloadProgress { task: id, progress }),
                        &signal,
                    );
                    let message = match result {
                        Ok(path) => Message::DownloadComplete { task: id, path },
                        Err(error) => Message::DownloadFailed { task: id, error },
                    };
                    send(&inbox, message);
                })
            }
        };

        TaskHandle { id, cancel, join }
    }
}

fn send<E: From<Message>>(inbox: &UnboundedSender<E>, message: Message) {
    let task = message.task_id();
    let terminal = message.is_terminal();
    if inbox.send(E::from(message)).is_err() {
        // Presentation loop has exited; nothing left to notify.
        tracing::debug!("TASK_ORPHANED | task={}", task);
    } else if terminal {
        tracing::debug!("TASK_DONE | task={}", task);
    }
}

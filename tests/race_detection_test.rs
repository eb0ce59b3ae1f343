// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Race Detection Tests for tubegrab
//!
//! These tests exercise the pieces shared across threads: the cancellation
//! flag and the single inbox that many tasks write into.
//!
//! # Running with ThreadSanitizer
//!
//! ```bash
//! RUSTFLAGS="-Z sanitizer=thread" cargo +nightly test --target x86_64-unknown-linux-gnu --test race_detection_test
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use tubegrab::cancel::CancelSignal;
use tubegrab::resolver::{ByteSource, RawFormat, VideoManifest};
use tubegrab::types::VideoInfo;
use tubegrab::{
    ClassifiedError, Command, Dispatcher, DownloadJob, ErrorKind, FormatDescriptor, Message,
    MetadataResolver, StreamingDownloader,
};

// Test configuration
const CONCURRENCY_LEVEL: u64 = 16;
const PAYLOAD_LEN: usize = 64 * 1024;

struct BulkResolver;

impl MetadataResolver for BulkResolver {
    fn resolve(&self, _url: &str, cancel: &CancelSignal) -> Result<VideoManifest, ClassifiedError> {
        if cancel.is_raised() {
            return Err(ClassifiedError::cancelled());
        }
        Ok(VideoManifest {
            id: "dQw4w9WgXcQ".to_string(),
            title: "bulk".to_string(),
            author: String::new(),
            duration_secs: 1,
            view_count: 0,
            upload_date: String::new(),
            formats: vec![RawFormat::video("22", "video/mp4", PAYLOAD_LEN as i64, 1280, 720)],
        })
    }

    fn open_stream(
        &self,
        _video_id: &str,
        _format: &FormatDescriptor,
        _cancel: &CancelSignal,
    ) -> Result<ByteSource, ClassifiedError> {
        Ok(ByteSource {
            reader: Box::new(Cursor::new(vec![0u8; PAYLOAD_LEN])),
            total_len: Some(PAYLOAD_LEN as u64),
        })
    }
}

#[test]
fn test_cancel_signal_visible_across_threads() {
    let signal = CancelSignal::new();
    let observers: Vec<_> = (0..8)
        .map(|_| {
            let observer = signal.clone();
            std::thread::spawn(move || {
                while !observer.is_raised() {
                    std::thread::yield_now();
                }
            })
        })
        .collect();

    signal.raise();
    for observer in observers {
        observer.join().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_keep_per_task_order() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
    let resolver: Arc<dyn MetadataResolver> = Arc::new(BulkResolver);
    let downloader = StreamingDownloader::new(Arc::clone(&resolver))
        .with_chunk_size(1024)
        .with_progress_interval(Duration::ZERO);
    let dispatcher = Dispatcher::new(Arc::clone(&resolver), downloader, tx);

    let info = VideoInfo::from_manifest(resolver.resolve("", &CancelSignal::new()).unwrap());
    let handles: Vec<_> = (0..CONCURRENCY_LEVEL)
        .map(|task| {
            let destination = dir.path().join(task.to_string());
            std::fs::create_dir(&destination).unwrap();
            let job = DownloadJob {
                video_id: info.id.clone(),
                title: info.title.clone(),
                format: info.formats()[0].clone(),
                destination,
            };
            dispatcher.dispatch(task, Command::Download(job))
        })
        .collect();
    drop(dispatcher);

    let mut last_bytes: HashMap<u64, u64> = HashMap::new();
    let mut finished: HashMap<u64, bool> = HashMap::new();

    timeout(Duration::from_secs(30), async {
        while let Some(message) = rx.recv().await {
            let task = message.task_id();
            assert!(!finished.contains_key(&task), "message after terminal for task {}", task);
            match message {
                Message::DownloadProgress { progress, .. } => {
                    let previous = last_bytes.insert(task, progress.bytes_downloaded).unwrap_or(0);
                    assert!(progress.bytes_downloaded >= previous);
                }
                Message::DownloadComplete { .. } => {
                    finished.insert(task, true);
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(finished.len() as u64, CONCURRENCY_LEVEL);
    assert!(last_bytes.values().all(|b| *b == PAYLOAD_LEN as u64));
    assert!(handles.iter().all(|h| h.is_finished()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_before_start_is_reported() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
    let resolver: Arc<dyn MetadataResolver> = Arc::new(BulkResolver);
    let dispatcher = Dispatcher::new(
        Arc::clone(&resolver),
        StreamingDownloader::new(resolver),
        tx,
    );

    let handle = dispatcher.dispatch(1, Command::FetchMetadata { url: String::new() });
    handle.cancel();

    let message = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    // The task may finish before it observes the flag; either way exactly one
    // terminal message arrives.
    match message {
        Message::VideoInfoReady { task, .. } => assert_eq!(task, 1),
        Message::FetchFailed { task, error } => {
            assert_eq!(task, 1);
            assert_eq!(error.kind, ErrorKind::Cancelled);
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

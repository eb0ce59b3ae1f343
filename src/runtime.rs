// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal runtime: owns the screen, merges input, ticks and task messages
//! into one ordered inbox, and feeds them to the state machine one at a time.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app::{translate, App, DispatchRequest, Event};
use crate::cancel::CancelSignal;
use crate::dispatcher::{Command, Dispatcher, TaskHandle};
use crate::ui::Renderer;

/// Spinner cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long the input thread blocks before re-checking its stop flag.
const INPUT_POLL: Duration = Duration::from_millis(100);

pub fn inbox() -> (UnboundedSender<Event>, UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

// ============================================================================
// Terminal setup
// ============================================================================

/// Alternate screen + raw mode + mouse capture, restored on drop.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = Self { _private: () };
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)
            .context("Failed to switch to the alternate screen")?;
        Ok(guard)
    }

    pub fn size() -> (u16, u16) {
        terminal::size().unwrap_or((80, 24))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

// ============================================================================
// Event sources
// ============================================================================

/// Read terminal events on a dedicated thread until `stop` is raised or the
/// inbox closes.
pub fn spawn_input_thread(inbox: UnboundedSender<Event>, stop: CancelSignal) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.is_raised() && !inbox.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(raw) => {
                        if let Some(event) = translate(raw) {
                            if inbox.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("INPUT_READ_FAILED | error={}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("INPUT_POLL_FAILED | error={}", e);
                    break;
                }
            }
        }
    })
}

/// Send a [`Event::Tick`] every `interval` until the inbox closes.
pub fn spawn_ticker(inbox: UnboundedSender<Event>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if inbox.send(Event::Tick).is_err() {
                break;
            }
        }
    })
}

// ============================================================================
// Event loop
// ============================================================================

/// Drives the state machine from the inbox.
pub struct EventLoop<W: Write> {
    app: App,
    dispatcher: Dispatcher<Event>,
    renderer: Renderer<W>,
    active: Option<TaskHandle>,
}

impl<W: Write> EventLoop<W> {
    pub fn new(app: App, dispatcher: Dispatcher<Event>, renderer: Renderer<W>) -> Self {
        Self {
            app,
            dispatcher,
            renderer,
            active: None,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Process events until the state machine asks to quit or the inbox
    /// closes. Redraws after every event.
    pub async fn run(&mut self, inbox: &mut UnboundedReceiver<Event>) -> Result<()> {
        self.renderer.draw(&self.app).context("Failed to draw")?;

        while let Some(event) = inbox.recv().await {
            if !self.step(event)? {
                break;
            }
        }

        if let Some(handle) = self.active.take() {
            if !handle.is_finished() {
                handle.cancel();
            }
        }
        Ok(())
    }

    /// Feed one event to the state machine, carry out its requests and
    /// redraw. Returns `false` once the user quit.
    pub fn step(&mut self, event: Event) -> Result<bool> {
        let transition = self.app.accept(event);
        for request in transition.requests {
            self.apply(request);
        }
        if transition.quit {
            tracing::info!("QUIT | state={}", self.app.state());
            return Ok(false);
        }
        self.renderer.draw(&self.app).context("Failed to draw")?;
        Ok(true)
    }

    fn apply(&mut self, request: DispatchRequest) {
        match request {
            DispatchRequest::FetchMetadata { task, url } => {
                let handle = self.dispatcher.dispatch(task, Command::FetchMetadata { url });
                self.replace_active(handle);
            }
            DispatchRequest::StartDownload { task, job } => {
                let handle = self.dispatcher.dispatch(task, Command::Download(job));
                self.replace_active(handle);
            }
            DispatchRequest::Cancel { task } => match &self.active {
                Some(handle) if handle.id() == task => handle.cancel(),
                _ => tracing::debug!("CANCEL_IGNORED | task={}", task),
            },
        }
    }

    fn replace_active(&mut self, handle: TaskHandle) {
        if let Some(previous) = self.active.replace(handle) {
            if !previous.is_finished() {
                tracing::warn!("TASK_SUPERSEDED | task={}", previous.id());
                previous.cancel();
            }
        }
    }

    pub fn into_renderer(self) -> Renderer<W> {
        self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticker_stops_when_inbox_closes() {
        let (tx, mut rx) = inbox();
        let handle = spawn_ticker(tx, Duration::from_millis(5));

        assert!(matches!(rx.recv().await, Some(Event::Tick)));
        drop(rx);
        handle.await.unwrap();
    }
}

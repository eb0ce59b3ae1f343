// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Presentation state machine and its inputs.
//!
//! # Flow
//!
//! ```text
//! Input ──submit──▶ Loading ──info──▶ QualitySelect ──choose──▶ DirectoryPick
//!   ▲                  │                  │ Esc                      │ select
//!   │                  ▼                  ▼                          ▼
//!   └──── retry ──── Error ◀──────────────────────────────────── Downloading
//!   └──── restart ── Complete ◀─────────── progress reaches total ───┘
//! ```

pub mod input;
pub mod machine;
pub mod state;

pub use input::{translate, Event, Key};
pub use machine::{App, DispatchRequest, Transition};
pub use state::{AppState, Session, MAX_URL_CHARS};

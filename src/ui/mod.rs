// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal presentation: palette and screen rendering.

pub mod render;
pub mod theme;

pub use render::{compose, Renderer};
pub use theme::Theme;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observable viewer state.

use serde::Serialize;
use vitrine_core::human_errors::HumanError;

use crate::zoom::Scale;

/// Per-session view state. Created at mount, discarded at unmount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub scale: Scale,
    /// Host window in the foreground. Hiding is presentational only.
    pub visible: bool,
    pub voice_reading: bool,
    pub render_error: bool,
    pub is_compact_layout: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: Scale::ONE,
            visible: true,
            voice_reading: false,
            render_error: false,
            is_compact_layout: false,
        }
    }
}

/// Where the current session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Unmounted,
    /// Mounted without content; shows the placeholder only.
    Empty,
    Rendering,
    Ready,
    RenderFailed,
}

/// State of the voice toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoiceControl {
    /// No engine, or no readable text.
    Hidden,
    /// Text extraction still running.
    Pending,
    Play,
    Stop,
}

/// What the toolbar offers right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    pub zoom_label: String,
    pub voice: VoiceControl,
}

/// Offered after a render failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub notice: HumanError,
    /// Link for opening the document outside the viewer, when one exists.
    pub href: Option<String>,
}

/// Result of a voice toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceToggle {
    Started,
    Stopped,
    /// Extraction has not finished; the request is dropped, not queued.
    NotYetAvailable,
    Unavailable,
}

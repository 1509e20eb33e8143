// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events delivered to the shell from background tasks and host callbacks.
//
// Session-scoped events carry the generation of the mount that produced
// them; the shell drops any whose generation is no longer current.

use vitrine_bridge::traits::{UtteranceId, UtteranceOutcome};
use vitrine_core::human_errors::HumanError;
use vitrine_core::types::ExtractedText;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// Content is on screen. `pages` is 0 when the host does not report it.
    Rendered { generation: u64, pages: u32 },
    RenderFailed {
        generation: u64,
        notice: HumanError,
        reason: String,
    },
    TextReady {
        generation: u64,
        text: ExtractedText,
    },
    VisibilityChanged { generation: u64, visible: bool },
    ClockTick { generation: u64 },
    /// Raw resize report from the host, before debouncing.
    Resized {
        generation: u64,
        width: u32,
        height: u32,
    },
    /// The last resize of a burst, after the quiet period.
    ResizeSettled {
        generation: u64,
        seq: u64,
        width: u32,
        height: u32,
    },
    VoiceEnded {
        id: UtteranceId,
        outcome: UtteranceOutcome,
    },
}

impl ShellEvent {
    /// Generation of the mount that produced the event, if session-scoped.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Rendered { generation, .. }
            | Self::RenderFailed { generation, .. }
            | Self::TextReady { generation, .. }
            | Self::VisibilityChanged { generation, .. }
            | Self::ClockTick { generation }
            | Self::Resized { generation, .. }
            | Self::ResizeSettled { generation, .. } => Some(*generation),
            Self::VoiceEnded { .. } => None,
        }
    }
}

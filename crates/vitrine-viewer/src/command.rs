// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer commands and their keyboard shortcuts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewerCommand {
    ZoomIn,
    ZoomOut,
    ToggleVoice,
    /// Stop voice reading if it is running.
    Escape,
}

impl ViewerCommand {
    /// Shortcut for a logical key value, if any.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "+" | "=" => Some(Self::ZoomIn),
            "-" => Some(Self::ZoomOut),
            " " | "Space" | "Spacebar" | "Enter" => Some(Self::ToggleVoice),
            "Escape" | "Esc" => Some(Self::Escape),
            _ => None,
        }
    }
}

/// Where keyboard focus sat when a key arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyFocus {
    #[default]
    Document,
    /// A text field; shortcuts belong to the field.
    TextInput,
}

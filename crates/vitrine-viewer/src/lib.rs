// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! vitrine-viewer — The protected document viewer.
//!
//! `ViewerShell` mounts one document at a time: it installs the input guard
//! and visibility monitor, tiles the identity overlay, renders the content
//! through the host bridge, extracts text for read-aloud, and tears all of it
//! down again on unmount.

pub mod command;
pub mod events;
pub mod render;
pub mod shell;
pub mod state;
pub mod voice;
pub mod zoom;

pub use command::{KeyFocus, ViewerCommand};
pub use events::ShellEvent;
pub use render::Renderer;
pub use shell::ViewerShell;
pub use state::{Controls, Fallback, Phase, ViewState, VoiceControl, VoiceToggle};
pub use voice::VoiceReader;
pub use zoom::Scale;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! vitrine-security — Presentation-layer protections for the document viewer.
//!
//! Input suppression, the identifying watermark overlay, foreground
//! monitoring, content integrity checks, and the view log. None of this is an
//! access-control boundary; it deters casual copying and makes leaks
//! attributable.

pub mod guard;
pub mod integrity;
pub mod view_log;
pub mod visibility;
pub mod watermark;

pub use guard::{GuardHandle, GuardSlot, InputGuard};
pub use integrity::{hash_bytes, verify_hash};
pub use view_log::{SqliteViewLog, ViewRecorder};
pub use visibility::VisibilityMonitor;
pub use watermark::OverlayTiler;

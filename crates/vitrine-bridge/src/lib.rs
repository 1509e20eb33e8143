// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Vitrine — Host surface abstractions.
//!
//! Defines the traits through which the viewer reaches its host: input
//! listeners, sub-surface insertion, injected styles, content presentation,
//! foreground state, and speech synthesis. Every registration returns a token
//! so teardown can release exactly what was installed.

pub mod headless;
pub mod traits;

use std::sync::Arc;

/// Retrieves the bridge implementation for the target platform.
///
/// Desktop builds drive the in-memory registry from the UI toolkit's event
/// handlers, so the headless bridge is the implementation there as well.
pub fn platform_bridge() -> Arc<headless::HeadlessBridge> {
    #[cfg(any(target_os = "ios", target_os = "android"))]
    {
        Arc::new(headless::HeadlessBridge::compact())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Arc::new(headless::HeadlessBridge::new())
    }
}

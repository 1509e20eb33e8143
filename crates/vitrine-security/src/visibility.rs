// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visibility monitor — tracks whether the hosting window is in the
// foreground and fans transitions out to subscribers.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::{debug, instrument};
use vitrine_bridge::traits::{PlatformBridge, WatchId};
use vitrine_core::error::Result;

struct MonitorState {
    visible: bool,
    subscribers: Vec<mpsc::UnboundedSender<bool>>,
    closed: bool,
}

impl MonitorState {
    /// Apply a report. Returns `true` on a transition.
    fn report(&mut self, visible: bool) -> bool {
        if self.closed || self.visible == visible {
            return false;
        }
        self.visible = visible;
        self.subscribers.retain(|tx| tx.send(visible).is_ok());
        debug!(visible, subscribers = self.subscribers.len(), "visibility changed");
        true
    }
}

/// Current foreground state plus ordered change notifications.
pub struct VisibilityMonitor {
    state: Arc<Mutex<MonitorState>>,
    source: Option<(Arc<dyn PlatformBridge>, WatchId)>,
}

impl VisibilityMonitor {
    /// Detached monitor. `None` means the host cannot tell, so visible.
    pub fn new(initial: Option<bool>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MonitorState {
                visible: initial.unwrap_or(true),
                subscribers: Vec::new(),
                closed: false,
            })),
            source: None,
        }
    }

    /// Monitor driven by the host's foreground signal.
    #[instrument(skip_all, fields(platform = host.platform_name()))]
    pub fn attach(host: Arc<dyn PlatformBridge>) -> Result<Self> {
        let mut monitor = Self::new(host.is_foreground());
        let weak: Weak<Mutex<MonitorState>> = Arc::downgrade(&monitor.state);
        let watch = host.watch_foreground(Arc::new(move |visible| {
            if let Some(state) = weak.upgrade() {
                state
                    .lock()
                    .expect("visibility state lock poisoned")
                    .report(visible);
            }
        }))?;
        monitor.source = Some((host, watch));
        Ok(monitor)
    }

    pub fn is_visible(&self) -> bool {
        self.state
            .lock()
            .expect("visibility state lock poisoned")
            .visible
    }

    /// Receive every subsequent transition, in order. A closed monitor hands
    /// out receivers that end immediately.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<bool> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().expect("visibility state lock poisoned");
        if !state.closed {
            state.subscribers.push(tx);
        }
        rx
    }

    /// Feed a foreground report by hand. Returns `true` on a transition.
    pub fn report(&self, visible: bool) -> bool {
        self.state
            .lock()
            .expect("visibility state lock poisoned")
            .report(visible)
    }

    /// Stop watching the host and drop every subscriber.
    pub fn close(&mut self) {
        if let Some((host, watch)) = self.source.take() {
            host.unwatch_foreground(watch);
        }
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            state.subscribers.clear();
        }
    }
}

impl Drop for VisibilityMonitor {
    fn drop(&mut self) {
        self.close();
    }
}

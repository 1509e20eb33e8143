// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host surface.
//
// The viewer never touches a DOM, a webview, or a native view directly. It
// registers listeners, watchers, and styles through these traits and gets a
// token back for each one, so that teardown can release exactly what was
// installed.

use std::sync::Arc;

use tokio::sync::oneshot;
use vitrine_core::error::Result;
use vitrine_core::types::{ContentLocator, PageRaster};

/// Token for an installed input listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Token for an installed watcher (insertion, resize, or foreground).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

/// Token for an injected stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub u64);

/// Identifier of an embedded sub-surface (e.g. the frame hosting the PDF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubSurfaceId(pub u64);

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// The hosting document/window.
    Root,
    /// An embedded sub-surface reachable from the root.
    Sub(SubSurfaceId),
}

/// Input event categories the viewer may intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    KeyDown,
    ContextMenu,
    DragStart,
    SelectStart,
    TouchStart,
    PointerDown,
    DoubleClick,
}

/// Modifier keys held during an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A host input event travelling through installed listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    /// Logical key value for `KeyDown` (e.g. `"s"`, `"F12"`, `"Escape"`).
    pub key: Option<String>,
    pub modifiers: Modifiers,
    /// Number of simultaneous touch points for `TouchStart`.
    pub touch_points: u32,
    /// Pointer button for `PointerDown` (0 primary, 1 middle, 2 secondary).
    pub button: Option<u16>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl InputEvent {
    fn of(kind: InputKind) -> Self {
        Self {
            kind,
            key: None,
            modifiers: Modifiers::NONE,
            touch_points: 0,
            button: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn key_down(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: Some(key.into()),
            modifiers,
            ..Self::of(InputKind::KeyDown)
        }
    }

    pub fn context_menu() -> Self {
        Self::of(InputKind::ContextMenu)
    }

    pub fn drag_start() -> Self {
        Self::of(InputKind::DragStart)
    }

    pub fn select_start() -> Self {
        Self::of(InputKind::SelectStart)
    }

    pub fn touch_start(touch_points: u32) -> Self {
        Self {
            touch_points,
            ..Self::of(InputKind::TouchStart)
        }
    }

    pub fn pointer_down(button: u16) -> Self {
        Self {
            button: Some(button),
            ..Self::of(InputKind::PointerDown)
        }
    }

    pub fn double_click() -> Self {
        Self::of(InputKind::DoubleClick)
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type InputHandler = Arc<dyn Fn(&mut InputEvent) + Send + Sync>;
pub type InsertionCallback = Arc<dyn Fn(SubSurfaceId) + Send + Sync>;
pub type ResizeCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;
pub type ForegroundCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Unified bridge that groups every host capability the viewer consumes.
pub trait PlatformBridge:
    EventSurface + ContentSurface + ForegroundSignal + SpeechSynthesis + Send + Sync
{
    /// Human-readable platform name (e.g. "Desktop", "iOS 17").
    fn platform_name(&self) -> &str;

    /// Whether the host is a constrained (mobile) surface that should use the
    /// paginated raster path instead of an embedded frame.
    fn is_compact(&self) -> bool;
}

/// Listener, watcher, and style registration on the host surface.
pub trait EventSurface {
    /// Attach `handler` to `kind` events on `target`, in capture phase.
    fn add_listener(
        &self,
        target: SurfaceTarget,
        kind: InputKind,
        handler: InputHandler,
    ) -> Result<ListenerId>;

    /// Detach a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// The embedded sub-surface, if one is currently inserted and reachable.
    fn embedded_surface(&self) -> Option<SubSurfaceId>;

    /// Notify `callback` whenever a sub-surface is inserted under the root.
    fn watch_insertions(&self, callback: InsertionCallback) -> Result<WatchId>;

    /// Stop an insertion watcher. Unknown ids are ignored.
    fn unwatch_insertions(&self, id: WatchId);

    /// Inject a stylesheet into the root surface.
    fn inject_style(&self, css: &str) -> Result<StyleId>;

    /// Remove an injected stylesheet. Unknown ids are ignored.
    fn remove_style(&self, id: StyleId);
}

/// Content presentation on the host surface.
pub trait ContentSurface {
    /// Desktop path: embed the document in a frame pointing at `locator`.
    fn embed_document(&self, locator: &ContentLocator, title: &str) -> Result<()>;

    /// Compact path: present pre-paginated pages for rasterization.
    fn present_pages(&self, pages: &[PageRaster]) -> Result<()>;

    /// Remove whatever content was presented.
    fn clear_content(&self);

    /// Open `href` outside the viewer (system browser).
    fn open_external(&self, href: &str) -> Result<()>;

    /// Current scrollable container size, if measured.
    fn container_size(&self) -> Option<(u32, u32)>;

    /// Notify `callback` on container resize.
    fn watch_resize(&self, callback: ResizeCallback) -> Result<WatchId>;

    /// Stop a resize watcher. Unknown ids are ignored.
    fn unwatch_resize(&self, id: WatchId);
}

/// Foreground/focus state of the hosting window or tab.
pub trait ForegroundSignal {
    /// `None` when the host cannot tell.
    fn is_foreground(&self) -> Option<bool>;

    /// Notify `callback` on every foreground report.
    fn watch_foreground(&self, callback: ForegroundCallback) -> Result<WatchId>;

    /// Stop a foreground watcher. Unknown ids are ignored.
    fn unwatch_foreground(&self, id: WatchId);
}

/// Access to an optional speech synthesis engine.
pub trait SpeechSynthesis {
    /// `None` when the host has no engine; voice controls are then hidden.
    fn speech_engine(&self) -> Option<Arc<dyn SpeechEngine>>;
}

/// Identifier of one utterance handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    Completed,
    Cancelled,
    Errored(String),
}

/// A running utterance: its id and the channel its outcome arrives on.
#[derive(Debug)]
pub struct Utterance {
    pub id: UtteranceId,
    pub outcome: oneshot::Receiver<UtteranceOutcome>,
}

/// Text-to-speech engine.
pub trait SpeechEngine: Send + Sync {
    /// Start speaking `text`. Returns immediately; the outcome arrives later.
    fn speak(&self, text: &str, rate: f32) -> Result<Utterance>;

    /// Cancel all speech synchronously. Pending outcomes resolve `Cancelled`.
    fn cancel(&self);
}

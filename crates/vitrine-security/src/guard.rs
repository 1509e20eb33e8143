// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input guard — suppresses copy/export input paths on the host surface.
//
// Listeners go on the root surface at install time and on the embedded
// sub-surface as soon as it is reachable. A print-blocking stylesheet is
// injected for the guard's lifetime. Everything installed is tracked by token
// and released together.
//
// These are presentation-layer deterrents. Anyone with the file URL or a
// camera can still copy the document.

use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, instrument, trace, warn};
use vitrine_bridge::traits::{
    InputEvent, InputHandler, InputKind, ListenerId, Modifiers, PlatformBridge, StyleId,
    SubSurfaceId, SurfaceTarget, WatchId,
};
use vitrine_core::error::Result;

/// Stylesheet that blanks the page when printed.
pub const PRINT_BLOCK_CSS: &str = "@media print {
  body * { display: none !important; }
  body::after {
    content: \"Printing is disabled for security reasons.\";
    display: block;
    font-size: 24px;
    text-align: center;
    padding: 100px;
  }
}";

/// One blocked key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedCombo {
    /// Logical key, compared case-insensitively.
    pub key: &'static str,
    /// Requires Ctrl (or Cmd).
    pub command: bool,
    /// Requires Shift.
    pub shift: bool,
    pub action: &'static str,
}

const fn combo(key: &'static str, command: bool, shift: bool, action: &'static str) -> BlockedCombo {
    BlockedCombo {
        key,
        command,
        shift,
        action,
    }
}

/// Key combinations the guard swallows.
pub const BLOCKED_COMBOS: &[BlockedCombo] = &[
    combo("c", true, false, "copy"),
    combo("x", true, false, "cut"),
    combo("v", true, false, "paste"),
    combo("s", true, false, "save"),
    combo("p", true, false, "print"),
    combo("a", true, false, "select all"),
    combo("u", true, false, "view source"),
    combo("i", true, true, "developer tools"),
    combo("j", true, true, "developer console"),
    combo("c", true, true, "element inspector"),
    combo("F12", false, false, "developer tools"),
    combo("PrintScreen", false, false, "screenshot"),
];

/// First blocked combination matched by `key` with `modifiers`, if any.
///
/// Extra modifiers never prevent a match: Ctrl+Alt+S is still a save.
pub fn blocked_combo(key: &str, modifiers: &Modifiers) -> Option<&'static BlockedCombo> {
    BLOCKED_COMBOS.iter().find(|combo| {
        combo.key.eq_ignore_ascii_case(key)
            && (!combo.command || modifiers.command())
            && (!combo.shift || modifiers.shift)
    })
}

pub fn is_blocked_key(key: &str, modifiers: &Modifiers) -> bool {
    blocked_combo(key, modifiers).is_some()
}

/// Event kinds guarded on the root surface.
const ROOT_KINDS: &[InputKind] = &[
    InputKind::KeyDown,
    InputKind::ContextMenu,
    InputKind::DragStart,
    InputKind::SelectStart,
    InputKind::TouchStart,
];

/// Event kinds guarded on the embedded content. Pointer and double-click
/// suppression only applies here so the toolbar stays clickable.
const CONTENT_KINDS: &[InputKind] = &[
    InputKind::KeyDown,
    InputKind::ContextMenu,
    InputKind::DragStart,
    InputKind::SelectStart,
    InputKind::TouchStart,
    InputKind::PointerDown,
    InputKind::DoubleClick,
];

/// Middle button; left through so the content can still be scrolled.
const SCROLL_BUTTON: u16 = 1;

/// Decide whether an event must be swallowed.
pub fn should_suppress(event: &InputEvent) -> bool {
    match event.kind {
        InputKind::KeyDown => event
            .key
            .as_deref()
            .is_some_and(|key| is_blocked_key(key, &event.modifiers)),
        InputKind::ContextMenu | InputKind::DragStart | InputKind::SelectStart => true,
        InputKind::TouchStart => event.touch_points > 1,
        InputKind::PointerDown => event.button != Some(SCROLL_BUTTON),
        InputKind::DoubleClick => true,
    }
}

fn suppressing_handler(surface: &'static str) -> InputHandler {
    Arc::new(move |event: &mut InputEvent| {
        if should_suppress(event) {
            event.prevent_default();
            event.stop_propagation();
            trace!(surface, kind = ?event.kind, key = ?event.key, "input suppressed");
        }
    })
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

struct GuardState {
    host: Arc<dyn PlatformBridge>,
    listeners: Vec<ListenerId>,
    insertion_watch: Option<WatchId>,
    style: Option<StyleId>,
    content: Option<SubSurfaceId>,
    released: bool,
}

impl GuardState {
    fn attach(&mut self, target: SurfaceTarget, kinds: &[InputKind], surface: &'static str) -> Result<()> {
        for kind in kinds {
            let id = self
                .host
                .add_listener(target, *kind, suppressing_handler(surface))?;
            self.listeners.push(id);
        }
        Ok(())
    }

    fn attach_content(&mut self, sub: SubSurfaceId) -> Result<()> {
        self.attach(SurfaceTarget::Sub(sub), CONTENT_KINDS, "content")?;
        self.content = Some(sub);
        debug!(sub_surface = sub.0, "guard attached to embedded content");
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(watch) = self.insertion_watch.take() {
            self.host.unwatch_insertions(watch);
        }
        for id in self.listeners.drain(..) {
            self.host.remove_listener(id);
        }
        if let Some(style) = self.style.take() {
            self.host.remove_style(style);
        }
        debug!("input guard released");
    }
}

/// Installs input interception on a host surface.
pub struct InputGuard;

impl InputGuard {
    /// Install the guard on `host`.
    ///
    /// If installation fails halfway, whatever was already registered is
    /// released before the error is returned.
    #[instrument(skip_all, fields(platform = host.platform_name()))]
    pub fn install(host: Arc<dyn PlatformBridge>) -> Result<GuardHandle> {
        let state = Arc::new(Mutex::new(GuardState {
            host: Arc::clone(&host),
            listeners: Vec::new(),
            insertion_watch: None,
            style: None,
            content: None,
            released: false,
        }));
        let handle = GuardHandle {
            state: Arc::clone(&state),
        };

        {
            let mut guard = state.lock().expect("guard state lock poisoned");
            guard.style = Some(host.inject_style(PRINT_BLOCK_CSS)?);
            guard.attach(SurfaceTarget::Root, ROOT_KINDS, "root")?;

            match host.embedded_surface() {
                Some(sub) => guard.attach_content(sub)?,
                None => {
                    let weak = Arc::downgrade(&state);
                    let watch = host.watch_insertions(Arc::new(move |sub| on_insertion(&weak, sub)))?;
                    guard.insertion_watch = Some(watch);
                    debug!("waiting for embedded content");
                }
            }
        }

        Ok(handle)
    }
}

/// One-shot: the first insertion attaches content listeners and disconnects
/// the watcher.
fn on_insertion(state: &Weak<Mutex<GuardState>>, sub: SubSurfaceId) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut guard = state.lock().expect("guard state lock poisoned");
    if guard.released || guard.content.is_some() {
        return;
    }
    if let Some(watch) = guard.insertion_watch.take() {
        guard.host.unwatch_insertions(watch);
    }
    if let Err(e) = guard.attach_content(sub) {
        warn!(error = %e, "could not guard embedded content");
    }
}

/// Scoped guard installation. Released explicitly or on drop.
pub struct GuardHandle {
    state: Arc<Mutex<GuardState>>,
}

impl GuardHandle {
    /// Remove every listener, the insertion watcher, and the injected style.
    /// Safe to call more than once.
    pub fn release(&self) {
        self.state
            .lock()
            .expect("guard state lock poisoned")
            .release();
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().expect("guard state lock poisoned").released
    }

    /// Whether the embedded content is guarded yet.
    pub fn covers_content(&self) -> bool {
        self.state
            .lock()
            .expect("guard state lock poisoned")
            .content
            .is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.state
            .lock()
            .expect("guard state lock poisoned")
            .listeners
            .len()
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.release();
        }
    }
}

/// Holds at most one active guard.
#[derive(Default)]
pub struct GuardSlot {
    current: Option<GuardHandle>,
}

impl GuardSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release any previous guard, then install a fresh one.
    pub fn install(&mut self, host: Arc<dyn PlatformBridge>) -> Result<()> {
        self.release();
        self.current = Some(InputGuard::install(host)?);
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn handle(&self) -> Option<&GuardHandle> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_bridge::headless::HeadlessBridge;

    fn host() -> Arc<HeadlessBridge> {
        Arc::new(HeadlessBridge::new())
    }

    fn press(bridge: &HeadlessBridge, key: &str, modifiers: Modifiers) -> InputEvent {
        let mut event = InputEvent::key_down(key, modifiers);
        bridge.dispatch(SurfaceTarget::Root, &mut event);
        event
    }

    #[test]
    fn denylist_matching() {
        assert!(is_blocked_key("s", &Modifiers::ctrl()));
        assert!(is_blocked_key("S", &Modifiers::meta()));
        assert!(is_blocked_key("I", &Modifiers::ctrl_shift()));
        assert!(is_blocked_key("F12", &Modifiers::NONE));
        assert!(is_blocked_key("printscreen", &Modifiers::NONE));
        assert!(!is_blocked_key("s", &Modifiers::NONE));
        assert!(!is_blocked_key("i", &Modifiers::ctrl()));
        assert!(!is_blocked_key("b", &Modifiers::ctrl()));
    }

    #[test]
    fn extra_modifiers_still_match() {
        let mods = Modifiers {
            alt: true,
            ..Modifiers::ctrl()
        };
        assert_eq!(blocked_combo("p", &mods).map(|c| c.action), Some("print"));
    }

    #[test]
    fn ctrl_s_is_swallowed_and_bare_s_passes() {
        let bridge = host();
        let _guard = InputGuard::install(bridge.clone()).unwrap();

        let save = press(&bridge, "s", Modifiers::ctrl());
        assert!(save.is_default_prevented());
        assert!(save.is_propagation_stopped());

        let typed = press(&bridge, "s", Modifiers::NONE);
        assert!(!typed.is_default_prevented());
        assert!(!typed.is_propagation_stopped());
    }

    #[test]
    fn pointer_rules() {
        assert!(should_suppress(&InputEvent::pointer_down(0)));
        assert!(should_suppress(&InputEvent::pointer_down(2)));
        assert!(!should_suppress(&InputEvent::pointer_down(1)));
        assert!(!should_suppress(&InputEvent::touch_start(1)));
        assert!(should_suppress(&InputEvent::touch_start(2)));
        assert!(should_suppress(&InputEvent::double_click()));
    }

    #[test]
    fn root_leaves_clicks_alone() {
        let bridge = host();
        let _guard = InputGuard::install(bridge.clone()).unwrap();
        let mut click = InputEvent::pointer_down(0);
        bridge.dispatch(SurfaceTarget::Root, &mut click);
        assert!(!click.is_default_prevented());
    }

    #[test]
    fn print_style_lives_with_the_guard() {
        let bridge = host();
        let guard = InputGuard::install(bridge.clone()).unwrap();
        assert_eq!(bridge.styles(), vec![PRINT_BLOCK_CSS.to_owned()]);
        guard.release();
        assert!(bridge.styles().is_empty());
    }

    #[test]
    fn attaches_to_existing_content_immediately() {
        let bridge = host();
        let sub = bridge.insert_sub_surface();
        let guard = InputGuard::install(bridge.clone()).unwrap();
        assert!(guard.covers_content());
        assert_eq!(bridge.insertion_watcher_count(), 0);

        let mut menu = InputEvent::context_menu();
        bridge.dispatch(SurfaceTarget::Sub(sub), &mut menu);
        assert!(menu.is_default_prevented());
    }

    #[test]
    fn late_content_is_guarded_once() {
        let bridge = host();
        let guard = InputGuard::install(bridge.clone()).unwrap();
        assert!(!guard.covers_content());
        assert_eq!(bridge.insertion_watcher_count(), 1);

        let sub = bridge.insert_sub_surface();
        assert!(guard.covers_content());
        assert_eq!(bridge.insertion_watcher_count(), 0);
        let after_first = bridge.listener_count();

        // A second insertion reaches no watcher and adds nothing.
        bridge.insert_sub_surface();
        assert_eq!(bridge.listener_count(), after_first);

        let mut copy = InputEvent::key_down("c", Modifiers::meta());
        bridge.dispatch(SurfaceTarget::Sub(sub), &mut copy);
        assert!(copy.is_default_prevented());
    }

    #[test]
    fn release_is_idempotent_and_complete() {
        let bridge = host();
        let guard = InputGuard::install(bridge.clone()).unwrap();
        assert!(bridge.listener_count() > 0);

        guard.release();
        guard.release();
        assert!(guard.is_released());
        assert_eq!(bridge.listener_count(), 0);
        assert_eq!(bridge.watcher_count(), 0);

        let save = press(&bridge, "s", Modifiers::ctrl());
        assert!(!save.is_default_prevented());
    }

    #[test]
    fn drop_releases() {
        let bridge = host();
        {
            let _guard = InputGuard::install(bridge.clone()).unwrap();
            assert!(bridge.listener_count() > 0);
        }
        assert_eq!(bridge.listener_count(), 0);
        assert!(bridge.styles().is_empty());
    }

    #[test]
    fn insertion_after_release_attaches_nothing() {
        let bridge = host();
        let guard = InputGuard::install(bridge.clone()).unwrap();
        guard.release();
        bridge.insert_sub_surface();
        assert_eq!(bridge.listener_count(), 0);
    }

    #[test]
    fn slot_reinstall_leaves_one_guard() {
        let bridge = host();
        let mut slot = GuardSlot::new();
        slot.install(bridge.clone()).unwrap();
        let single = bridge.listener_count();
        slot.install(bridge.clone()).unwrap();
        assert_eq!(bridge.listener_count(), single);
        assert_eq!(bridge.styles().len(), 1);

        slot.release();
        assert!(!slot.is_active());
        assert_eq!(bridge.listener_count(), 0);
    }
}

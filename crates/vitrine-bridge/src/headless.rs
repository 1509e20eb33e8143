// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory host surface.
//
// Keeps every listener, watcher, and style in a registry and lets the owner
// drive the surface by hand: dispatch input, insert the embedded frame,
// resize, flip foreground state. Used by tests and as the listener registry
// of the desktop app, whose webview events are forwarded through `dispatch`.
// Every registration and removal is appended to a journal so teardown order
// can be checked.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, warn};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::{ContentLocator, PageRaster};

use crate::traits::*;

/// What the surface currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentedContent {
    Nothing,
    Frame { href: String, title: String },
    Pages(Vec<PageRaster>),
}

struct Registered<T> {
    target: SurfaceTarget,
    kind: InputKind,
    handler: T,
}

struct HeadlessState {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Registered<InputHandler>>,
    insertion_watchers: BTreeMap<WatchId, InsertionCallback>,
    resize_watchers: BTreeMap<WatchId, ResizeCallback>,
    foreground_watchers: BTreeMap<WatchId, ForegroundCallback>,
    styles: BTreeMap<StyleId, String>,
    sub_surface: Option<SubSurfaceId>,
    foreground: Option<bool>,
    size: Option<(u32, u32)>,
    content: PresentedContent,
    fail_rendering: bool,
    external_opens: Vec<String>,
}

impl HeadlessState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory `PlatformBridge`.
pub struct HeadlessBridge {
    name: String,
    compact: bool,
    state: Mutex<HeadlessState>,
    journal: Arc<Mutex<Vec<String>>>,
    speech: Option<Arc<ScriptedSpeech>>,
}

impl Default for HeadlessBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBridge {
    /// Desktop-like surface: foreground, unmeasured, no speech engine.
    pub fn new() -> Self {
        Self {
            name: "Desktop (headless)".into(),
            compact: false,
            state: Mutex::new(HeadlessState {
                next_id: 0,
                listeners: BTreeMap::new(),
                insertion_watchers: BTreeMap::new(),
                resize_watchers: BTreeMap::new(),
                foreground_watchers: BTreeMap::new(),
                styles: BTreeMap::new(),
                sub_surface: None,
                foreground: Some(true),
                size: None,
                content: PresentedContent::Nothing,
                fail_rendering: false,
                external_opens: Vec::new(),
            }),
            journal: Arc::new(Mutex::new(Vec::new())),
            speech: None,
        }
    }

    /// Constrained (mobile-like) surface.
    pub fn compact() -> Self {
        Self {
            name: "Mobile (headless)".into(),
            compact: true,
            ..Self::new()
        }
    }

    /// Attach a scripted speech engine sharing this surface's journal.
    pub fn with_speech(mut self) -> Self {
        self.speech = Some(Arc::new(ScriptedSpeech::with_journal(Arc::clone(
            &self.journal,
        ))));
        self
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        self.lock().size = Some((width, height));
        self
    }

    pub fn with_foreground(self, foreground: Option<bool>) -> Self {
        self.lock().foreground = foreground;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HeadlessState> {
        self.state.lock().expect("headless state lock poisoned")
    }

    fn record(&self, entry: &str) {
        self.journal
            .lock()
            .expect("journal lock poisoned")
            .push(entry.to_owned());
    }

    // -- Driving the surface ----------------------------------------------

    /// Deliver `event` to every listener registered for its kind on `target`,
    /// in registration order, until one stops propagation.
    pub fn dispatch(&self, target: SurfaceTarget, event: &mut InputEvent) {
        let handlers: Vec<InputHandler> = self
            .lock()
            .listeners
            .values()
            .filter(|l| l.target == target && l.kind == event.kind)
            .map(|l| Arc::clone(&l.handler))
            .collect();

        for handler in handlers {
            handler(event);
            if event.is_propagation_stopped() {
                break;
            }
        }
    }

    /// Simulate the embedded frame finishing its load.
    pub fn insert_sub_surface(&self) -> SubSurfaceId {
        let (id, watchers) = {
            let mut state = self.lock();
            let id = SubSurfaceId(state.next());
            state.sub_surface = Some(id);
            let watchers: Vec<InsertionCallback> =
                state.insertion_watchers.values().cloned().collect();
            (id, watchers)
        };
        debug!(sub_surface = id.0, watchers = watchers.len(), "sub-surface inserted");
        for watcher in watchers {
            watcher(id);
        }
        id
    }

    /// Remove the embedded frame along with listeners bound to it.
    pub fn remove_sub_surface(&self) {
        let mut state = self.lock();
        if let Some(id) = state.sub_surface.take() {
            state
                .listeners
                .retain(|_, l| l.target != SurfaceTarget::Sub(id));
        }
    }

    /// Report a foreground change from the host window.
    pub fn set_foreground(&self, foreground: bool) {
        let watchers: Vec<ForegroundCallback> = {
            let mut state = self.lock();
            state.foreground = Some(foreground);
            state.foreground_watchers.values().cloned().collect()
        };
        for watcher in watchers {
            watcher(foreground);
        }
    }

    /// Report a container resize.
    pub fn resize(&self, width: u32, height: u32) {
        let watchers: Vec<ResizeCallback> = {
            let mut state = self.lock();
            state.size = Some((width, height));
            state.resize_watchers.values().cloned().collect()
        };
        for watcher in watchers {
            watcher(width, height);
        }
    }

    /// Make subsequent `embed_document`/`present_pages` calls fail.
    pub fn fail_rendering(&self, fail: bool) {
        self.lock().fail_rendering = fail;
    }

    // -- Inspection -------------------------------------------------------

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn listener_count_on(&self, target: SurfaceTarget) -> usize {
        self.lock()
            .listeners
            .values()
            .filter(|l| l.target == target)
            .count()
    }

    /// Insertion, resize, and foreground watchers combined.
    pub fn watcher_count(&self) -> usize {
        let state = self.lock();
        state.insertion_watchers.len() + state.resize_watchers.len() + state.foreground_watchers.len()
    }

    pub fn insertion_watcher_count(&self) -> usize {
        self.lock().insertion_watchers.len()
    }

    pub fn styles(&self) -> Vec<String> {
        self.lock().styles.values().cloned().collect()
    }

    pub fn content(&self) -> PresentedContent {
        self.lock().content.clone()
    }

    pub fn external_opens(&self) -> Vec<String> {
        self.lock().external_opens.clone()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().expect("journal lock poisoned").clone()
    }

    pub fn scripted_speech(&self) -> Option<Arc<ScriptedSpeech>> {
        self.speech.clone()
    }
}

impl PlatformBridge for HeadlessBridge {
    fn platform_name(&self) -> &str {
        &self.name
    }

    fn is_compact(&self) -> bool {
        self.compact
    }
}

impl EventSurface for HeadlessBridge {
    fn add_listener(
        &self,
        target: SurfaceTarget,
        kind: InputKind,
        handler: InputHandler,
    ) -> Result<ListenerId> {
        let mut state = self.lock();
        if let SurfaceTarget::Sub(id) = target {
            if state.sub_surface != Some(id) {
                return Err(VitrineError::Bridge(format!(
                    "sub-surface {} is not attached",
                    id.0
                )));
            }
        }
        let id = ListenerId(state.next());
        state.listeners.insert(
            id,
            Registered {
                target,
                kind,
                handler,
            },
        );
        drop(state);
        self.record("listener.add");
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        if self.lock().listeners.remove(&id).is_some() {
            self.record("listener.remove");
        }
    }

    fn embedded_surface(&self) -> Option<SubSurfaceId> {
        self.lock().sub_surface
    }

    fn watch_insertions(&self, callback: InsertionCallback) -> Result<WatchId> {
        let mut state = self.lock();
        let id = WatchId(state.next());
        state.insertion_watchers.insert(id, callback);
        drop(state);
        self.record("watch.insertions");
        Ok(id)
    }

    fn unwatch_insertions(&self, id: WatchId) {
        if self.lock().insertion_watchers.remove(&id).is_some() {
            self.record("unwatch.insertions");
        }
    }

    fn inject_style(&self, css: &str) -> Result<StyleId> {
        let mut state = self.lock();
        let id = StyleId(state.next());
        state.styles.insert(id, css.to_owned());
        drop(state);
        self.record("style.inject");
        Ok(id)
    }

    fn remove_style(&self, id: StyleId) {
        if self.lock().styles.remove(&id).is_some() {
            self.record("style.remove");
        }
    }
}

impl ContentSurface for HeadlessBridge {
    fn embed_document(&self, locator: &ContentLocator, title: &str) -> Result<()> {
        let href = locator.external_href().ok_or_else(|| {
            VitrineError::Bridge(format!("{locator} has no embeddable address"))
        })?;
        let mut state = self.lock();
        if state.fail_rendering {
            return Err(VitrineError::Bridge("frame refused to load".into()));
        }
        state.content = PresentedContent::Frame {
            href,
            title: title.to_owned(),
        };
        drop(state);
        self.record("content.embed");
        Ok(())
    }

    fn present_pages(&self, pages: &[PageRaster]) -> Result<()> {
        let mut state = self.lock();
        if state.fail_rendering {
            return Err(VitrineError::Bridge("rasterizer unavailable".into()));
        }
        state.content = PresentedContent::Pages(pages.to_vec());
        drop(state);
        self.record("content.pages");
        Ok(())
    }

    fn clear_content(&self) {
        self.lock().content = PresentedContent::Nothing;
        self.record("content.clear");
    }

    fn open_external(&self, href: &str) -> Result<()> {
        self.lock().external_opens.push(href.to_owned());
        self.record("open.external");
        Ok(())
    }

    fn container_size(&self) -> Option<(u32, u32)> {
        self.lock().size
    }

    fn watch_resize(&self, callback: ResizeCallback) -> Result<WatchId> {
        let mut state = self.lock();
        let id = WatchId(state.next());
        state.resize_watchers.insert(id, callback);
        drop(state);
        self.record("watch.resize");
        Ok(id)
    }

    fn unwatch_resize(&self, id: WatchId) {
        if self.lock().resize_watchers.remove(&id).is_some() {
            self.record("unwatch.resize");
        }
    }
}

impl ForegroundSignal for HeadlessBridge {
    fn is_foreground(&self) -> Option<bool> {
        self.lock().foreground
    }

    fn watch_foreground(&self, callback: ForegroundCallback) -> Result<WatchId> {
        let mut state = self.lock();
        let id = WatchId(state.next());
        state.foreground_watchers.insert(id, callback);
        drop(state);
        self.record("watch.foreground");
        Ok(id)
    }

    fn unwatch_foreground(&self, id: WatchId) {
        if self.lock().foreground_watchers.remove(&id).is_some() {
            self.record("unwatch.foreground");
        }
    }
}

impl SpeechSynthesis for HeadlessBridge {
    fn speech_engine(&self) -> Option<Arc<dyn SpeechEngine>> {
        self.speech
            .as_ref()
            .map(|engine| Arc::clone(engine) as Arc<dyn SpeechEngine>)
    }
}

// ---------------------------------------------------------------------------
// Scripted speech engine
// ---------------------------------------------------------------------------

struct ActiveUtterance {
    id: UtteranceId,
    sender: oneshot::Sender<UtteranceOutcome>,
}

/// Speech engine whose utterances end only when told to.
///
/// Never produces audio. `finish_current` plays the role of the engine's
/// natural end-of-speech callback.
pub struct ScriptedSpeech {
    next_id: AtomicU64,
    active: Mutex<Vec<ActiveUtterance>>,
    spoken: Mutex<Vec<String>>,
    refuse: AtomicBool,
    journal: Arc<Mutex<Vec<String>>>,
}

impl Default for ScriptedSpeech {
    fn default() -> Self {
        Self::with_journal(Arc::new(Mutex::new(Vec::new())))
    }
}

impl ScriptedSpeech {
    fn with_journal(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            active: Mutex::new(Vec::new()),
            spoken: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
            journal,
        }
    }

    fn record(&self, entry: &str) {
        self.journal
            .lock()
            .expect("journal lock poisoned")
            .push(entry.to_owned());
    }

    /// Utterances currently producing (imaginary) audio.
    pub fn active_count(&self) -> usize {
        self.active.lock().expect("speech lock poisoned").len()
    }

    /// Every text handed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("speech lock poisoned").clone()
    }

    /// Make `speak` fail until reset.
    pub fn refuse_speech(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// End the oldest active utterance naturally. Returns `false` when idle.
    pub fn finish_current(&self) -> bool {
        self.settle_current(UtteranceOutcome::Completed)
    }

    /// End the oldest active utterance with an engine error.
    pub fn fail_current(&self, reason: &str) -> bool {
        self.settle_current(UtteranceOutcome::Errored(reason.to_owned()))
    }

    fn settle_current(&self, outcome: UtteranceOutcome) -> bool {
        let mut active = self.active.lock().expect("speech lock poisoned");
        if active.is_empty() {
            return false;
        }
        let utterance = active.remove(0);
        if utterance.sender.send(outcome).is_err() {
            debug!(utterance = utterance.id.0, "utterance outcome had no listener");
        }
        true
    }
}

impl SpeechEngine for ScriptedSpeech {
    fn speak(&self, text: &str, rate: f32) -> Result<Utterance> {
        if self.refuse.load(Ordering::SeqCst) {
            warn!("scripted speech refused utterance");
            return Err(VitrineError::Speech("engine refused utterance".into()));
        }
        let id = UtteranceId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (sender, outcome) = oneshot::channel();
        self.active
            .lock()
            .expect("speech lock poisoned")
            .push(ActiveUtterance { id, sender });
        self.spoken
            .lock()
            .expect("speech lock poisoned")
            .push(text.to_owned());
        debug!(utterance = id.0, rate, chars = text.len(), "speaking");
        self.record("speech.speak");
        Ok(Utterance { id, outcome })
    }

    fn cancel(&self) {
        let drained: Vec<ActiveUtterance> = self
            .active
            .lock()
            .expect("speech lock poisoned")
            .drain(..)
            .collect();
        for utterance in drained {
            let _ = utterance.sender.send(UtteranceOutcome::Cancelled);
        }
        self.record("speech.cancel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_respects_target_and_kind() {
        let bridge = HeadlessBridge::new();
        let handler: InputHandler = Arc::new(|event: &mut InputEvent| event.prevent_default());
        bridge
            .add_listener(SurfaceTarget::Root, InputKind::ContextMenu, handler)
            .unwrap();

        let mut menu = InputEvent::context_menu();
        bridge.dispatch(SurfaceTarget::Root, &mut menu);
        assert!(menu.is_default_prevented());

        let mut drag = InputEvent::drag_start();
        bridge.dispatch(SurfaceTarget::Root, &mut drag);
        assert!(!drag.is_default_prevented());
    }

    #[test]
    fn stop_propagation_skips_later_listeners() {
        let bridge = HeadlessBridge::new();
        let hits = Arc::new(AtomicU64::new(0));
        let first: InputHandler = Arc::new(|event: &mut InputEvent| event.stop_propagation());
        let counter = Arc::clone(&hits);
        let second: InputHandler = Arc::new(move |_: &mut InputEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        bridge
            .add_listener(SurfaceTarget::Root, InputKind::KeyDown, first)
            .unwrap();
        bridge
            .add_listener(SurfaceTarget::Root, InputKind::KeyDown, second)
            .unwrap();

        let mut key = InputEvent::key_down("a", Modifiers::NONE);
        bridge.dispatch(SurfaceTarget::Root, &mut key);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_on_detached_sub_surface_are_refused() {
        let bridge = HeadlessBridge::new();
        let handler: InputHandler = Arc::new(|_: &mut InputEvent| {});
        let result = bridge.add_listener(
            SurfaceTarget::Sub(SubSurfaceId(99)),
            InputKind::KeyDown,
            handler,
        );
        assert!(result.is_err());
    }

    #[test]
    fn insertion_watchers_see_new_sub_surface() {
        let bridge = HeadlessBridge::new();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        bridge
            .watch_insertions(Arc::new(move |id| {
                *slot.lock().unwrap() = Some(id);
            }))
            .unwrap();

        let id = bridge.insert_sub_surface();
        assert_eq!(*seen.lock().unwrap(), Some(id));
        assert_eq!(bridge.embedded_surface(), Some(id));
    }

    #[test]
    fn handle_locator_cannot_be_embedded() {
        let bridge = HeadlessBridge::new();
        let result = bridge.embed_document(&ContentLocator::Handle("k".into()), "Doc");
        assert!(result.is_err());
        assert_eq!(bridge.content(), PresentedContent::Nothing);
    }

    #[tokio::test]
    async fn scripted_speech_cancel_resolves_outcome() {
        let speech = ScriptedSpeech::default();
        let utterance = speech.speak("hello", 1.0).unwrap();
        assert_eq!(speech.active_count(), 1);
        speech.cancel();
        assert_eq!(speech.active_count(), 0);
        assert_eq!(utterance.outcome.await.unwrap(), UtteranceOutcome::Cancelled);
    }

    #[tokio::test]
    async fn scripted_speech_finish_completes() {
        let speech = ScriptedSpeech::default();
        let utterance = speech.speak("hello", 1.0).unwrap();
        assert!(speech.finish_current());
        assert!(!speech.finish_current());
        assert_eq!(utterance.outcome.await.unwrap(), UtteranceOutcome::Completed);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer shell — owns one viewing session at a time and ties the guard,
// overlay, visibility monitor, renderer, text extraction, and voice reader
// together.
//
// Background work (rendering, extraction, clock, resize settling, voice
// outcomes) reports back as `ShellEvent`s on one channel. Nothing touches
// session state until the owner calls `pump` or `next_event`, so every
// transition happens on the owner's task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info, instrument, warn};
use vitrine_bridge::traits::{PlatformBridge, WatchId};
use vitrine_core::config::ViewerConfig;
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::human_errors::{HumanError, hidden_notice, humanize_error};
use vitrine_core::types::{DocumentDescriptor, ExtractedText, OverlayLabel, ViewEvent, ViewerIdentity};
use vitrine_document::{ContentStore, TextExtractor};
use vitrine_security::view_log::ViewRecorder;
use vitrine_security::watermark::{OverlayTiler, identity_label_now};
use vitrine_security::{GuardSlot, VisibilityMonitor};

use crate::command::{KeyFocus, ViewerCommand};
use crate::events::ShellEvent;
use crate::render::{Renderer, Stage};
use crate::state::{Controls, Fallback, Phase, ViewState, VoiceControl, VoiceToggle};
use crate::voice::VoiceReader;
use crate::zoom::Scale;

enum TextStatus {
    Pending,
    Ready(ExtractedText),
}

struct Session {
    generation: u64,
    descriptor: DocumentDescriptor,
    phase: Phase,
    state: ViewState,
    renderer: Option<Renderer>,
    text: TextStatus,
    voice: VoiceReader,
    guard: GuardSlot,
    monitor: Option<VisibilityMonitor>,
    tiler: OverlayTiler,
    label: String,
    size: Option<(u32, u32)>,
    labels: Vec<OverlayLabel>,
    resize_watch: Option<WatchId>,
    /// Bumped on every raw resize; only the latest settles.
    resize_seq: u64,
    debounce: Option<JoinHandle<()>>,
    tasks: Vec<JoinHandle<()>>,
    failure: Option<HumanError>,
}

impl Session {
    fn retile(&mut self) {
        self.labels = match self.size {
            Some((width, height)) => self.tiler.tile(width, height, &self.label),
            None => Vec::new(),
        };
    }
}

/// The protected document viewer.
///
/// `mount` and the event handlers spawn Tokio tasks and must run inside a
/// runtime.
pub struct ViewerShell {
    host: Arc<dyn PlatformBridge>,
    store: Arc<dyn ContentStore>,
    extractor: Arc<TextExtractor>,
    recorder: Option<Arc<dyn ViewRecorder>>,
    identity: ViewerIdentity,
    config: ViewerConfig,
    jitter_seed: Option<u64>,
    events_tx: mpsc::UnboundedSender<ShellEvent>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,
    generation: u64,
    stage: Stage,
    session: Option<Session>,
}

impl ViewerShell {
    pub fn new(
        host: Arc<dyn PlatformBridge>,
        store: Arc<dyn ContentStore>,
        identity: ViewerIdentity,
        config: ViewerConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let extractor = Arc::new(TextExtractor::new(
            Arc::clone(&store),
            config.extraction_timeout(),
        ));
        Self {
            host,
            store,
            extractor,
            recorder: None,
            identity,
            config,
            jitter_seed: None,
            events_tx,
            events_rx,
            generation: 0,
            stage: Stage::default(),
            session: None,
        }
    }

    /// Log "viewed" events to `recorder`.
    pub fn with_recorder(mut self, recorder: Arc<dyn ViewRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Reproducible overlay jitter.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Open `descriptor`, replacing any current session.
    #[instrument(skip_all, fields(document = %descriptor.id))]
    pub fn mount(&mut self, descriptor: DocumentDescriptor) {
        self.unmount();
        self.generation += 1;
        let generation = self.generation;
        self.stage.open(generation);

        let mut guard = GuardSlot::new();
        if let Err(e) = guard.install(Arc::clone(&self.host)) {
            warn!(error = %e, "input guard could not be installed");
        }

        let monitor = match VisibilityMonitor::attach(Arc::clone(&self.host)) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                warn!(error = %e, "foreground signal unavailable, assuming visible");
                None
            }
        };

        let tiler = match self.jitter_seed {
            Some(seed) => OverlayTiler::seeded(self.config.watermark.clone(), seed),
            None => OverlayTiler::new(self.config.watermark.clone()),
        };

        let mut session = Session {
            generation,
            descriptor,
            phase: Phase::Empty,
            state: ViewState {
                visible: monitor.as_ref().is_none_or(|m| m.is_visible()),
                ..ViewState::default()
            },
            renderer: None,
            text: TextStatus::Ready(ExtractedText::Unavailable),
            voice: VoiceReader::new(
                self.host.speech_engine(),
                self.config.speech_rate,
                self.events_tx.clone(),
            ),
            guard,
            monitor,
            tiler,
            label: identity_label_now(&self.identity),
            size: self.host.container_size(),
            labels: Vec::new(),
            resize_watch: None,
            resize_seq: 0,
            debounce: None,
            tasks: Vec::new(),
            failure: None,
        };

        if let Some(monitor) = &session.monitor {
            session.tasks.push(self.forward_visibility(monitor, generation));
        }
        session.tasks.push(self.spawn_clock(generation));
        session.resize_watch = self.watch_resize(generation);
        session.retile();

        if session.descriptor.locator.is_some() {
            let renderer = Renderer::select(self.host.as_ref(), &self.config);
            session.state.is_compact_layout = renderer.is_compact();
            session.renderer = Some(renderer);
            session.phase = Phase::Rendering;
            session.text = TextStatus::Pending;
            session
                .tasks
                .push(self.spawn_render(renderer, &session.descriptor, generation));
            // Not tracked: a late result is dropped by generation.
            self.spawn_extraction(&session.descriptor, generation);
            self.record_view(&session.descriptor);
            info!(?renderer, "document mounted");
        } else {
            info!("no content attached, showing placeholder");
        }

        self.session = Some(session);
    }

    /// Tear down the current session, if any.
    ///
    /// Order: voice, input guard, visibility monitor, clock and resize
    /// subscriptions, in-flight work, state.
    pub fn unmount(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        session.voice.stop();
        session.guard.release();
        if let Some(mut monitor) = session.monitor.take() {
            monitor.close();
        }
        for task in session.tasks.drain(..) {
            task.abort();
        }
        if let Some(debounce) = session.debounce.take() {
            debounce.abort();
        }
        if let Some(watch) = session.resize_watch.take() {
            self.host.unwatch_resize(watch);
        }
        self.generation += 1;
        let host = Arc::clone(&self.host);
        self.stage.close(move || host.clear_content());

        debug!(document = %session.descriptor.id, "viewer unmounted");
    }

    // -- Background work ------------------------------------------------------

    fn forward_visibility(&self, monitor: &VisibilityMonitor, generation: u64) -> JoinHandle<()> {
        let mut changes = monitor.subscribe();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(visible) = changes.recv().await {
                if events
                    .send(ShellEvent::VisibilityChanged {
                        generation,
                        visible,
                    })
                    .is_err()
                {
                    break;
                }
            }
        })
    }

    fn spawn_clock(&self, generation: u64) -> JoinHandle<()> {
        let events = self.events_tx.clone();
        let period = self.config.clock_refresh();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                if events.send(ShellEvent::ClockTick { generation }).is_err() {
                    break;
                }
            }
        })
    }

    fn watch_resize(&self, generation: u64) -> Option<WatchId> {
        let events = self.events_tx.clone();
        let watch = self.host.watch_resize(Arc::new(move |width, height| {
            let _ = events.send(ShellEvent::Resized {
                generation,
                width,
                height,
            });
        }));
        match watch {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "container resizes will not re-tile the overlay");
                None
            }
        }
    }

    fn spawn_render(
        &self,
        renderer: Renderer,
        descriptor: &DocumentDescriptor,
        generation: u64,
    ) -> JoinHandle<()> {
        let host = Arc::clone(&self.host);
        let store = Arc::clone(&self.store);
        let descriptor = descriptor.clone();
        let stage = self.stage.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match renderer.render(host, store, descriptor, stage, generation).await {
                Ok(pages) => ShellEvent::Rendered { generation, pages },
                Err(e) => ShellEvent::RenderFailed {
                    generation,
                    notice: humanize_error(&e),
                    reason: e.to_string(),
                },
            };
            let _ = events.send(event);
        })
    }

    fn spawn_extraction(&self, descriptor: &DocumentDescriptor, generation: u64) {
        let extractor = Arc::clone(&self.extractor);
        let locator = descriptor.locator.clone();
        let supplied = descriptor.text_content.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let text = extractor.extract(locator.as_ref(), supplied.as_deref()).await;
            let _ = events.send(ShellEvent::TextReady { generation, text });
        });
    }

    /// Fire and forget; failures are logged and otherwise ignored.
    fn record_view(&self, descriptor: &DocumentDescriptor) {
        if !self.config.view_logging_enabled {
            return;
        }
        let Some(recorder) = self.recorder.clone() else {
            return;
        };
        let event = ViewEvent::new(descriptor.id, self.identity.user_id);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = recorder.record(&event) {
                warn!(error = %e, document = %event.document_id, "view was not logged");
            }
        });
    }

    // -- Events ---------------------------------------------------------------

    /// Apply every queued event. Returns how many were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(&event);
            processed += 1;
        }
        processed
    }

    /// Wait for the next event, apply it, and return it.
    pub async fn next_event(&mut self) -> Option<ShellEvent> {
        let event = self.events_rx.recv().await?;
        self.apply(&event);
        Some(event)
    }

    fn apply(&mut self, event: &ShellEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let ShellEvent::VoiceEnded { id, outcome } = event {
            if session.voice.on_ended(*id, outcome) {
                session.state.voice_reading = false;
            }
            return;
        }
        if event.generation() != Some(session.generation) {
            debug!(?event, "dropping event from an earlier session");
            return;
        }

        match event {
            ShellEvent::Rendered { pages, .. } => {
                session.phase = Phase::Ready;
                session.state.render_error = false;
                info!(pages, "document rendered");
            }
            ShellEvent::RenderFailed { notice, reason, .. } => {
                error!(%reason, "document could not be rendered");
                session.phase = Phase::RenderFailed;
                session.state.render_error = true;
                session.failure = Some(notice.clone());
            }
            ShellEvent::TextReady { text, .. } => {
                debug!(available = text.is_available(), "document text ready");
                session.text = TextStatus::Ready(text.clone());
            }
            ShellEvent::VisibilityChanged { visible, .. } => {
                session.state.visible = *visible;
            }
            ShellEvent::ClockTick { .. } => {
                let label = identity_label_now(&self.identity);
                if label != session.label {
                    session.label = label;
                    session.retile();
                }
            }
            ShellEvent::Resized {
                generation,
                width,
                height,
            } => {
                session.resize_seq += 1;
                if let Some(previous) = session.debounce.take() {
                    previous.abort();
                }
                let settled = ShellEvent::ResizeSettled {
                    generation: *generation,
                    seq: session.resize_seq,
                    width: *width,
                    height: *height,
                };
                let events = self.events_tx.clone();
                let delay = self.config.resize_debounce();
                session.debounce = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(settled);
                }));
            }
            ShellEvent::ResizeSettled {
                seq, width, height, ..
            } => {
                if *seq == session.resize_seq {
                    session.size = Some((*width, *height));
                    session.retile();
                }
            }
            ShellEvent::VoiceEnded { .. } => {}
        }
    }

    // -- Commands -------------------------------------------------------------

    pub fn zoom_in(&mut self) -> bool {
        self.adjust_zoom(Scale::zoom_in)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.adjust_zoom(Scale::zoom_out)
    }

    fn adjust_zoom(&mut self, step: fn(Scale) -> Scale) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.phase == Phase::Empty {
            return false;
        }
        let next = step(session.state.scale);
        if next == session.state.scale {
            return false;
        }
        session.state.scale = next;
        debug!(scale = %next, "zoom changed");
        true
    }

    /// Start reading if idle, stop if reading.
    pub fn toggle_voice(&mut self) -> VoiceToggle {
        let Some(session) = self.session.as_mut() else {
            return VoiceToggle::Unavailable;
        };
        if session.voice.is_speaking() {
            session.voice.stop();
            session.state.voice_reading = false;
            return VoiceToggle::Stopped;
        }
        match &session.text {
            TextStatus::Pending => {
                debug!("voice requested before text extraction finished");
                VoiceToggle::NotYetAvailable
            }
            TextStatus::Ready(text) => match session.voice.start(text) {
                Ok(()) => {
                    session.state.voice_reading = true;
                    VoiceToggle::Started
                }
                Err(e) => {
                    debug!(error = %e, "voice reading not offered");
                    VoiceToggle::Unavailable
                }
            },
        }
    }

    /// Stop voice reading. Returns `false` when nothing was reading.
    pub fn stop_voice(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.voice.is_speaking() {
            return false;
        }
        session.voice.stop();
        session.state.voice_reading = false;
        true
    }

    /// Foreground report from the owner. Presentational only.
    pub fn handle_visibility_change(&mut self, visible: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.state.visible = visible;
        if let Some(monitor) = &session.monitor {
            monitor.report(visible);
        }
    }

    /// Keyboard shortcut with focus on the document.
    pub fn handle_key_command(&mut self, key: &str) -> bool {
        self.handle_key(key, KeyFocus::Document)
    }

    /// Keyboard shortcut. Returns `true` when the key did something.
    pub fn handle_key(&mut self, key: &str, focus: KeyFocus) -> bool {
        if focus == KeyFocus::TextInput {
            return false;
        }
        match ViewerCommand::from_key(key) {
            Some(command) => self.dispatch(command),
            None => false,
        }
    }

    pub fn dispatch(&mut self, command: ViewerCommand) -> bool {
        match command {
            ViewerCommand::ZoomIn => self.zoom_in(),
            ViewerCommand::ZoomOut => self.zoom_out(),
            ViewerCommand::ToggleVoice => matches!(
                self.toggle_voice(),
                VoiceToggle::Started | VoiceToggle::Stopped
            ),
            ViewerCommand::Escape => self.stop_voice(),
        }
    }

    /// Initial (or explicit) container measurement. Re-tiles immediately and
    /// supersedes any pending debounced resize.
    pub fn measure(&mut self, width: u32, height: u32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.resize_seq += 1;
        session.size = Some((width, height));
        session.retile();
    }

    /// Open the document outside the viewer after a render failure.
    pub fn open_fallback(&self) -> Result<()> {
        let href = self
            .fallback()
            .and_then(|fallback| fallback.href)
            .ok_or(VitrineError::ContentUnavailable)?;
        self.host.open_external(&href)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.session
            .as_ref()
            .map_or(Phase::Unmounted, |session| session.phase)
    }

    pub fn view_state(&self) -> Option<&ViewState> {
        self.session.as_ref().map(|session| &session.state)
    }

    pub fn descriptor(&self) -> Option<&DocumentDescriptor> {
        self.session.as_ref().map(|session| &session.descriptor)
    }

    pub fn renderer(&self) -> Option<Renderer> {
        self.session.as_ref().and_then(|session| session.renderer)
    }

    pub fn overlay_labels(&self) -> &[OverlayLabel] {
        self.session
            .as_ref()
            .map(|session| session.labels.as_slice())
            .unwrap_or_default()
    }

    pub fn identity_label(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.label.as_str())
    }

    /// `None` while extraction is still running.
    pub fn extracted_text(&self) -> Option<&ExtractedText> {
        match &self.session.as_ref()?.text {
            TextStatus::Pending => None,
            TextStatus::Ready(text) => Some(text),
        }
    }

    /// Toolbar state. `None` when nothing is mounted or there is no content.
    pub fn controls(&self) -> Option<Controls> {
        let session = self.session.as_ref()?;
        if session.phase == Phase::Empty {
            return None;
        }
        let voice = if !session.voice.is_supported() {
            VoiceControl::Hidden
        } else if session.voice.is_speaking() {
            VoiceControl::Stop
        } else {
            match &session.text {
                TextStatus::Pending => VoiceControl::Pending,
                TextStatus::Ready(text) if text.readable().is_some() => VoiceControl::Play,
                TextStatus::Ready(_) => VoiceControl::Hidden,
            }
        };
        let scale = session.state.scale;
        Some(Controls {
            can_zoom_in: scale.can_zoom_in(),
            can_zoom_out: scale.can_zoom_out(),
            zoom_label: scale.percent_label(),
            voice,
        })
    }

    /// External-open fallback after a render failure.
    pub fn fallback(&self) -> Option<Fallback> {
        let session = self.session.as_ref()?;
        if session.phase != Phase::RenderFailed {
            return None;
        }
        let notice = session.failure.clone().unwrap_or_else(|| {
            humanize_error(&VitrineError::RenderFailure("unknown".into()))
        });
        Some(Fallback {
            notice,
            href: session
                .descriptor
                .locator
                .as_ref()
                .and_then(|locator| locator.external_href()),
        })
    }

    /// Notice to show over the content area, if any.
    pub fn notice(&self) -> Option<HumanError> {
        let session = self.session.as_ref()?;
        if !session.state.visible {
            return Some(hidden_notice());
        }
        match session.phase {
            Phase::Empty => Some(humanize_error(&VitrineError::ContentUnavailable)),
            Phase::RenderFailed => self.fallback().map(|fallback| fallback.notice),
            _ => None,
        }
    }
}

impl Drop for ViewerShell {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vitrine_bridge::headless::{HeadlessBridge, PresentedContent};
    use vitrine_core::human_errors::Severity;
    use vitrine_core::types::{ContentLocator, DocumentId};
    use vitrine_document::MemoryContentStore;
    use vitrine_document::pdf::testing::text_pdf;
    use vitrine_security::SqliteViewLog;

    const URL: &str = "https://files.example.org/handbook.pdf";

    fn url() -> ContentLocator {
        ContentLocator::Url(URL.into())
    }

    fn handbook() -> DocumentDescriptor {
        DocumentDescriptor::new(DocumentId::new(), "Handbook", Some(url()))
    }

    fn store_with(locator: ContentLocator, bytes: Vec<u8>) -> Arc<MemoryContentStore> {
        Arc::new(MemoryContentStore::new().with(locator, bytes))
    }

    fn shell_on(host: &Arc<HeadlessBridge>, store: Arc<MemoryContentStore>) -> ViewerShell {
        ViewerShell::new(
            host.clone(),
            store,
            ViewerIdentity::new("reader@example.org", Some("Robin Reader".into())),
            ViewerConfig {
                resize_debounce_ms: 20,
                ..Default::default()
            },
        )
        .with_jitter_seed(5)
    }

    async fn settle(shell: &mut ViewerShell, done: impl Fn(&ViewerShell) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(shell) {
                shell.next_event().await;
            }
        })
        .await
        .expect("shell did not settle");
    }

    #[tokio::test]
    async fn space_starts_voice_and_escape_stops_it() {
        let host = Arc::new(HeadlessBridge::new().with_speech());
        let speech = host.scripted_speech().unwrap();
        let mut shell = shell_on(&host, store_with(url(), text_pdf(&["Welcome aboard"])));

        shell.mount(handbook());
        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Play);

        assert!(shell.handle_key_command(" "));
        assert!(shell.view_state().unwrap().voice_reading);
        assert_eq!(speech.active_count(), 1);
        assert!(speech.spoken()[0].contains("Welcome aboard"));
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Stop);

        assert!(shell.handle_key_command("Escape"));
        assert!(!shell.view_state().unwrap().voice_reading);
        assert_eq!(speech.active_count(), 0);
        assert!(!shell.handle_key_command("Escape"));
    }

    #[tokio::test]
    async fn natural_end_returns_to_idle() {
        let host = Arc::new(HeadlessBridge::new().with_speech());
        let speech = host.scripted_speech().unwrap();
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));

        shell.mount(handbook().with_text("Short text"));
        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        assert_eq!(shell.toggle_voice(), VoiceToggle::Started);

        speech.finish_current();
        settle(&mut shell, |s| !s.view_state().unwrap().voice_reading).await;
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Play);
    }

    #[tokio::test]
    async fn missing_content_shows_placeholder_without_controls() {
        let host = Arc::new(HeadlessBridge::new().with_speech());
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));

        shell.mount(DocumentDescriptor::new(DocumentId::new(), "Draft", None).with_text("ignored"));
        assert_eq!(shell.phase(), Phase::Empty);
        assert!(shell.controls().is_none());
        let notice = shell.notice().unwrap();
        assert_eq!(notice.message, "No document content available");
        assert_eq!(notice.severity, Severity::Placeholder);

        assert!(!shell.zoom_in());
        assert_eq!(shell.toggle_voice(), VoiceToggle::Unavailable);
        assert_eq!(host.content(), PresentedContent::Nothing);
    }

    #[tokio::test]
    async fn malformed_content_disables_voice_silently() {
        let host = Arc::new(HeadlessBridge::new().with_speech());
        let speech = host.scripted_speech().unwrap();
        let mut shell = shell_on(&host, store_with(url(), b"%PDF-1.4 truncated".to_vec()));

        shell.mount(handbook());
        settle(&mut shell, |s| {
            s.extracted_text().is_some() && s.phase() == Phase::Ready
        })
        .await;

        assert_eq!(shell.extracted_text(), Some(&ExtractedText::Unavailable));
        assert!(!shell.handle_key_command(" "));
        assert!(!shell.view_state().unwrap().voice_reading);
        assert_eq!(speech.active_count(), 0);
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Hidden);
        assert!(shell.notice().is_none());
    }

    #[tokio::test]
    async fn voice_before_extraction_is_not_queued() {
        let host = Arc::new(HeadlessBridge::new().with_speech());
        let speech = host.scripted_speech().unwrap();
        let mut shell = shell_on(&host, store_with(url(), text_pdf(&["Later"])));

        shell.mount(handbook());
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Pending);
        assert_eq!(shell.toggle_voice(), VoiceToggle::NotYetAvailable);

        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        assert_eq!(speech.active_count(), 0);
        assert!(!shell.view_state().unwrap().voice_reading);
    }

    #[tokio::test]
    async fn no_speech_engine_hides_voice() {
        let host = Arc::new(HeadlessBridge::new());
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));
        shell.mount(handbook().with_text("Readable"));
        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        assert_eq!(shell.controls().unwrap().voice, VoiceControl::Hidden);
        assert!(!shell.handle_key_command("Enter"));
    }

    #[tokio::test]
    async fn zoom_shortcuts_clamp() {
        let host = Arc::new(HeadlessBridge::new());
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));
        shell.mount(handbook().with_text("x"));

        for _ in 0..10 {
            shell.handle_key_command("+");
        }
        let controls = shell.controls().unwrap();
        assert_eq!(shell.view_state().unwrap().scale, Scale::MAX);
        assert!(!controls.can_zoom_in);
        assert_eq!(controls.zoom_label, "200%");

        for _ in 0..10 {
            shell.handle_key_command("-");
        }
        assert_eq!(shell.view_state().unwrap().scale, Scale::MIN);
        assert!(!shell.controls().unwrap().can_zoom_out);

        // Shortcuts typed into a text field belong to the field.
        assert!(!shell.handle_key("=", KeyFocus::TextInput));
        assert_eq!(shell.view_state().unwrap().scale, Scale::MIN);
    }

    #[tokio::test]
    async fn zoom_leaves_overlay_alone() {
        let host = Arc::new(HeadlessBridge::new().with_size(800, 600));
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));
        shell.mount(handbook().with_text("x"));
        let before = shell.overlay_labels().to_vec();
        shell.zoom_in();
        assert_eq!(shell.overlay_labels(), before.as_slice());
    }

    #[tokio::test]
    async fn render_failure_offers_fallback_without_retry() {
        let host = Arc::new(HeadlessBridge::new());
        host.fail_rendering(true);
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));

        shell.mount(handbook().with_text("x"));
        settle(&mut shell, |s| s.phase() == Phase::RenderFailed).await;

        assert!(shell.view_state().unwrap().render_error);
        let fallback = shell.fallback().unwrap();
        assert_eq!(fallback.href.as_deref(), Some(URL));
        assert_eq!(fallback.notice.severity, Severity::ActionRequired);
        assert_eq!(shell.notice(), Some(fallback.notice.clone()));

        shell.open_fallback().unwrap();
        assert_eq!(host.external_opens(), vec![URL.to_owned()]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        shell.pump();
        assert!(!host.journal().iter().any(|entry| entry == "content.embed"));
        assert_eq!(shell.phase(), Phase::RenderFailed);
    }

    #[tokio::test]
    async fn compact_host_paginates() {
        let host = Arc::new(HeadlessBridge::compact());
        let locator = ContentLocator::Handle("handbook".into());
        let mut shell = shell_on(&host, store_with(locator.clone(), text_pdf(&["a", "b"])));

        shell.mount(DocumentDescriptor::new(DocumentId::new(), "Handbook", Some(locator)));
        settle(&mut shell, |s| s.phase() == Phase::Ready).await;

        assert!(shell.view_state().unwrap().is_compact_layout);
        assert_eq!(shell.renderer(), Some(Renderer::PaginatedRaster));
        match host.content() {
            PresentedContent::Pages(pages) => assert_eq!(pages.len(), 2),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn compact_failure_offers_fallback() {
        let garbled = ContentLocator::Url("https://files.example.org/garbled.pdf".into());
        let cases = [
            (url(), Arc::new(MemoryContentStore::new())),
            (garbled.clone(), store_with(garbled, b"%PDF-broken".to_vec())),
        ];
        for (locator, store) in cases {
            let host = Arc::new(HeadlessBridge::compact());
            let mut shell = shell_on(&host, store);
            let href = locator.external_href();

            shell.mount(DocumentDescriptor::new(DocumentId::new(), "Handbook", Some(locator)));
            settle(&mut shell, |s| s.phase() == Phase::RenderFailed).await;

            assert!(shell.view_state().unwrap().render_error);
            let fallback = shell.fallback().unwrap();
            assert!(fallback.href.is_some());
            assert_eq!(fallback.href, href);
            assert_eq!(fallback.notice.severity, Severity::ActionRequired);
            assert_eq!(shell.notice(), Some(fallback.notice));
            assert_eq!(host.content(), PresentedContent::Nothing);
        }
    }

    #[tokio::test]
    async fn hiding_keeps_state() {
        let host = Arc::new(HeadlessBridge::new());
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));
        shell.mount(handbook().with_text("Kept"));
        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        shell.zoom_in();

        host.set_foreground(false);
        settle(&mut shell, |s| !s.view_state().unwrap().visible).await;
        assert_eq!(shell.notice(), Some(hidden_notice()));
        assert_eq!(shell.extracted_text(), Some(&ExtractedText::Available("Kept".into())));
        assert_eq!(shell.view_state().unwrap().scale, Scale::ONE.zoom_in());

        host.set_foreground(true);
        settle(&mut shell, |s| s.view_state().unwrap().visible).await;
        assert!(shell.notice().is_none());

        shell.handle_visibility_change(false);
        assert!(!shell.view_state().unwrap().visible);
    }

    #[tokio::test]
    async fn overlay_follows_last_settled_resize() {
        let host = Arc::new(HeadlessBridge::new().with_size(800, 600));
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));
        shell.mount(handbook().with_text("x"));

        assert_eq!(shell.overlay_labels().len(), 9);
        assert!(shell.overlay_labels()[0].text.starts_with("Robin Reader • "));

        host.resize(300, 300);
        host.resize(1024, 768);
        // 1024 -> 4 columns, 768 -> 3 rows
        settle(&mut shell, |s| s.overlay_labels().len() == 12).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        shell.pump();
        assert_eq!(shell.overlay_labels().len(), 12);

        shell.measure(0, 0);
        assert!(shell.overlay_labels().is_empty());
    }

    #[tokio::test]
    async fn unmount_releases_in_order() {
        let host = Arc::new(HeadlessBridge::new().with_speech().with_size(640, 480));
        let _content = host.insert_sub_surface();
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));

        shell.mount(handbook().with_text("Read me"));
        settle(&mut shell, |s| {
            s.extracted_text().is_some() && s.phase() == Phase::Ready
        })
        .await;
        assert_eq!(shell.toggle_voice(), VoiceToggle::Started);

        shell.unmount();
        assert_eq!(shell.phase(), Phase::Unmounted);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.watcher_count(), 0);
        assert!(host.styles().is_empty());
        assert_eq!(host.content(), PresentedContent::Nothing);

        let journal = host.journal();
        let start = journal.iter().rposition(|e| e == "speech.speak").unwrap();
        let tail = &journal[start + 1..];
        let first = |name: &str| tail.iter().position(|e| e == name).unwrap();
        let last = |name: &str| tail.iter().rposition(|e| e == name).unwrap();

        assert_eq!(first("speech.cancel"), 0);
        assert!(last("speech.cancel") < first("listener.remove"));
        assert!(last("listener.remove") < first("style.remove"));
        assert!(last("style.remove") < first("unwatch.foreground"));
        assert!(first("unwatch.foreground") < first("unwatch.resize"));
        assert!(first("unwatch.resize") < first("content.clear"));
    }

    #[tokio::test]
    async fn remount_leaves_no_residual_listeners() {
        let host = Arc::new(HeadlessBridge::new());
        let mut shell = shell_on(&host, Arc::new(MemoryContentStore::new()));

        shell.mount(handbook().with_text("one"));
        let listeners = host.listener_count();
        let watchers = host.watcher_count();
        assert!(listeners > 0);

        shell.mount(handbook().with_text("two"));
        assert_eq!(host.listener_count(), listeners);
        assert_eq!(host.watcher_count(), watchers);
        assert_eq!(host.styles().len(), 1);

        drop(shell);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.watcher_count(), 0);
    }

    #[tokio::test]
    async fn late_results_from_earlier_session_are_dropped() {
        let host = Arc::new(HeadlessBridge::new());
        let mut shell = shell_on(&host, store_with(url(), text_pdf(&["Old document"])));

        shell.mount(handbook());
        shell.unmount();
        shell.mount(handbook().with_text("New document"));

        settle(&mut shell, |s| s.extracted_text().is_some()).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        shell.pump();
        assert_eq!(
            shell.extracted_text(),
            Some(&ExtractedText::Available("New document".into()))
        );
    }

    #[tokio::test]
    async fn views_are_logged_when_enabled() {
        let host = Arc::new(HeadlessBridge::new());
        let log = Arc::new(SqliteViewLog::open_in_memory().unwrap());
        let descriptor = handbook().with_text("x");
        let id = descriptor.id;

        let mut shell =
            shell_on(&host, Arc::new(MemoryContentStore::new())).with_recorder(log.clone());
        shell.mount(descriptor);

        tokio::time::timeout(Duration::from_secs(5), async {
            while log.view_count(&id).unwrap() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("view was never logged");
    }

    #[tokio::test]
    async fn view_logging_can_be_switched_off() {
        let host = Arc::new(HeadlessBridge::new());
        let log = Arc::new(SqliteViewLog::open_in_memory().unwrap());
        let descriptor = handbook().with_text("x");
        let id = descriptor.id;

        let mut shell = ViewerShell::new(
            host.clone(),
            Arc::new(MemoryContentStore::new()),
            ViewerIdentity::anonymous(),
            ViewerConfig {
                view_logging_enabled: false,
                ..Default::default()
            },
        )
        .with_recorder(log.clone());
        shell.mount(descriptor);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(log.view_count(&id).unwrap(), 0);
    }

    #[tokio::test]
    async fn clock_ticks_reach_the_shell() {
        let host = Arc::new(HeadlessBridge::new().with_size(400, 400));
        let mut shell = ViewerShell::new(
            host.clone(),
            Arc::new(MemoryContentStore::new()),
            ViewerIdentity::new("reader@example.org", None),
            ViewerConfig {
                clock_refresh_secs: 1,
                ..Default::default()
            },
        );
        shell.mount(handbook().with_text("x"));

        let tick = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                if let Some(ShellEvent::ClockTick { .. }) = shell.next_event().await {
                    break;
                }
            }
        })
        .await;
        assert!(tick.is_ok());
        assert!(shell.identity_label().unwrap().starts_with("reader@example.org • "));
        assert!(!shell.overlay_labels().is_empty());
    }
}

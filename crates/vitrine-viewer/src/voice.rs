// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Voice reader — reads the extracted document text aloud.
//
// Idle or speaking, nothing else. Starting while speaking cancels the
// running utterance first. Each utterance gets a watcher task that reports
// its outcome back to the shell; outcomes for anything but the current
// utterance are ignored.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vitrine_bridge::traits::{SpeechEngine, UtteranceId, UtteranceOutcome};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::ExtractedText;

use crate::events::ShellEvent;

struct Speaking {
    id: UtteranceId,
    watcher: JoinHandle<()>,
}

pub struct VoiceReader {
    engine: Option<Arc<dyn SpeechEngine>>,
    rate: f32,
    events: mpsc::UnboundedSender<ShellEvent>,
    speaking: Option<Speaking>,
}

impl VoiceReader {
    pub fn new(
        engine: Option<Arc<dyn SpeechEngine>>,
        rate: f32,
        events: mpsc::UnboundedSender<ShellEvent>,
    ) -> Self {
        Self {
            engine,
            rate,
            events,
            speaking: None,
        }
    }

    /// Whether the host offers speech at all.
    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    pub fn current(&self) -> Option<UtteranceId> {
        self.speaking.as_ref().map(|s| s.id)
    }

    /// Start reading `text` from the beginning.
    ///
    /// Rejected without a state change when there is no engine or nothing
    /// readable. Must run inside a Tokio runtime.
    pub fn start(&mut self, text: &ExtractedText) -> Result<()> {
        let engine = self.engine.clone().ok_or(VitrineError::SpeechUnavailable)?;
        let readable = text
            .readable()
            .ok_or_else(|| VitrineError::Speech("no readable text".into()))?;

        self.stop();

        let utterance = engine.speak(readable, self.rate)?;
        let id = utterance.id;
        let events = self.events.clone();
        let watcher = tokio::spawn(async move {
            // A dropped sender means the engine went away mid-utterance.
            let outcome = utterance
                .outcome
                .await
                .unwrap_or(UtteranceOutcome::Cancelled);
            let _ = events.send(ShellEvent::VoiceEnded { id, outcome });
        });

        info!(utterance = id.0, chars = readable.len(), "voice reading started");
        self.speaking = Some(Speaking { id, watcher });
        Ok(())
    }

    /// Cancel the running utterance. A no-op when idle.
    pub fn stop(&mut self) {
        let Some(speaking) = self.speaking.take() else {
            return;
        };
        if let Some(engine) = &self.engine {
            engine.cancel();
        }
        speaking.watcher.abort();
        debug!(utterance = speaking.id.0, "voice reading stopped");
    }

    /// Apply a reported outcome. Returns `true` when it ended the current
    /// utterance.
    pub fn on_ended(&mut self, id: UtteranceId, outcome: &UtteranceOutcome) -> bool {
        if self.current() != Some(id) {
            return false;
        }
        self.speaking = None;
        match outcome {
            UtteranceOutcome::Errored(reason) => {
                warn!(utterance = id.0, %reason, "speech engine error")
            }
            _ => debug!(utterance = id.0, ?outcome, "voice reading finished"),
        }
        true
    }
}

impl Drop for VoiceReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_bridge::headless::ScriptedSpeech;

    fn reader(engine: Option<Arc<ScriptedSpeech>>) -> (VoiceReader, mpsc::UnboundedReceiver<ShellEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = engine.map(|e| e as Arc<dyn SpeechEngine>);
        (VoiceReader::new(engine, 1.0, tx), rx)
    }

    fn text(s: &str) -> ExtractedText {
        ExtractedText::Available(s.into())
    }

    #[tokio::test]
    async fn double_start_leaves_one_utterance() {
        let engine = Arc::new(ScriptedSpeech::default());
        let (mut voice, _rx) = reader(Some(engine.clone()));

        voice.start(&text("first")).unwrap();
        let first = voice.current().unwrap();
        voice.start(&text("second")).unwrap();

        assert_eq!(engine.active_count(), 1);
        assert_ne!(voice.current(), Some(first));
        assert_eq!(engine.spoken(), vec!["first".to_owned(), "second".to_owned()]);
    }

    #[tokio::test]
    async fn stale_outcomes_are_ignored() {
        let engine = Arc::new(ScriptedSpeech::default());
        let (mut voice, _rx) = reader(Some(engine));
        voice.start(&text("first")).unwrap();
        let first = voice.current().unwrap();
        voice.start(&text("second")).unwrap();

        assert!(!voice.on_ended(first, &UtteranceOutcome::Cancelled));
        assert!(voice.is_speaking());
    }

    #[tokio::test]
    async fn natural_end_is_reported() {
        let engine = Arc::new(ScriptedSpeech::default());
        let (mut voice, mut rx) = reader(Some(engine.clone()));
        voice.start(&text("hello")).unwrap();
        let id = voice.current().unwrap();

        engine.finish_current();
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ShellEvent::VoiceEnded {
                id,
                outcome: UtteranceOutcome::Completed
            }
        );
        assert!(voice.on_ended(id, &UtteranceOutcome::Completed));
        assert!(!voice.is_speaking());
    }

    #[tokio::test]
    async fn stop_from_idle_is_a_no_op() {
        let engine = Arc::new(ScriptedSpeech::default());
        let (mut voice, _rx) = reader(Some(engine.clone()));
        voice.stop();
        assert!(!voice.is_speaking());
        assert_eq!(engine.active_count(), 0);
    }

    #[tokio::test]
    async fn rejections_leave_state_alone() {
        let (mut no_engine, _rx) = reader(None);
        assert!(matches!(
            no_engine.start(&text("hi")),
            Err(VitrineError::SpeechUnavailable)
        ));

        let engine = Arc::new(ScriptedSpeech::default());
        let (mut voice, _rx) = reader(Some(engine.clone()));
        assert!(voice.start(&ExtractedText::Unavailable).is_err());
        assert!(voice.start(&text("   \n")).is_err());
        assert!(!voice.is_speaking());

        engine.refuse_speech(true);
        assert!(voice.start(&text("hi")).is_err());
        assert!(!voice.is_speaking());
    }
}

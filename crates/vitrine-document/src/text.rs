// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction for the voice reader.
//
// Never fails outward: every fetch, decode, or parse problem, a panic in the
// worker, or running past the timeout resolves to `ExtractedText::Unavailable`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::{ContentLocator, ExtractedText};

use crate::content::ContentStore;
use crate::pdf::PdfReader;

/// Decode `data` as a PDF and return its text, pages joined with `\n`.
pub fn pdf_text(data: &[u8]) -> Result<String> {
    PdfReader::from_bytes(data)?
        .full_text()
        .map_err(|e| VitrineError::ExtractionFailure(e.to_string()))
}

/// Produces and caches the plain-text rendition of one document at a time.
pub struct TextExtractor {
    store: Arc<dyn ContentStore>,
    timeout: Duration,
    /// Last extracted locator and its text. A new locator replaces it.
    cache: Mutex<Option<(ContentLocator, ExtractedText)>>,
}

impl TextExtractor {
    pub fn new(store: Arc<dyn ContentStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self, locator: &ContentLocator) -> Option<ExtractedText> {
        let cache = self.cache.lock().expect("extraction cache lock poisoned");
        match cache.as_ref() {
            Some((cached, text)) if cached == locator => Some(text.clone()),
            _ => None,
        }
    }

    /// Text for a document.
    ///
    /// Supplied text wins and is returned verbatim (the reserved sentinel
    /// maps to `Unavailable`). Otherwise the locator's bytes are decoded on
    /// the blocking pool.
    #[instrument(skip_all, fields(locator = ?locator.map(|l| l.to_string())))]
    pub async fn extract(
        &self,
        locator: Option<&ContentLocator>,
        supplied: Option<&str>,
    ) -> ExtractedText {
        if let Some(text) = supplied {
            return ExtractedText::from_supplied(text);
        }
        let Some(locator) = locator else {
            return ExtractedText::Unavailable;
        };
        if let Some(hit) = self.cached(locator) {
            debug!("extraction cache hit");
            return hit;
        }

        let text = self.extract_uncached(locator).await;
        *self.cache.lock().expect("extraction cache lock poisoned") =
            Some((locator.clone(), text.clone()));
        text
    }

    async fn extract_uncached(&self, locator: &ContentLocator) -> ExtractedText {
        let store = Arc::clone(&self.store);
        let target = locator.clone();
        let work = tokio::task::spawn_blocking(move || {
            let bytes = store.fetch(&target)?;
            pdf_text(&bytes)
        });

        match tokio::time::timeout(self.timeout, work).await {
            Ok(Ok(Ok(text))) => {
                info!(chars = text.len(), "text extracted");
                ExtractedText::Available(text)
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "text extraction failed");
                ExtractedText::Unavailable
            }
            Ok(Err(join)) => {
                warn!(error = %join, "text extraction worker crashed");
                ExtractedText::Unavailable
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "text extraction timed out");
                ExtractedText::Unavailable
            }
        }
    }

    /// Drop the cached text.
    pub fn clear(&self) {
        *self.cache.lock().expect("extraction cache lock poisoned") = None;
    }
}

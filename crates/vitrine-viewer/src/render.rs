// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content rendering — embedded frame on desktop, paginated pages on compact
// hosts. Chosen once per mount.

use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};
use vitrine_bridge::traits::PlatformBridge;
use vitrine_core::config::ViewerConfig;
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::{DocumentDescriptor, PageRaster};
use vitrine_document::ContentStore;
use vitrine_document::pdf::paginate;
use vitrine_security::integrity::verify_if_known;

/// Which session currently owns the host content surface.
///
/// Presenting and clearing both hold the lock, so a render from a closed
/// session can never land after the next session's clear.
#[derive(Debug, Clone, Default)]
pub struct Stage(Arc<Mutex<u64>>);

impl Stage {
    pub fn open(&self, generation: u64) {
        *self.0.lock().expect("stage lock poisoned") = generation;
    }

    /// Hand the surface back, running `clear` before any later present.
    pub fn close(&self, clear: impl FnOnce()) {
        let mut owner = self.0.lock().expect("stage lock poisoned");
        *owner = 0;
        clear();
    }

    /// Run `present` only while `generation` still owns the surface.
    fn present<T>(&self, generation: u64, present: impl FnOnce() -> Result<T>) -> Result<T> {
        let owner = self.0.lock().expect("stage lock poisoned");
        if *owner != generation {
            return Err(VitrineError::RenderFailure(
                "session closed before content was presented".into(),
            ));
        }
        present()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Host frame pointed at the content locator.
    EmbeddedFrame,
    /// Bytes fetched, verified, split per page, and handed to the host
    /// rasterizer.
    PaginatedRaster,
}

impl Renderer {
    pub fn select(host: &dyn PlatformBridge, config: &ViewerConfig) -> Self {
        if config.force_compact_layout || host.is_compact() {
            Self::PaginatedRaster
        } else {
            Self::EmbeddedFrame
        }
    }

    pub fn is_compact(self) -> bool {
        self == Self::PaginatedRaster
    }

    /// Put the document on screen for session `generation`. Returns the page
    /// count when known.
    ///
    /// Everything that stops the document from showing surfaces as
    /// `RenderFailure`, so the caller can offer the external fallback. Only a
    /// tampered file keeps `IntegrityMismatch`.
    #[instrument(skip_all, fields(renderer = ?self, document = %descriptor.id))]
    pub async fn render(
        self,
        host: Arc<dyn PlatformBridge>,
        store: Arc<dyn ContentStore>,
        descriptor: DocumentDescriptor,
        stage: Stage,
        generation: u64,
    ) -> Result<u32> {
        let locator = descriptor
            .locator
            .clone()
            .ok_or(VitrineError::ContentUnavailable)?;

        match self {
            Self::EmbeddedFrame => {
                stage.present(generation, || {
                    host.embed_document(&locator, &descriptor.title)
                        .map_err(|e| VitrineError::RenderFailure(e.to_string()))
                })?;
                Ok(descriptor.page_count.unwrap_or(0))
            }
            Self::PaginatedRaster => {
                let expected = descriptor.content_hash.clone();
                let pages = tokio::task::spawn_blocking(move || -> Result<Vec<PageRaster>> {
                    let bytes = store.fetch(&locator)?;
                    verify_if_known(&bytes, expected.as_deref())?;
                    paginate(&bytes)
                })
                .await
                .map_err(|e| VitrineError::RenderFailure(format!("pagination worker crashed: {e}")))?
                .map_err(as_render_failure)?;

                stage.present(generation, || {
                    host.present_pages(&pages)
                        .map_err(|e| VitrineError::RenderFailure(e.to_string()))
                })?;
                debug!(pages = pages.len(), "pages presented");
                Ok(pages.len() as u32)
            }
        }
    }
}

fn as_render_failure(error: VitrineError) -> VitrineError {
    match error {
        VitrineError::IntegrityMismatch { .. } | VitrineError::RenderFailure(_) => error,
        other => VitrineError::RenderFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_bridge::headless::{HeadlessBridge, PresentedContent};
    use vitrine_core::types::{ContentLocator, DocumentId};
    use vitrine_document::MemoryContentStore;
    use vitrine_document::pdf::testing::text_pdf;
    use vitrine_security::hash_bytes;

    fn staged() -> Stage {
        let stage = Stage::default();
        stage.open(1);
        stage
    }

    fn descriptor(locator: ContentLocator) -> DocumentDescriptor {
        DocumentDescriptor::new(DocumentId::new(), "Lease", Some(locator))
    }

    #[test]
    fn selection_follows_host_and_config() {
        let config = ViewerConfig::default();
        assert_eq!(Renderer::select(&HeadlessBridge::new(), &config), Renderer::EmbeddedFrame);
        assert_eq!(Renderer::select(&HeadlessBridge::compact(), &config), Renderer::PaginatedRaster);

        let forced = ViewerConfig {
            force_compact_layout: true,
            ..Default::default()
        };
        assert!(Renderer::select(&HeadlessBridge::new(), &forced).is_compact());
    }

    #[tokio::test]
    async fn frame_points_at_locator() {
        let host = Arc::new(HeadlessBridge::new());
        let store = Arc::new(MemoryContentStore::new());
        let locator = ContentLocator::Url("https://files.example.org/lease.pdf".into());

        Renderer::EmbeddedFrame
            .render(host.clone(), store, descriptor(locator), staged(), 1)
            .await
            .unwrap();
        assert_eq!(
            host.content(),
            PresentedContent::Frame {
                href: "https://files.example.org/lease.pdf".into(),
                title: "Lease".into()
            }
        );
    }

    #[tokio::test]
    async fn compact_presents_every_page() {
        let host = Arc::new(HeadlessBridge::compact());
        let locator = ContentLocator::Handle("lease".into());
        let bytes = text_pdf(&["one", "two"]);
        let hash = hash_bytes(&bytes);
        let store = Arc::new(MemoryContentStore::new().with(locator.clone(), bytes));

        let pages = Renderer::PaginatedRaster
            .render(host.clone(), store, descriptor(locator).with_content_hash(hash), staged(), 1)
            .await
            .unwrap();
        assert_eq!(pages, 2);
        match host.content() {
            PresentedContent::Pages(pages) => assert_eq!(pages.len(), 2),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn tampered_bytes_are_refused() {
        let host = Arc::new(HeadlessBridge::compact());
        let locator = ContentLocator::Handle("lease".into());
        let store = Arc::new(MemoryContentStore::new().with(locator.clone(), text_pdf(&["one"])));

        let result = Renderer::PaginatedRaster
            .render(host.clone(), store, descriptor(locator).with_content_hash("00ff"), staged(), 1)
            .await;
        assert!(matches!(result, Err(VitrineError::IntegrityMismatch { .. })));
        assert_eq!(host.content(), PresentedContent::Nothing);
    }

    #[tokio::test]
    async fn host_refusal_is_a_render_failure() {
        let host = Arc::new(HeadlessBridge::new());
        host.fail_rendering(true);
        let result = Renderer::EmbeddedFrame
            .render(
                host,
                Arc::new(MemoryContentStore::new()),
                descriptor(ContentLocator::Url("https://x.example/a.pdf".into())),
                staged(),
                1,
            )
            .await;
        assert!(matches!(result, Err(VitrineError::RenderFailure(_))));
    }

    #[tokio::test]
    async fn unreadable_content_is_a_render_failure() {
        let host = Arc::new(HeadlessBridge::compact());
        let missing = ContentLocator::Url("https://files.example.org/a.pdf".into());
        let result = Renderer::PaginatedRaster
            .render(
                host.clone(),
                Arc::new(MemoryContentStore::new()),
                descriptor(missing),
                staged(),
                1,
            )
            .await;
        assert!(matches!(result, Err(VitrineError::RenderFailure(_))));

        let garbled = ContentLocator::Handle("lease".into());
        let store = Arc::new(MemoryContentStore::new().with(garbled.clone(), b"not a pdf".to_vec()));
        let result = Renderer::PaginatedRaster
            .render(host.clone(), store, descriptor(garbled), staged(), 1)
            .await;
        assert!(matches!(result, Err(VitrineError::RenderFailure(_))));
        assert_eq!(host.content(), PresentedContent::Nothing);
    }

    #[tokio::test]
    async fn closed_stage_presents_nothing() {
        let host = Arc::new(HeadlessBridge::compact());
        let locator = ContentLocator::Handle("lease".into());
        let store = Arc::new(MemoryContentStore::new().with(locator.clone(), text_pdf(&["one"])));
        let stage = staged();
        stage.close(|| {});
        stage.open(2);

        let result = Renderer::PaginatedRaster
            .render(host.clone(), store, descriptor(locator), stage, 1)
            .await;
        assert!(matches!(result, Err(VitrineError::RenderFailure(_))));
        assert_eq!(host.content(), PresentedContent::Nothing);
    }
}

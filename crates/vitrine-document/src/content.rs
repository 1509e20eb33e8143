// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content access — fetch document bytes for a locator.
//
// The viewer never owns storage. It asks a `ContentStore` for bytes and
// treats every failure as "content unavailable" on its side.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, instrument};
use vitrine_core::error::{Result, VitrineError};
use vitrine_core::types::ContentLocator;

/// Blocking byte source for document content.
pub trait ContentStore: Send + Sync {
    fn fetch(&self, locator: &ContentLocator) -> Result<Vec<u8>>;
}

/// Reads local files. `file://` URLs resolve to paths; handles resolve
/// inside an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct FileContentStore {
    root: Option<PathBuf>,
}

impl FileContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `Handle` locators as relative paths under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, locator: &ContentLocator) -> Result<PathBuf> {
        match locator {
            ContentLocator::Path(path) => Ok(path.clone()),
            ContentLocator::Url(url) => url
                .strip_prefix("file://")
                .map(PathBuf::from)
                .ok_or_else(|| VitrineError::UnsupportedLocator(url.clone())),
            ContentLocator::Handle(handle) => {
                let root = self
                    .root
                    .as_ref()
                    .ok_or_else(|| VitrineError::UnsupportedLocator(format!("handle {handle}")))?;
                let relative = Path::new(handle);
                if relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
                {
                    return Err(VitrineError::UnsupportedLocator(format!(
                        "handle {handle} escapes the content root"
                    )));
                }
                Ok(root.join(relative))
            }
        }
    }
}

impl ContentStore for FileContentStore {
    #[instrument(skip_all, fields(%locator))]
    fn fetch(&self, locator: &ContentLocator) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;
        let bytes = std::fs::read(&path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "content fetched");
        Ok(bytes)
    }
}

/// In-memory store keyed by locator.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    entries: RwLock<HashMap<ContentLocator, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, locator: ContentLocator, bytes: Vec<u8>) {
        self.entries
            .write()
            .expect("content store lock poisoned")
            .insert(locator, bytes);
    }

    pub fn with(self, locator: ContentLocator, bytes: Vec<u8>) -> Self {
        self.insert(locator, bytes);
        self
    }
}

impl ContentStore for MemoryContentStore {
    fn fetch(&self, locator: &ContentLocator) -> Result<Vec<u8>> {
        self.entries
            .read()
            .expect("content store lock poisoned")
            .get(locator)
            .cloned()
            .ok_or(VitrineError::ContentUnavailable)
    }
}

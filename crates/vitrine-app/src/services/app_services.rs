// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — initialises the backend subsystems and hands the UI
// what it needs to build a viewer.
//
// The view log serialises access behind its own mutex, so everything here is
// plain `Arc` sharing and the struct clones cheaply into closures.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use vitrine_bridge::headless::HeadlessBridge;
use vitrine_core::config::ViewerConfig;
use vitrine_core::error::Result;
use vitrine_core::types::{ContentLocator, DocumentDescriptor, DocumentId, ViewerIdentity};
use vitrine_document::{FileContentStore, PdfReader};
use vitrine_security::integrity::hash_bytes;
use vitrine_security::view_log::ViewEntry;
use vitrine_security::SqliteViewLog;
use vitrine_viewer::ViewerShell;
use tracing::{info, warn};

use super::data_dir;

const VIEW_LOG_FILE: &str = "views.db";
const PROFILE_FILE: &str = "profile.json";

/// Shared application services, available to every page via
/// `use_context::<AppServices>()`.
#[derive(Clone)]
pub struct AppServices {
    bridge: Arc<HeadlessBridge>,
    store: Arc<FileContentStore>,
    view_log: Arc<SqliteViewLog>,
    data_dir: PathBuf,
    config: Arc<Mutex<ViewerConfig>>,
    identity: Arc<Mutex<ViewerIdentity>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    pub fn init() -> Result<Self> {
        let dir = data_dir::data_dir();
        info!(path = %dir.display(), "initialising app services");

        let view_log = SqliteViewLog::open(dir.join(VIEW_LOG_FILE))?;
        Ok(Self::assemble(dir, view_log))
    }

    /// Services with an in-memory view log, for when the data directory is
    /// unusable.
    pub fn fallback() -> Result<Self> {
        let view_log = SqliteViewLog::open_in_memory()?;
        Ok(Self::assemble(data_dir::data_dir(), view_log))
    }

    fn assemble(dir: PathBuf, view_log: SqliteViewLog) -> Self {
        let config = ViewerConfig::load(&dir);
        let identity = load_profile(&dir).unwrap_or_else(ViewerIdentity::anonymous);
        info!(viewer = identity.label_name(), "app services initialised");

        Self {
            bridge: vitrine_bridge::platform_bridge(),
            store: Arc::new(FileContentStore::new()),
            view_log: Arc::new(view_log),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
            identity: Arc::new(Mutex::new(identity)),
        }
    }

    // -- Viewer ---------------------------------------------------------------

    /// The host registry the UI forwards its events into.
    pub fn bridge(&self) -> Arc<HeadlessBridge> {
        Arc::clone(&self.bridge)
    }

    /// A fresh viewer wired to the shared host, store, and view log.
    pub fn new_shell(&self) -> ViewerShell {
        ViewerShell::new(
            self.bridge.clone(),
            self.store.clone(),
            self.identity(),
            self.config(),
        )
        .with_recorder(self.view_log.clone())
    }

    /// Catalog entry for a local PDF. Reads the file once to record its hash
    /// and page count.
    pub fn describe_file(&self, path: &Path) -> Result<DocumentDescriptor> {
        let bytes = std::fs::read(path)?;
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".into());

        let mut descriptor = DocumentDescriptor::new(
            DocumentId::new(),
            title,
            Some(ContentLocator::Path(path.to_path_buf())),
        )
        .with_content_hash(hash_bytes(&bytes));

        match PdfReader::from_bytes(&bytes) {
            Ok(reader) => descriptor.page_count = Some(reader.page_count()),
            Err(e) => warn!(path = %path.display(), error = %e, "file does not parse as a PDF"),
        }
        Ok(descriptor)
    }

    /// Catalog entry for a remote document. Nothing is fetched up front.
    pub fn describe_url(&self, url: &str) -> DocumentDescriptor {
        let title = url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(url)
            .to_owned();
        DocumentDescriptor::new(DocumentId::new(), title, Some(ContentLocator::parse(url)))
    }

    // -- View log -------------------------------------------------------------

    pub fn recent_views(&self, limit: u32) -> Result<Vec<ViewEntry>> {
        self.view_log.recent_views(limit)
    }

    pub fn view_count(&self, document_id: &DocumentId) -> Result<u64> {
        self.view_log.view_count(document_id)
    }

    // -- Config and profile persistence ----------------------------------------

    pub fn config(&self) -> ViewerConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Update and persist the config. Takes effect for the next mount.
    pub fn save_config(&self, config: &ViewerConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        config.save(&self.data_dir)
    }

    pub fn identity(&self) -> ViewerIdentity {
        self.identity.lock().expect("identity lock poisoned").clone()
    }

    pub fn save_identity(&self, identity: &ViewerIdentity) -> Result<()> {
        *self.identity.lock().expect("identity lock poisoned") = identity.clone();
        persist_profile(&self.data_dir, identity)
    }
}

// -- Profile file persistence -------------------------------------------------

fn load_profile(data_dir: &Path) -> Option<ViewerIdentity> {
    let path = data_dir.join(PROFILE_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(identity) => Some(identity),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable profile");
            None
        }
    }
}

fn persist_profile(data_dir: &Path, identity: &ViewerIdentity) -> Result<()> {
    let path = data_dir.join(PROFILE_FILE);
    let json = serde_json::to_string_pretty(identity)?;
    std::fs::write(&path, json)?;
    Ok(())
}

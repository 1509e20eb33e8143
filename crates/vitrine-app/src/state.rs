// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state — reactive signals for the Dioxus UI.

use vitrine_core::config::ViewerConfig;
use vitrine_core::types::{DocumentDescriptor, ViewerIdentity};

use crate::services::app_services::AppServices;

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Documents opened this session, newest first.
    pub library: Vec<DocumentDescriptor>,
    /// Document the viewer page mounts.
    pub current: Option<DocumentDescriptor>,
    /// Settings as edited; persisted on save.
    pub config: ViewerConfig,
    pub identity: ViewerIdentity,
    /// Status message for user feedback.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(svc: &AppServices) -> Self {
        Self {
            library: Vec::new(),
            current: None,
            config: svc.config(),
            identity: svc.identity(),
            status_message: None,
        }
    }

    /// Make `descriptor` current and move it to the top of the library.
    pub fn open(&mut self, descriptor: DocumentDescriptor) {
        self.library.retain(|d| d.locator != descriptor.locator);
        self.library.insert(0, descriptor.clone());
        self.current = Some(descriptor);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Vitrine protected viewer.

use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved text distinguishing "extraction failed" from extracted content.
pub const EXTRACTION_UNAVAILABLE: &str = "Text extraction not available";

/// Unique identifier for a catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form handed over by the catalog.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for the viewing principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewerId(pub Uuid);

impl ViewerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the document bytes can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContentLocator {
    /// Public or signed URL handed out by the storage collaborator.
    Url(String),
    /// File on the local file system.
    Path(PathBuf),
    /// Opaque storage handle resolved by a `ContentStore`.
    Handle(String),
}

impl ContentLocator {
    /// Interpret a raw string: anything with a scheme is a URL, the rest a path.
    pub fn parse(raw: &str) -> Self {
        if raw.contains("://") {
            Self::Url(raw.to_owned())
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }

    /// Link suitable for an "open in browser" fallback, if one exists.
    pub fn external_href(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()),
            Self::Path(path) => Some(format!("file://{}", path.display())),
            Self::Handle(_) => None,
        }
    }
}

impl std::fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Handle(handle) => write!(f, "handle:{handle}"),
        }
    }
}

/// Catalog entry handed to the viewer for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub id: DocumentId,
    pub title: String,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    /// `None` means the catalog has no file for this document.
    pub locator: Option<ContentLocator>,
    /// Text extracted ahead of time by the catalog, used verbatim.
    pub text_content: Option<String>,
    /// SHA-256 hex digest of the stored bytes.
    pub content_hash: Option<String>,
}

impl DocumentDescriptor {
    pub fn new(id: DocumentId, title: impl Into<String>, locator: Option<ContentLocator>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            page_count: None,
            locator,
            text_content: None,
            content_hash: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }
}

/// Role assigned by the authorization collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerRole {
    Admin,
    User,
}

/// The principal looking at the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerIdentity {
    pub user_id: ViewerId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: ViewerRole,
    /// Approval flag from the session collaborator; the viewer only carries it.
    pub approved: bool,
}

impl ViewerIdentity {
    pub fn new(email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            user_id: ViewerId::new(),
            email: email.into(),
            display_name,
            role: ViewerRole::User,
            approved: true,
        }
    }

    /// Anonymous placeholder used when no profile is loaded.
    pub fn anonymous() -> Self {
        Self::new("anonymous", None)
    }

    /// Name printed in the identity label: display name, else email.
    pub fn label_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.email.trim().is_empty() => &self.email,
            _ => "anonymous",
        }
    }
}

/// Plain-text rendition used by the voice reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractedText {
    Available(String),
    /// Extraction failed or timed out; voice reading is disabled.
    Unavailable,
}

impl ExtractedText {
    /// Wrap caller-supplied text, mapping the reserved sentinel to `Unavailable`.
    pub fn from_supplied(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == EXTRACTION_UNAVAILABLE {
            Self::Unavailable
        } else {
            Self::Available(text)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Text worth speaking: available and not blank.
    pub fn readable(&self) -> Option<&str> {
        match self {
            Self::Available(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Available(text) => text,
            Self::Unavailable => EXTRACTION_UNAVAILABLE,
        }
    }
}

/// One positioned instance of the identifying watermark text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLabel {
    pub x: f64,
    pub y: f64,
    /// Derived from the unjittered grid coordinate; stable across re-tiling.
    pub key: String,
    pub text: String,
}

/// "Viewed" record emitted to the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEvent {
    pub document_id: DocumentId,
    pub viewer_id: ViewerId,
    pub viewed_at: DateTime<Utc>,
    pub ip_address: Option<IpAddr>,
}

impl ViewEvent {
    pub fn new(document_id: DocumentId, viewer_id: ViewerId) -> Self {
        Self {
            document_id,
            viewer_id,
            viewed_at: Utc::now(),
            ip_address: None,
        }
    }
}

/// One page of the compact (paginated raster) rendering path.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Page width in PDF points at 100% zoom.
    pub width: f32,
    /// Page height in PDF points at 100% zoom.
    pub height: f32,
    /// Standalone single-page PDF for the host rasterizer.
    pub pdf_bytes: Vec<u8>,
}

impl PageRaster {
    /// Display size at the given zoom factor.
    pub fn scaled(&self, factor: f32) -> (f32, f32) {
        (self.width * factor, self.height * factor)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Vitrine.

use thiserror::Error;

/// Top-level error type for all Vitrine operations.
#[derive(Debug, Error)]
pub enum VitrineError {
    // -- Content errors --
    #[error("no document content available")]
    ContentUnavailable,

    #[error("document rendering failed: {0}")]
    RenderFailure(String),

    #[error("text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("content locator not supported: {0}")]
    UnsupportedLocator(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Enhancement features --
    #[error("speech synthesis is not available")]
    SpeechUnavailable,

    #[error("speech synthesis failed: {0}")]
    Speech(String),

    #[error("view could not be logged: {0}")]
    ViewLog(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Host surface --
    #[error("host surface error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VitrineError>;

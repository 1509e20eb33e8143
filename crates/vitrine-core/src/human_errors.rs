// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable notices for viewers.
//
// Every technical error maps to plain English with a clear suggestion. Errors
// from enhancement features (voice, view logging) map to silent notices: the
// feature degrades and the viewer is never told.

use crate::error::VitrineError;

/// How the notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Never shown; the affected feature quietly switches off.
    Silent,
    /// Neutral empty-state placeholder, not an error.
    Placeholder,
    /// The viewer can work around it (e.g. open the document externally).
    ActionRequired,
    /// Nothing the viewer can do.
    Permanent,
}

/// A human-readable notice with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the viewer should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

impl HumanError {
    /// Whether the notice should be displayed at all.
    pub fn is_surfaced(&self) -> bool {
        self.severity != Severity::Silent
    }
}

/// Notice shown over the content while the host surface is backgrounded.
pub fn hidden_notice() -> HumanError {
    HumanError {
        message: "Document Hidden".into(),
        suggestion: "Return to this tab to continue viewing".into(),
        severity: Severity::Placeholder,
    }
}

/// Convert a `VitrineError` into a notice a viewer can understand.
pub fn humanize_error(err: &VitrineError) -> HumanError {
    match err {
        VitrineError::ContentUnavailable => HumanError {
            message: "No document content available".into(),
            suggestion: "This document has no file attached yet.".into(),
            severity: Severity::Placeholder,
        },

        VitrineError::RenderFailure(_) | VitrineError::PdfError(_) => HumanError {
            message: "This document couldn't be displayed here.".into(),
            suggestion: "Open it in your browser instead.".into(),
            severity: Severity::ActionRequired,
        },

        VitrineError::UnsupportedLocator(_) => HumanError {
            message: "This document's location isn't supported.".into(),
            suggestion: "Ask an administrator to re-upload the file.".into(),
            severity: Severity::Permanent,
        },

        VitrineError::IntegrityMismatch { .. } => HumanError {
            message: "This file has been changed since it was stored.".into(),
            suggestion: "The stored copy doesn't match the catalog. Ask an administrator to re-upload it.".into(),
            severity: Severity::Permanent,
        },

        // -- Enhancement features degrade silently --
        VitrineError::ExtractionFailure(_)
        | VitrineError::SpeechUnavailable
        | VitrineError::Speech(_)
        | VitrineError::ViewLog(_) => HumanError {
            message: String::new(),
            suggestion: String::new(),
            severity: Severity::Silent,
        },

        VitrineError::Database(_) | VitrineError::Serialization(_) => HumanError {
            message: "The viewer had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Permanent,
        },

        VitrineError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The document file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The viewer doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading the document.".into(),
                    suggestion: "Try again in a moment.".into(),
                    severity: Severity::ActionRequired,
                }
            }
        }

        VitrineError::Bridge(_) | VitrineError::PlatformUnavailable => HumanError {
            message: "This device couldn't display the document.".into(),
            suggestion: "Open it in your browser instead.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_content_is_placeholder() {
        let human = humanize_error(&VitrineError::ContentUnavailable);
        assert_eq!(human.severity, Severity::Placeholder);
        assert_eq!(human.message, "No document content available");
    }

    #[test]
    fn render_failure_offers_external_open() {
        let human = humanize_error(&VitrineError::RenderFailure("embed refused".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("browser"));
    }

    #[test]
    fn enhancement_failures_are_silent() {
        for err in [
            VitrineError::ExtractionFailure("bad xref".into()),
            VitrineError::SpeechUnavailable,
            VitrineError::ViewLog("db locked".into()),
        ] {
            assert!(!humanize_error(&err).is_surfaced(), "{err} should be silent");
        }
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = VitrineError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vitrine-document — Document access for the Vitrine viewer.
//
// Fetches content bytes through a pluggable store, reads PDFs (page sizes,
// text, single-page extraction), paginates them for the compact rendering
// path, and extracts plain text for the voice reader.

pub mod content;
pub mod pdf;
pub mod text;

pub use content::{ContentStore, FileContentStore, MemoryContentStore};
pub use pdf::reader::PdfReader;
pub use text::TextExtractor;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading, text, and page-by-page presentation.

pub mod pages;
pub mod reader;
#[doc(hidden)]
pub mod testing;

pub use pages::paginate;
pub use reader::PdfReader;

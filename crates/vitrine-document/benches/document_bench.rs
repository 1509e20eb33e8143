// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for document processing in the vitrine-document crate:
// page text extraction and compact-path pagination on a synthetic 20-page PDF.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vitrine_document::pdf::paginate;
use vitrine_document::pdf::testing::text_pdf;
use vitrine_document::text::pdf_text;

fn sample() -> Vec<u8> {
    let lines: Vec<String> = (1..=20)
        .map(|n| format!("Section {n}: terms of the agreement continue on the next page."))
        .collect();
    let pages: Vec<&str> = lines.iter().map(String::as_str).collect();
    text_pdf(&pages)
}

/// Extraction runs once per document load, off the interactive path, but
/// bounds how soon voice controls light up.
fn bench_pdf_text(c: &mut Criterion) {
    let data = sample();
    c.bench_function("pdf_text (20 pages)", |b| {
        b.iter(|| black_box(pdf_text(black_box(&data)).expect("extraction failed")));
    });
}

fn bench_paginate(c: &mut Criterion) {
    let data = sample();
    c.bench_function("paginate (20 pages)", |b| {
        b.iter(|| black_box(paginate(black_box(&data)).expect("pagination failed")));
    });
}

criterion_group!(benches, bench_pdf_text, bench_paginate);
criterion_main!(benches);

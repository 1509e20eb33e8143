// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for overlay tiling, key matching, hashing, and view
// logging in the vitrine-security crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use vitrine_bridge::traits::Modifiers;
use vitrine_core::config::WatermarkConfig;
use vitrine_core::types::{DocumentId, ViewEvent, ViewerId};
use vitrine_security::guard::is_blocked_key;
use vitrine_security::watermark::tile;
use vitrine_security::{SqliteViewLog, ViewRecorder, hash_bytes};

/// Re-tiling runs on every settled resize, so it sits on the interactive path.
fn bench_tile(c: &mut Criterion) {
    let config = WatermarkConfig::default();
    let sizes: &[(&str, u32, u32)] = &[
        ("phone 390x844", 390, 844),
        ("laptop 1440x900", 1440, 900),
        ("4k 3840x2160", 3840, 2160),
    ];

    let mut group = c.benchmark_group("overlay_tile");
    for &(label, width, height) in sizes {
        let mut rng = StdRng::seed_from_u64(11);
        group.bench_function(label, |b| {
            b.iter(|| {
                let labels = tile(
                    black_box(width),
                    black_box(height),
                    "reader@example.org • 2026-01-01 09:00",
                    &config,
                    &mut rng,
                );
                black_box(labels);
            });
        });
    }
    group.finish();
}

/// Every keystroke passes through the matcher.
fn bench_key_matching(c: &mut Criterion) {
    let keys = ["a", "s", "F12", "ArrowDown", "PrintScreen", "Enter"];
    c.bench_function("denylist_match (6 keys)", |b| {
        b.iter(|| {
            for key in keys {
                black_box(is_blocked_key(black_box(key), &Modifiers::ctrl()));
            }
        });
    });
}

fn bench_integrity_hash(c: &mut Criterion) {
    let data = vec![0x25u8; 512 * 1024];
    c.bench_function("integrity_hash_sha256 (512 KiB)", |b| {
        b.iter(|| black_box(hash_bytes(black_box(&data))));
    });
}

fn bench_view_record(c: &mut Criterion) {
    c.bench_function("view_record (in-memory SQLite)", |b| {
        let log = SqliteViewLog::open_in_memory().expect("open in-memory view log");
        let document = DocumentId::new();
        let viewer = ViewerId::new();

        b.iter(|| {
            log.record(black_box(&ViewEvent::new(document, viewer)))
                .expect("record failed");
        });
    });
}

criterion_group!(
    benches,
    bench_tile,
    bench_key_matching,
    bench_integrity_hash,
    bench_view_record,
);
criterion_main!(benches);

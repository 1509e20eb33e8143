// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Identifying overlay — tiled viewer labels over the document.

use chrono::{DateTime, Local, TimeZone};
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vitrine_core::config::WatermarkConfig;
use vitrine_core::types::{OverlayLabel, ViewerIdentity};

/// Grid cells along one axis of length `extent`.
///
/// Zero for an empty axis, otherwise at least one even when the axis is
/// shorter than the margin.
pub fn cells_along(extent: u32, config: &WatermarkConfig) -> u32 {
    if extent == 0 {
        return 0;
    }
    let spacing = config.spacing.max(1);
    extent.saturating_sub(config.margin).div_ceil(spacing).max(1)
}

/// Tile `text` over a `width` x `height` container.
///
/// Returns an empty set when either dimension is zero. Keys come from the
/// unjittered grid coordinate so they stay stable across recomputation.
pub fn tile<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    text: &str,
    config: &WatermarkConfig,
    rng: &mut R,
) -> Vec<OverlayLabel> {
    let columns = cells_along(width, config);
    let rows = cells_along(height, config);
    let mut labels = Vec::with_capacity((columns * rows) as usize);

    let amplitude = jitter_amplitude(config);
    for row in 0..rows {
        let y = config.margin + row * config.spacing;
        for column in 0..columns {
            let x = config.margin + column * config.spacing;
            labels.push(OverlayLabel {
                x: f64::from(x) + jitter(amplitude, rng),
                y: f64::from(y) + jitter(amplitude, rng),
                key: format!("{x}-{y}"),
                text: text.to_owned(),
            });
        }
    }
    labels
}

/// Configured jitter, capped at half a cell. Non-finite or negative values
/// mean no jitter.
fn jitter_amplitude(config: &WatermarkConfig) -> f64 {
    if config.jitter.is_finite() && config.jitter > 0.0 {
        config.jitter.min(f64::from(config.spacing.max(1)) / 2.0)
    } else {
        0.0
    }
}

fn jitter<R: Rng + ?Sized>(amplitude: f64, rng: &mut R) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

/// `"{name} • {date} {HH:MM}"` for `identity` at `now`.
pub fn identity_label<Tz: TimeZone>(identity: &ViewerIdentity, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} • {}",
        identity.label_name(),
        now.format("%Y-%m-%d %H:%M")
    )
}

/// Identity label stamped with the local wall clock.
pub fn identity_label_now(identity: &ViewerIdentity) -> String {
    identity_label(identity, &Local::now())
}

/// Tiler with its own jitter source, owned by one viewer session.
pub struct OverlayTiler {
    config: WatermarkConfig,
    rng: StdRng,
}

impl OverlayTiler {
    pub fn new(config: WatermarkConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter, for reproducible layouts.
    pub fn seeded(config: WatermarkConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn tile(&mut self, width: u32, height: u32, text: &str) -> Vec<OverlayLabel> {
        tile(width, height, text, &self.config, &mut self.rng)
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }
}

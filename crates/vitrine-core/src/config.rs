// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Viewer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Watermark grid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Distance between neighbouring labels on both axes.
    pub spacing: u32,
    /// Offset of the first row and column from the container origin.
    pub margin: u32,
    /// Maximum random displacement applied to each label on each axis.
    pub jitter: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            spacing: 250,
            margin: 50,
            jitter: 15.0,
        }
    }
}

/// Persistent viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub watermark: WatermarkConfig,
    /// How often the identity label clock refreshes (seconds).
    pub clock_refresh_secs: u64,
    /// Quiet period before a burst of resize notifications re-tiles the overlay.
    pub resize_debounce_ms: u64,
    /// Upper bound on text extraction before it resolves to "not available".
    pub extraction_timeout_secs: u64,
    /// Speech rate handed to the synthesis engine (1.0 = engine default).
    pub speech_rate: f32,
    /// Emit the "viewed" event to the view log.
    pub view_logging_enabled: bool,
    /// Force the compact (paginated raster) path regardless of platform.
    pub force_compact_layout: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            watermark: WatermarkConfig::default(),
            clock_refresh_secs: 60,
            resize_debounce_ms: 150,
            extraction_timeout_secs: 30,
            speech_rate: 1.0,
            view_logging_enabled: true,
            force_compact_layout: false,
        }
    }
}

impl ViewerConfig {
    pub fn clock_refresh(&self) -> Duration {
        Duration::from_secs(self.clock_refresh_secs.max(1))
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs.max(1))
    }

    /// Load `config.json` from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(_) => {
                debug!(path = %path.display(), "no viewer config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid viewer config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist to `config.json` inside `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ViewerConfig::load(dir.path()), ViewerConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig {
            clock_refresh_secs: 30,
            force_compact_layout: true,
            ..Default::default()
        };
        config.save(dir.path()).unwrap();
        assert_eq!(ViewerConfig::load(dir.path()), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "watermark": { "spacing": 300 } }"#,
        )
        .unwrap();
        let config = ViewerConfig::load(dir.path());
        assert_eq!(config.watermark.spacing, 300);
        assert_eq!(config.watermark.margin, 50);
        assert_eq!(config.clock_refresh_secs, 60);
    }

    #[test]
    fn zero_durations_have_a_floor() {
        let config = ViewerConfig {
            clock_refresh_secs: 0,
            extraction_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.clock_refresh(), Duration::from_secs(1));
        assert_eq!(config.extraction_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(ViewerConfig::load(dir.path()), ViewerConfig::default());
    }
}

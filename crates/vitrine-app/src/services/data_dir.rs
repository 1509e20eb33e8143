// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution for the viewer's config, profile, and view log.

use std::path::PathBuf;

/// Return the application data directory, creating it if needed.
///
/// `VITRINE_DATA_DIR` overrides the platform location.
pub fn data_dir() -> PathBuf {
    let dir = match std::env::var_os("VITRINE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => base_dir().join("vitrine"),
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create data directory");
    }
    dir
}

fn base_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Some(appdata) = std::env::var_os("APPDATA") {
        return PathBuf::from(appdata);
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}

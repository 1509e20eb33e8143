// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content integrity — SHA-256 fingerprints of fetched document bytes.

use sha2::{Digest, Sha256};
use vitrine_core::error::{Result, VitrineError};

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check `data` against a catalog-supplied digest.
///
/// Hex case in `expected` is ignored; storage back-ends disagree on it.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<()> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(VitrineError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

/// Verify when a digest is known; accept otherwise.
pub fn verify_if_known(data: &[u8], expected_hex: Option<&str>) -> Result<()> {
    match expected_hex {
        Some(expected) => verify_hash(data, expected),
        None => Ok(()),
    }
}

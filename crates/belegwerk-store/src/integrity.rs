// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Media fingerprints — SHA-256 over the original bytes.

use belegwerk_core::error::BelegwerkError;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
///
/// Stored with each record and used as the file name in the media archive.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check `data` against an expected hex digest.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), BelegwerkError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(BelegwerkError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

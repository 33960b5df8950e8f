// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fingerprints: SHA-256 hashing for document IDs and layout comparison.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Used to fingerprint watermark layouts so that two runs over the same input
/// can be compared without diffing encrypted output bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Derive the 16-byte file identifier written to the trailer `/ID` array.
///
/// Each part is length-prefixed before hashing so that `["ab", "c"]` and
/// `["a", "bc"]` give different identifiers.
pub fn document_id(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut id = [0u8; 16];
    id.copy_from_slice(&digest[..16]);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        // SHA-256("hello"), as printed by sha256sum.
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn document_id_is_deterministic() {
        let a = document_id(&[b"source.pdf", b"target.pdf"]);
        let b = document_id(&[b"source.pdf", b"target.pdf"]);
        assert_eq!(a, b);
    }

    #[test]
    fn document_id_separates_parts() {
        assert_ne!(document_id(&[b"ab", b"c"]), document_id(&[b"a", b"bc"]));
    }
}

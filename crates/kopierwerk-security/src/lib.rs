// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! kopierwerk-security: encryption parameters for redistribution copies.
//!
//! Derives the owner/user passwords and the permission bitmask applied to the
//! output PDF, and provides the SHA-256 fingerprints used for document IDs
//! and layout checks. The byte-level cipher itself lives in the PDF writer.

pub mod encryption;
pub mod integrity;
pub mod password;

pub use encryption::{CipherSpec, EncryptionConfigurer, EncryptionSettings, PermissionBits};
pub use integrity::{document_id, hash_bytes};
pub use password::{OWNER_PASSWORD_LEN, OwnerPassword, generate_owner_password};

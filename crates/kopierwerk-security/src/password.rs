// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Owner password generation from the system CSPRNG via `ring`.

use std::fmt;

use kopierwerk_core::error::KopierwerkError;
use ring::rand::SecureRandom;

/// Length of every generated owner password.
pub const OWNER_PASSWORD_LEN: usize = 32;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Random bytes at or above this bound are rejected so every alphabet symbol
/// is equally likely (248 = 4 * 62).
const REJECTION_BOUND: u8 = (256 - 256 % ALPHABET.len()) as u8;

/// The owner password of one output document. It exists only for the
/// duration of a run: `Debug` never shows it and nothing serialises it.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnerPassword(String);

impl OwnerPassword {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerPassword(<redacted>)")
    }
}

/// Draw a fresh alphanumeric owner password of [`OWNER_PASSWORD_LEN`]
/// characters from `rng`.
pub fn generate_owner_password(rng: &dyn SecureRandom) -> Result<OwnerPassword, KopierwerkError> {
    let mut password = String::with_capacity(OWNER_PASSWORD_LEN);
    let mut buffer = [0u8; 2 * OWNER_PASSWORD_LEN];

    while password.len() < OWNER_PASSWORD_LEN {
        rng.fill(&mut buffer).map_err(|_| {
            KopierwerkError::Encryption("system random generator unavailable".to_string())
        })?;
        for byte in buffer.iter().copied().filter(|byte| *byte < REJECTION_BOUND) {
            if password.len() == OWNER_PASSWORD_LEN {
                break;
            }
            password.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
        }
    }

    Ok(OwnerPassword(password))
}

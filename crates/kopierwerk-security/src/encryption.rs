// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encryption parameters for the output document: passwords, permission
// bitmask and cipher choice. These must be complete before the PDF writer is
// opened; the writer takes them by value at construction.

use kopierwerk_core::error::KopierwerkError;
use kopierwerk_core::types::{PermissionSet, UserPassword};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, instrument};

use crate::password::{OwnerPassword, generate_owner_password};

/// User access permission bits of the standard security handler (`/P`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionBits(u32);

impl PermissionBits {
    /// Print, including high-resolution printing (bits 3 and 12).
    pub const PRINT: u32 = (1 << 2) | (1 << 11);
    /// Copy or extract text and graphics (bit 5).
    pub const COPY: u32 = 1 << 4;
    /// Add or modify text annotations (bit 6).
    pub const ANNOTATE: u32 = 1 << 5;
    /// Insert, rotate or delete pages and add bookmarks (bit 11).
    pub const ASSEMBLY: u32 = 1 << 10;

    pub fn from_permissions(permissions: &PermissionSet) -> Self {
        let mut bits = 0;
        if permissions.print {
            bits |= Self::PRINT;
        }
        if permissions.copy {
            bits |= Self::COPY;
        }
        if permissions.assembly {
            bits |= Self::ASSEMBLY;
        }
        if permissions.annotate {
            bits |= Self::ANNOTATE;
        }
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether every bit of `flag` is granted.
    pub fn allows(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

/// Cipher applied to strings and streams of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSpec {
    /// Key length in bits of the AES cipher.
    pub key_bits: u16,
    /// Whether the XMP metadata stream is encrypted as well.
    pub encrypt_metadata: bool,
}

impl CipherSpec {
    pub const AES_128_CLEAR_METADATA: CipherSpec = CipherSpec {
        key_bits: 128,
        encrypt_metadata: false,
    };
}

/// Everything the writer needs to encrypt one output document.
#[derive(Debug, Clone)]
pub struct EncryptionSettings {
    pub owner_password: OwnerPassword,
    /// Empty when the output opens without a password.
    pub user_password: UserPassword,
    pub permissions: PermissionBits,
    pub cipher: CipherSpec,
}

/// Derives [`EncryptionSettings`] from the validated options.
pub struct EncryptionConfigurer {
    rng: Box<dyn SecureRandom + Send + Sync>,
}

impl Default for EncryptionConfigurer {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptionConfigurer {
    /// Configurer backed by the operating system's CSPRNG.
    pub fn new() -> Self {
        Self::with_rng(Box::new(SystemRandom::new()))
    }

    pub fn with_rng(rng: Box<dyn SecureRandom + Send + Sync>) -> Self {
        Self { rng }
    }

    /// Build the settings for one run. A fresh owner password is generated on
    /// every call and is never equal to the user password.
    #[instrument(skip_all, fields(
        allow_print = permissions.print,
        allow_copy = permissions.copy,
        allow_assembly = permissions.assembly,
        allow_annotate = permissions.annotate,
    ))]
    pub fn configure(
        &self,
        permissions: &PermissionSet,
        user_password: Option<&UserPassword>,
    ) -> Result<EncryptionSettings, KopierwerkError> {
        let user_password = user_password
            .cloned()
            .unwrap_or_else(|| UserPassword::new(""));

        let owner_password = loop {
            let candidate = generate_owner_password(self.rng.as_ref())?;
            if candidate.expose() != user_password.expose() {
                break candidate;
            }
        };

        let permissions = PermissionBits::from_permissions(permissions);
        info!(
            permission_bits = permissions.bits(),
            user_password_set = !user_password.is_empty(),
            "Encryption configured"
        );

        Ok(EncryptionSettings {
            owner_password,
            user_password,
            permissions,
            cipher: CipherSpec::AES_128_CLEAR_METADATA,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission_set(print: bool, copy: bool, assembly: bool, annotate: bool) -> PermissionSet {
        PermissionSet {
            print,
            copy,
            assembly,
            annotate,
        }
    }

    #[test]
    fn nothing_granted_by_default() {
        let settings = EncryptionConfigurer::new()
            .configure(&PermissionSet::default(), None)
            .unwrap();
        assert_eq!(settings.permissions.bits(), 0);
        assert!(settings.user_password.is_empty());
    }

    #[test]
    fn each_flag_sets_exactly_its_bits() {
        let flags = [
            PermissionBits::PRINT,
            PermissionBits::COPY,
            PermissionBits::ASSEMBLY,
            PermissionBits::ANNOTATE,
        ];
        for mask in 0u8..16 {
            let set = permission_set(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0);
            let bits = PermissionBits::from_permissions(&set);
            for (index, flag) in flags.iter().enumerate() {
                assert_eq!(
                    bits.allows(*flag),
                    mask & (1 << index) != 0,
                    "mask {mask:04b}, flag {index}"
                );
            }
        }
    }

    #[test]
    fn all_flags_combine_with_or() {
        let bits = PermissionBits::from_permissions(&permission_set(true, true, true, true));
        assert_eq!(
            bits.bits(),
            PermissionBits::PRINT
                | PermissionBits::COPY
                | PermissionBits::ASSEMBLY
                | PermissionBits::ANNOTATE
        );
    }

    #[test]
    fn user_password_is_passed_through() {
        let password = UserPassword::new("open-sesame");
        let settings = EncryptionConfigurer::new()
            .configure(&PermissionSet::default(), Some(&password))
            .unwrap();
        assert_eq!(settings.user_password.expose(), "open-sesame");
        assert_ne!(
            settings.owner_password.expose(),
            settings.user_password.expose()
        );
    }

    #[test]
    fn owner_password_is_fresh_per_run() {
        let configurer = EncryptionConfigurer::new();
        let first = configurer.configure(&PermissionSet::default(), None).unwrap();
        let second = configurer.configure(&PermissionSet::default(), None).unwrap();
        assert_ne!(first.owner_password, second.owner_password);
    }

    #[test]
    fn cipher_is_aes_128_with_clear_metadata() {
        let settings = EncryptionConfigurer::new()
            .configure(&PermissionSet::default(), None)
            .unwrap();
        assert_eq!(settings.cipher.key_bits, 128);
        assert!(!settings.cipher.encrypt_metadata);
    }

    #[test]
    fn settings_debug_hides_owner_password() {
        let settings = EncryptionConfigurer::new()
            .configure(&PermissionSet::default(), None)
            .unwrap();
        let shown = format!("{settings:?}");
        assert!(!shown.contains(settings.owner_password.expose()));
        assert!(shown.contains("<redacted>"));
    }
}

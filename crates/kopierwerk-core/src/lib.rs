// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kopierwerk: core configuration, types and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;
pub mod validate;

pub use config::{Config, RawOptions, WatermarkSource};
pub use error::{KopierwerkError, ValidationError, ValidationErrors};
pub use types::*;
pub use validate::OptionsValidator;

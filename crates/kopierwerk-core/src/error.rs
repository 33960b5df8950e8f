// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Kopierwerk.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Kopierwerk operations.
///
/// Every variant is fatal for the run: nothing in this domain is transient,
/// so no caller retries.
#[derive(Debug, Error)]
pub enum KopierwerkError {
    // -- Configuration --
    #[error("invalid options: {0}")]
    Validation(ValidationErrors),

    #[error("page selection failed: {0}")]
    PageSelection(String),

    // -- Document collaborators --
    #[error("cannot read source document: {0}")]
    SourceDocument(String),

    #[error("cannot write output document: {0}")]
    OutputDocument(String),

    #[error("watermark image failed: {0}")]
    ImageError(String),

    #[error("watermark font failed: {0}")]
    FontError(String),

    #[error("watermark rendering failed: {0}")]
    Render(String),

    // -- Security --
    #[error("encryption setup failed: {0}")]
    Encryption(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("options file error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for KopierwerkError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A single violated option rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("either watermark text or watermark image must be specified, not both")]
    WatermarkModeConflict,

    #[error("source file '{path}' cannot be read: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("target file '{path}' cannot be written: {reason}")]
    TargetUnwritable { path: PathBuf, reason: String },

    #[error("watermark image '{path}' cannot be read: {reason}")]
    WatermarkImageUnreadable { path: PathBuf, reason: String },

    #[error("{option} = {value} is out of range (expected {expected})")]
    InvalidRange {
        option: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Every rule the raw options violated, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Whether any collected violation matches `predicate`.
    pub fn contains(&self, predicate: impl Fn(&ValidationError) -> bool) -> bool {
        self.0.iter().any(predicate)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Result type of the PDF and watermark operations.
pub type Result<T> = std::result::Result<T, KopierwerkError>;

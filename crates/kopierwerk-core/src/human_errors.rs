// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages and process exit codes.
//
// Every technical error is mapped to one plain-English diagnostic with a
// suggestion, and to a category that fixes the exit code of the binary.

use crate::error::{KopierwerkError, ValidationError};

/// Failure categories, each with its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Contradictory or out-of-range options, unreadable/unwritable paths.
    Validation,
    /// The range expression does not fit the source document.
    PageSelection,
    /// The source PDF could not be opened or imported.
    SourceDocument,
    /// The watermark image or font could not be loaded.
    WatermarkResource,
    /// Writing, encrypting or stamping the output failed.
    Output,
    /// Plain filesystem failure.
    Io,
    /// The JSON options file is malformed.
    OptionsFile,
}

impl ErrorCategory {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation => 2,
            Self::PageSelection => 3,
            Self::SourceDocument => 4,
            Self::WatermarkResource => 5,
            Self::Output => 6,
            Self::Io => 7,
            Self::OptionsFile => 8,
        }
    }
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the operator should try next.
    pub suggestion: String,
    pub category: ErrorCategory,
}

impl HumanError {
    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }
}

/// Convert a `KopierwerkError` into a single diagnostic for standard error.
pub fn humanize_error(err: &KopierwerkError) -> HumanError {
    match err {
        KopierwerkError::Validation(errors) => {
            let mut hints: Vec<&str> = Vec::new();
            for error in errors.iter() {
                let hint = validation_hint(error);
                if !hints.contains(&hint) {
                    hints.push(hint);
                }
            }
            let suggestion = match errors.len() {
                0 => RANGE_HINT.to_string(),
                1 => hints.join(" "),
                count => format!("Fix all {count} problems. {}", hints.join(" ")),
            };
            HumanError {
                message: format!("The options are not valid: {errors}."),
                suggestion,
                category: ErrorCategory::Validation,
            }
        }

        KopierwerkError::PageSelection(detail) => HumanError {
            message: format!("The page range cannot be used: {detail}."),
            suggestion: "Use page numbers starting at 1, e.g. --ranges 1-3,5.".into(),
            category: ErrorCategory::PageSelection,
        },

        KopierwerkError::SourceDocument(detail) => HumanError {
            message: format!("The source PDF could not be read: {detail}."),
            suggestion: "Make sure the input is a valid PDF that opens without a password.".into(),
            category: ErrorCategory::SourceDocument,
        },

        KopierwerkError::ImageError(detail) => HumanError {
            message: format!("The watermark image could not be used: {detail}."),
            suggestion: "Use a PNG or JPEG image.".into(),
            category: ErrorCategory::WatermarkResource,
        },

        KopierwerkError::FontError(detail) => HumanError {
            message: format!("The watermark font could not be used: {detail}."),
            suggestion: "Use a TrueType (.ttf) font file, or omit --wm_font.".into(),
            category: ErrorCategory::WatermarkResource,
        },

        KopierwerkError::OutputDocument(detail) => HumanError {
            message: format!("The output PDF could not be written: {detail}."),
            suggestion: "The target file may be incomplete; delete it and try again.".into(),
            category: ErrorCategory::Output,
        },

        KopierwerkError::Render(detail) => HumanError {
            message: format!("The watermark could not be drawn: {detail}."),
            suggestion: "If the watermark is tiny, raise --wm_font_size or the gaps. \
                         The target file may be incomplete; delete it and try again."
                .into(),
            category: ErrorCategory::Output,
        },

        KopierwerkError::Encryption(detail) => HumanError {
            message: format!("The output could not be encrypted: {detail}."),
            suggestion: "The target file may be incomplete; delete it and try again.".into(),
            category: ErrorCategory::Output,
        },

        KopierwerkError::Io(io_err) => HumanError {
            message: format!("A file operation failed: {io_err}."),
            suggestion: match io_err.kind() {
                std::io::ErrorKind::NotFound => "Check that the file paths exist.".into(),
                std::io::ErrorKind::PermissionDenied => {
                    "Check the file permissions of the input and output paths.".into()
                }
                _ => "Check free disk space and try again.".into(),
            },
            category: ErrorCategory::Io,
        },

        KopierwerkError::Serialization(detail) => HumanError {
            message: format!("The options file is not valid JSON: {detail}."),
            suggestion: "Fix the options file or pass the options on the command line.".into(),
            category: ErrorCategory::OptionsFile,
        },
    }
}

/// What to try for one failed option rule.
fn validation_hint(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::WatermarkModeConflict => {
            "Pass either --wm_text (one or more lines) or --wm_image, but not both."
        }
        ValidationError::SourceUnreadable { .. } => {
            "Check that --file_input names an existing, readable PDF file."
        }
        ValidationError::TargetUnwritable { .. } => {
            "Check that the directory of --file_output exists and is writable."
        }
        ValidationError::WatermarkImageUnreadable { .. } => {
            "Check that --wm_image names an existing, readable image file."
        }
        ValidationError::InvalidRange { .. } => RANGE_HINT,
    }
}

const RANGE_HINT: &str =
    "Opacity and gap ratio are fractions between 0 and 1; font size must be at least 1 point.";

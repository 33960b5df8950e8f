// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Options validation: turns `RawOptions` into an immutable `Config` before
// any document I/O happens. The only side effect is creating the target file
// when it does not exist yet.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::{
    Config, DEFAULT_FONT_SIZE, DEFAULT_GAP_RATIO, DEFAULT_GAP_SIZE, DEFAULT_OPACITY,
    DEFAULT_TEXT_ROTATION, MIN_FONT_SIZE, RawOptions, WatermarkSource,
};
use crate::error::{ValidationError, ValidationErrors};
use crate::types::PermissionSet;

/// Checks every option rule independently and reports all violations at once.
pub struct OptionsValidator;

impl OptionsValidator {
    #[instrument(skip_all)]
    pub fn validate(raw: RawOptions) -> Result<Config, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let watermark = match watermark_source(&raw) {
            Some(source) => Some(source),
            None => {
                errors.push(ValidationError::WatermarkModeConflict);
                None
            }
        };

        if let Some(WatermarkSource::Image { path }) = &watermark {
            if let Err(reason) = ensure_readable(path) {
                errors.push(ValidationError::WatermarkImageUnreadable {
                    path: path.clone(),
                    reason,
                });
            }
        }

        match &raw.source {
            Some(path) => {
                if let Err(reason) = ensure_readable(path) {
                    errors.push(ValidationError::SourceUnreadable {
                        path: path.clone(),
                        reason,
                    });
                }
            }
            None => errors.push(ValidationError::SourceUnreadable {
                path: PathBuf::new(),
                reason: "no source file given".to_string(),
            }),
        }

        match &raw.target {
            Some(path) => {
                if let Err(reason) = ensure_writable(path) {
                    errors.push(ValidationError::TargetUnwritable {
                        path: path.clone(),
                        reason,
                    });
                }
            }
            None => errors.push(ValidationError::TargetUnwritable {
                path: PathBuf::new(),
                reason: "no target file given".to_string(),
            }),
        }

        let opacity = check_range(&mut errors, "opacity", raw.opacity, DEFAULT_OPACITY, unit_interval);
        let gap_ratio =
            check_range(&mut errors, "gap_ratio", raw.gap_ratio, DEFAULT_GAP_RATIO, unit_interval);
        let gap_size = check_range(&mut errors, "gap_size", raw.gap_size, DEFAULT_GAP_SIZE, non_negative);
        let font_size = check_range(&mut errors, "font_size", raw.font_size, DEFAULT_FONT_SIZE, legible);
        let text_rotation = check_range(
            &mut errors,
            "text_rotation",
            raw.text_rotation,
            DEFAULT_TEXT_ROTATION,
            finite,
        );

        let (Some(source), Some(target), Some(watermark)) = (raw.source, raw.target, watermark)
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let config = Config {
            source,
            target,
            watermark,
            font_path: raw.watermark_font,
            opacity,
            gap_ratio,
            gap_size,
            font_size,
            text_rotation,
            page_ranges: raw.page_ranges.filter(|ranges| !ranges.trim().is_empty()),
            metadata: raw.metadata,
            permissions: PermissionSet {
                print: raw.allow_print.unwrap_or(false),
                copy: raw.allow_copy.unwrap_or(false),
                assembly: raw.allow_assembly.unwrap_or(false),
                annotate: raw.allow_annotations.unwrap_or(false),
            },
            user_password: raw.encryption_password.filter(|password| !password.is_empty()),
        };

        debug!(
            source = %config.source.display(),
            target = %config.target.display(),
            opacity = config.opacity,
            gap_ratio = config.gap_ratio,
            "Options validated"
        );
        Ok(config)
    }
}

/// Exactly one of text and image must be set; an empty line list counts as
/// unset.
fn watermark_source(raw: &RawOptions) -> Option<WatermarkSource> {
    let lines = raw.watermark_text.as_ref().filter(|lines| !lines.is_empty());
    match (lines, &raw.watermark_image) {
        (Some(lines), None) => Some(WatermarkSource::Text {
            lines: lines.clone(),
        }),
        (None, Some(path)) => Some(WatermarkSource::Image { path: path.clone() }),
        _ => None,
    }
}

fn ensure_readable(path: &Path) -> Result<(), String> {
    let metadata = fs::metadata(path).map_err(|err| err.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    File::open(path).map(|_| ()).map_err(|err| err.to_string())
}

/// Create the target when absent, then make sure it opens for writing. The
/// file is never truncated here.
fn ensure_writable(path: &Path) -> Result<(), String> {
    if path.is_dir() {
        return Err("is a directory".to_string());
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn check_range(
    errors: &mut ValidationErrors,
    option: &'static str,
    value: Option<f64>,
    default: f64,
    rule: fn(f64) -> Result<(), &'static str>,
) -> f64 {
    let value = value.unwrap_or(default);
    if let Err(expected) = rule(value) {
        errors.push(ValidationError::InvalidRange {
            option,
            value,
            expected,
        });
    }
    value
}

fn unit_interval(value: f64) -> Result<(), &'static str> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err("a fraction between 0 and 1")
    }
}

fn non_negative(value: f64) -> Result<(), &'static str> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err("a finite value >= 0")
    }
}

fn legible(value: f64) -> Result<(), &'static str> {
    if value.is_finite() && value >= MIN_FONT_SIZE {
        Ok(())
    } else {
        Err("at least 1 point")
    }
}

fn finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("a finite number of degrees")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserPassword;

    struct Fixture {
        dir: tempfile::TempDir,
        source: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("source.pdf");
        fs::write(&source, b"%PDF-1.4\n").expect("write source");
        Fixture { dir, source }
    }

    fn text_options(fx: &Fixture) -> RawOptions {
        RawOptions {
            source: Some(fx.source.clone()),
            target: Some(fx.dir.path().join("target.pdf")),
            watermark_text: Some(vec!["CONFIDENTIAL".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn valid_text_options_get_defaults() {
        let fx = fixture();
        let config = OptionsValidator::validate(text_options(&fx)).unwrap();
        assert_eq!(config.opacity, DEFAULT_OPACITY);
        assert_eq!(config.gap_ratio, DEFAULT_GAP_RATIO);
        assert_eq!(config.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(config.text_rotation, DEFAULT_TEXT_ROTATION);
        assert_eq!(config.permissions, PermissionSet::default());
        assert!(config.user_password.is_none());
        assert!(matches!(config.watermark, WatermarkSource::Text { .. }));
    }

    #[test]
    fn target_is_created_when_absent() {
        let fx = fixture();
        let options = text_options(&fx);
        let target = options.target.clone().unwrap();
        assert!(!target.exists());
        OptionsValidator::validate(options).unwrap();
        assert!(target.exists());
    }

    #[test]
    fn existing_target_is_not_truncated() {
        let fx = fixture();
        let options = text_options(&fx);
        let target = options.target.clone().unwrap();
        fs::write(&target, b"previous").unwrap();
        OptionsValidator::validate(options).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"previous");
    }

    #[test]
    fn both_watermarks_conflict() {
        let fx = fixture();
        let image = fx.dir.path().join("logo.png");
        fs::write(&image, b"png").unwrap();
        let options = RawOptions {
            watermark_image: Some(image),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert!(errors.contains(|e| *e == ValidationError::WatermarkModeConflict));
    }

    #[test]
    fn missing_watermark_conflicts() {
        let fx = fixture();
        let options = RawOptions {
            watermark_text: Some(Vec::new()),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert!(errors.contains(|e| *e == ValidationError::WatermarkModeConflict));
    }

    #[test]
    fn unreadable_source_is_reported() {
        let fx = fixture();
        let options = RawOptions {
            source: Some(fx.dir.path().join("missing.pdf")),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert!(errors.contains(|e| matches!(e, ValidationError::SourceUnreadable { .. })));
    }

    #[test]
    fn target_in_missing_directory_is_unwritable() {
        let fx = fixture();
        let options = RawOptions {
            target: Some(fx.dir.path().join("no/such/dir/out.pdf")),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert!(errors.contains(|e| matches!(e, ValidationError::TargetUnwritable { .. })));
    }

    #[test]
    fn every_violation_is_collected() {
        let fx = fixture();
        let options = RawOptions {
            watermark_text: None,
            opacity: Some(1.5),
            gap_ratio: Some(-0.1),
            font_size: Some(0.0),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(|e| matches!(
            e,
            ValidationError::InvalidRange { option: "opacity", .. }
        )));
        assert!(errors.contains(|e| matches!(
            e,
            ValidationError::InvalidRange { option: "gap_ratio", .. }
        )));
    }

    #[test]
    fn tiny_font_size_is_rejected() {
        let fx = fixture();
        let options = RawOptions {
            font_size: Some(1e-6),
            ..text_options(&fx)
        };
        let errors = OptionsValidator::validate(options).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(|e| matches!(
            e,
            ValidationError::InvalidRange { option: "font_size", .. }
        )));

        let options = RawOptions {
            font_size: Some(MIN_FONT_SIZE),
            ..text_options(&fx)
        };
        assert_eq!(OptionsValidator::validate(options).unwrap().font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let fx = fixture();
        let options = RawOptions {
            opacity: Some(1.0),
            gap_ratio: Some(0.0),
            ..text_options(&fx)
        };
        let config = OptionsValidator::validate(options).unwrap();
        assert_eq!(config.opacity, 1.0);
        assert_eq!(config.gap_ratio, 0.0);
    }

    #[test]
    fn empty_password_and_ranges_are_unset() {
        let fx = fixture();
        let options = RawOptions {
            encryption_password: Some(UserPassword::new("")),
            page_ranges: Some("  ".into()),
            ..text_options(&fx)
        };
        let config = OptionsValidator::validate(options).unwrap();
        assert!(config.user_password.is_none());
        assert!(config.page_ranges.is_none());
    }

    #[test]
    fn permissions_are_carried() {
        let fx = fixture();
        let options = RawOptions {
            allow_print: Some(true),
            allow_annotations: Some(true),
            ..text_options(&fx)
        };
        let config = OptionsValidator::validate(options).unwrap();
        assert!(config.permissions.print);
        assert!(!config.permissions.copy);
        assert!(!config.permissions.assembly);
        assert!(config.permissions.annotate);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration: the unvalidated `RawOptions` as read from the command
// line or an options file, and the validated, immutable `Config`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{MetadataOverrides, PermissionSet, UserPassword};

pub const DEFAULT_OPACITY: f64 = 0.1;
pub const DEFAULT_GAP_RATIO: f64 = 0.5;
pub const DEFAULT_GAP_SIZE: f64 = 0.0;
pub const DEFAULT_FONT_SIZE: f64 = 20.0;
pub const DEFAULT_TEXT_ROTATION: f64 = 15.0;

/// Smallest accepted watermark font size, in points.
pub const MIN_FONT_SIZE: f64 = 1.0;

/// Options exactly as the user supplied them. Every field is optional so that
/// a JSON options file and the command line can be layered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawOptions {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub watermark_text: Option<Vec<String>>,
    pub watermark_image: Option<PathBuf>,
    pub watermark_font: Option<PathBuf>,
    pub opacity: Option<f64>,
    pub gap_ratio: Option<f64>,
    pub gap_size: Option<f64>,
    pub font_size: Option<f64>,
    pub text_rotation: Option<f64>,
    pub page_ranges: Option<String>,
    pub metadata: MetadataOverrides,
    pub allow_print: Option<bool>,
    pub allow_copy: Option<bool>,
    pub allow_assembly: Option<bool>,
    pub allow_annotations: Option<bool>,
    pub encryption_password: Option<UserPassword>,
}

impl RawOptions {
    /// Layer `self` over `base`: every field set here wins, unset fields fall
    /// back to `base`.
    pub fn overlay(self, base: RawOptions) -> RawOptions {
        RawOptions {
            source: self.source.or(base.source),
            target: self.target.or(base.target),
            watermark_text: self.watermark_text.or(base.watermark_text),
            watermark_image: self.watermark_image.or(base.watermark_image),
            watermark_font: self.watermark_font.or(base.watermark_font),
            opacity: self.opacity.or(base.opacity),
            gap_ratio: self.gap_ratio.or(base.gap_ratio),
            gap_size: self.gap_size.or(base.gap_size),
            font_size: self.font_size.or(base.font_size),
            text_rotation: self.text_rotation.or(base.text_rotation),
            page_ranges: self.page_ranges.or(base.page_ranges),
            metadata: MetadataOverrides {
                title: self.metadata.title.or(base.metadata.title),
                author: self.metadata.author.or(base.metadata.author),
                subject: self.metadata.subject.or(base.metadata.subject),
                keywords: self.metadata.keywords.or(base.metadata.keywords),
                creator: self.metadata.creator.or(base.metadata.creator),
            },
            allow_print: self.allow_print.or(base.allow_print),
            allow_copy: self.allow_copy.or(base.allow_copy),
            allow_assembly: self.allow_assembly.or(base.allow_assembly),
            allow_annotations: self.allow_annotations.or(base.allow_annotations),
            encryption_password: self.encryption_password.or(base.encryption_password),
        }
    }

    /// Parse an options file in JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The watermark a run applies: a block of text lines or a single image.
#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkSource {
    Text { lines: Vec<String> },
    Image { path: PathBuf },
}

/// Validated configuration for a single copy run.
///
/// Built once by [`crate::OptionsValidator`] and passed by reference to every
/// component; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub target: PathBuf,
    pub watermark: WatermarkSource,
    /// TrueType font for text watermarks; the standard Helvetica-Bold is used
    /// when unset.
    pub font_path: Option<PathBuf>,
    pub opacity: f64,
    pub gap_ratio: f64,
    pub gap_size: f64,
    pub font_size: f64,
    /// Text rotation in degrees, counter-clockwise.
    pub text_rotation: f64,
    pub page_ranges: Option<String>,
    pub metadata: MetadataOverrides,
    pub permissions: PermissionSet,
    pub user_password: Option<UserPassword>,
}

impl Config {
    /// A configuration with every optional setting at its default.
    pub fn new(
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
        watermark: WatermarkSource,
    ) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            target: target.as_ref().to_path_buf(),
            watermark,
            font_path: None,
            opacity: DEFAULT_OPACITY,
            gap_ratio: DEFAULT_GAP_RATIO,
            gap_size: DEFAULT_GAP_SIZE,
            font_size: DEFAULT_FONT_SIZE,
            text_rotation: DEFAULT_TEXT_ROTATION,
            page_ranges: None,
            metadata: MetadataOverrides::default(),
            permissions: PermissionSet::default(),
            user_password: None,
        }
    }
}

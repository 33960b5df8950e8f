// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments. Long option names keep their historical
// underscore spelling.

use std::path::PathBuf;

use clap::Parser;
use kopierwerk_core::{MetadataOverrides, RawOptions, UserPassword};

/// Copy a PDF with a tiled watermark, new metadata and fresh encryption.
#[derive(Debug, Parser)]
#[command(name = "kopierwerk", about, version)]
pub struct Cli {
    /// Source PDF
    #[arg(short = 'i', long = "file_input", value_name = "FILE")]
    pub file_input: Option<PathBuf>,

    /// Target PDF (created or overwritten)
    #[arg(short = 'o', long = "file_output", value_name = "FILE")]
    pub file_output: Option<PathBuf>,

    /// Document title
    #[arg(long = "md_title")]
    pub md_title: Option<String>,

    /// Document author
    #[arg(long = "md_author")]
    pub md_author: Option<String>,

    /// Document subject
    #[arg(long = "md_subject")]
    pub md_subject: Option<String>,

    /// Document keywords
    #[arg(long = "md_keywords")]
    pub md_keywords: Option<String>,

    /// Creating application
    #[arg(long = "md_creator")]
    pub md_creator: Option<String>,

    /// Allow printing
    #[arg(long = "allow_print")]
    pub allow_print: bool,

    /// Allow copying text and graphics
    #[arg(long = "allow_copy")]
    pub allow_copy: bool,

    /// Allow inserting, rotating and deleting pages
    #[arg(long = "allow_assembly")]
    pub allow_assembly: bool,

    /// Allow adding annotations
    #[arg(long = "allow_annotations")]
    pub allow_annotations: bool,

    /// Password required to open the copy. Default: none
    #[arg(long = "encryption_password", value_name = "PASSWORD")]
    pub encryption_password: Option<String>,

    /// Page ranges (e.g. '1-3,7,5-'). Default: all pages
    #[arg(long = "ranges")]
    pub ranges: Option<String>,

    /// Watermark text line; repeat for several lines
    #[arg(long = "wm_text", value_name = "LINE")]
    pub wm_text: Vec<String>,

    /// Watermark image (PNG or JPEG)
    #[arg(long = "wm_image", value_name = "FILE")]
    pub wm_image: Option<PathBuf>,

    /// Watermark opacity, 0 to 1. Default: 0.1
    #[arg(long = "wm_opacity")]
    pub wm_opacity: Option<f64>,

    /// Gap between tiles as a fraction of the tile size. Default: 0.5
    #[arg(long = "wm_gap_ratio")]
    pub wm_gap_ratio: Option<f64>,

    /// Extra gap between tiles in points. Default: 0
    #[arg(long = "wm_gap_size")]
    pub wm_gap_size: Option<f64>,

    /// Watermark font size in points. Default: 20
    #[arg(long = "wm_font_size")]
    pub wm_font_size: Option<f64>,

    /// Watermark text rotation in degrees. Default: 15
    #[arg(long = "wm_text_rotation", allow_hyphen_values = true)]
    pub wm_text_rotation: Option<f64>,

    /// TrueType font for text watermarks. Default: Helvetica-Bold
    #[arg(long = "wm_font", value_name = "FILE")]
    pub wm_font: Option<PathBuf>,

    /// JSON options file; command-line values take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The options given on the command line. Flags that were not passed stay
    /// unset so an options file can supply them.
    pub fn raw_options(&self) -> RawOptions {
        RawOptions {
            source: self.file_input.clone(),
            target: self.file_output.clone(),
            watermark_text: (!self.wm_text.is_empty()).then(|| self.wm_text.clone()),
            watermark_image: self.wm_image.clone(),
            watermark_font: self.wm_font.clone(),
            opacity: self.wm_opacity,
            gap_ratio: self.wm_gap_ratio,
            gap_size: self.wm_gap_size,
            font_size: self.wm_font_size,
            text_rotation: self.wm_text_rotation,
            page_ranges: self.ranges.clone(),
            metadata: MetadataOverrides {
                title: self.md_title.clone(),
                author: self.md_author.clone(),
                subject: self.md_subject.clone(),
                keywords: self.md_keywords.clone(),
                creator: self.md_creator.clone(),
            },
            allow_print: self.allow_print.then_some(true),
            allow_copy: self.allow_copy.then_some(true),
            allow_assembly: self.allow_assembly.then_some(true),
            allow_annotations: self.allow_annotations.then_some(true),
            encryption_password: self.encryption_password.clone().map(UserPassword::new),
        }
    }
}

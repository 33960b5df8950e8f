// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tiled watermarks: the watermark unit, its layout on a page and the drawing
// operators that place it.

pub mod image;
pub mod render;
pub mod size;
pub mod tiling;

use kopierwerk_core::config::{Config, WatermarkSource};
use kopierwerk_core::error::KopierwerkError;
use tracing::debug;

use crate::font::{FontMetrics, WatermarkFont};

pub use self::image::WatermarkImage;
pub use render::{WatermarkRenderer, WatermarkResources};
pub use size::{Gaps, SizeMetrics};
pub use tiling::{TileGrid, tiles};

/// Baseline-to-baseline distance of a text block, as a multiple of the font
/// size.
pub const LINE_PITCH: f64 = 1.5;

/// Blend mode of every watermark tile.
pub const BLEND_MODE: &str = "HardLight";

/// A block of text lines set in one font, size and rotation.
#[derive(Debug)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font: WatermarkFont,
    pub font_size: f64,
    /// Degrees, counter-clockwise.
    pub rotation: f64,
}

impl TextBlock {
    /// Baseline-to-baseline distance in points.
    pub fn line_height(&self) -> f64 {
        LINE_PITCH * self.font_size
    }

    /// Widest line, kerned.
    pub fn max_line_width(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| self.font.width_kerned(line, self.font_size))
            .fold(0.0, f64::max)
    }
}

/// The indivisible element tiled across every page.
#[derive(Debug)]
pub enum WatermarkUnit {
    Text(TextBlock),
    Image(WatermarkImage),
}

impl WatermarkUnit {
    /// Load the font or image named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, KopierwerkError> {
        match &config.watermark {
            WatermarkSource::Text { lines } => {
                let font = WatermarkFont::load(config.font_path.as_deref())?;
                debug!(
                    font = font.name(),
                    size = config.font_size,
                    lines = lines.len(),
                    "Watermark font loaded"
                );
                Ok(Self::Text(TextBlock {
                    lines: lines.clone(),
                    font,
                    font_size: config.font_size,
                    rotation: config.text_rotation,
                }))
            }
            WatermarkSource::Image { path } => Ok(Self::Image(WatermarkImage::open(path)?)),
        }
    }

    /// Short label for logs: `"text"` or `"image"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }
}

#[cfg(test)]
pub(crate) fn text_unit(lines: &[&str], font_size: f64, rotation: f64) -> WatermarkUnit {
    WatermarkUnit::Text(TextBlock {
        lines: lines.iter().map(|line| line.to_string()).collect(),
        font: WatermarkFont::Standard(crate::font::StandardFont::helvetica_bold()),
        font_size,
        rotation,
    })
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Footprint of one watermark tile: the rotated bounding box of the unit and
// the gap that separates neighbouring tiles.

use crate::font::FontMetrics;

use super::{TextBlock, WatermarkImage, WatermarkUnit};

/// Spacing between tiles: `ratio` of the unit's own size plus `size` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaps {
    pub ratio: f64,
    pub size: f64,
}

/// Layout dimensions of one watermark tile, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeMetrics {
    /// Width of the rotated unit's bounding box.
    pub real_width: f64,
    pub real_height: f64,
    pub gap_width: f64,
    pub gap_height: f64,
    /// Horizontal tile pitch: `real_width + gap_width`.
    pub total_width: f64,
    /// Vertical tile pitch: `real_height + gap_height`.
    pub total_height: f64,
    /// Distance from the first baseline down to the last one. Tiles are
    /// raised by this much so the whole text block clears the bottom edge.
    pub start_height: f64,
}

impl SizeMetrics {
    /// Tile footprint of `unit` with `gaps` around it.
    pub fn compute(unit: &WatermarkUnit, gaps: Gaps) -> Self {
        match unit {
            WatermarkUnit::Text(block) => Self::for_text(block, gaps),
            WatermarkUnit::Image(image) => Self::for_image(image, gaps),
        }
    }

    /// Axis-aligned bounds of the text block rotated by its angle.
    pub fn for_text(block: &TextBlock, gaps: Gaps) -> Self {
        let theta = block.rotation.to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

        let extra_lines = block.lines.len().saturating_sub(1) as f64;
        let start_height = extra_lines * block.line_height();
        let glyph_height =
            block.font.ascent(block.font_size) - block.font.descent(block.font_size);
        let block_width = block.max_line_width();
        let block_height = glyph_height + start_height;

        let real_width = block_width * cos + block_height * sin;
        let real_height = block_width * sin + block_height * cos;
        Self::with_gaps(real_width, real_height, start_height, gaps)
    }

    /// Images are placed unrotated at one point per pixel.
    pub fn for_image(image: &WatermarkImage, gaps: Gaps) -> Self {
        Self::with_gaps(image.width(), image.height(), 0.0, gaps)
    }

    fn with_gaps(real_width: f64, real_height: f64, start_height: f64, gaps: Gaps) -> Self {
        let gap_width = real_width * gaps.ratio + gaps.size;
        let gap_height = real_height * gaps.ratio + gaps.size;
        Self {
            real_width,
            real_height,
            gap_width,
            gap_height,
            total_width: real_width + gap_width,
            total_height: real_height + gap_height,
            start_height,
        }
    }

    /// Whether the pitch advances in both directions. A degenerate unit
    /// (e.g. an empty line at 0 degrees with no fixed gap) cannot be tiled.
    pub fn is_tileable(&self) -> bool {
        self.total_width.is_finite()
            && self.total_height.is_finite()
            && self.total_width > 0.0
            && self.total_height > 0.0
    }
}

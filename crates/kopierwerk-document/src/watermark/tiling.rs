// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tile origins over a page rectangle, column by column from the lower-left.

use kopierwerk_core::types::PageRect;

use super::SizeMetrics;

/// Most tiles placed on one page. Denser layouts are refused rather than
/// drawn.
pub const MAX_TILES_PER_PAGE: usize = 50_000;

/// Iterator over tile origins `(x, y)`. Columns are the outer loop and rows
/// the inner one; every origin lies inside the page rectangle.
#[derive(Debug, Clone)]
pub struct TileGrid {
    rect: PageRect,
    step_x: f64,
    step_y: f64,
    first_y: f64,
    x: f64,
    y: f64,
    exhausted: bool,
}

/// Lay out tiles of `metrics` over `rect`.
///
/// The first column sits half a horizontal gap in from the left edge. The
/// first row sits half a vertical gap up from the bottom edge, raised by the
/// text block's start height. An untileable unit yields no tiles.
pub fn tiles(rect: PageRect, metrics: &SizeMetrics) -> TileGrid {
    let first_x = rect.left + metrics.gap_width / 2.0;
    let first_y = rect.bottom + metrics.gap_height / 2.0 + metrics.start_height;
    TileGrid {
        rect,
        step_x: metrics.total_width,
        step_y: metrics.total_height,
        first_y,
        x: first_x,
        y: first_y,
        exhausted: !metrics.is_tileable(),
    }
}

impl TileGrid {
    /// Number of origins a fresh grid yields, from the closed form. A float,
    /// so that degenerate pitches cannot overflow.
    pub fn planned_len(&self) -> f64 {
        if self.exhausted {
            return 0.0;
        }
        let columns = ((self.rect.right - self.x) / self.step_x).ceil().max(0.0);
        let rows = ((self.rect.top - self.first_y) / self.step_y).ceil().max(0.0);
        columns * rows
    }
}

impl Iterator for TileGrid {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<(f64, f64)> {
        if self.exhausted {
            return None;
        }
        loop {
            if self.x >= self.rect.right {
                self.exhausted = true;
                return None;
            }
            if self.y < self.rect.top {
                let origin = (self.x, self.y);
                self.y += self.step_y;
                return Some(origin);
            }
            self.x += self.step_x;
            self.y = self.first_y;
        }
    }
}

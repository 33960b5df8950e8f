// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drawing operators for watermark tiles.

use std::ops::{Deref, DerefMut};

use lopdf::content::Operation;
use lopdf::{Document, Object, ObjectId, StringFormat, dictionary};
use tracing::trace;

use crate::font::{FontMetrics, winansi};
use crate::pdf::stamp::PageStamp;

use super::{BLEND_MODE, TextBlock, WatermarkImage, WatermarkUnit};

/// Output-document objects shared by every stamped page of a run.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkResources {
    graphics_state: ObjectId,
    drawable: ObjectId,
}

impl WatermarkResources {
    /// Register the transparency state and the font or image of `unit`.
    pub fn register(document: &mut Document, unit: &WatermarkUnit, opacity: f64) -> Self {
        let graphics_state = document.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(opacity as f32),
            "CA" => Object::Real(opacity as f32),
            "BM" => BLEND_MODE,
        });
        let drawable = match unit {
            WatermarkUnit::Text(block) => block.font.register(document),
            WatermarkUnit::Image(image) => image.register(document),
        };
        Self {
            graphics_state,
            drawable,
        }
    }
}

/// Draws one watermark unit at a sequence of tile origins.
pub struct WatermarkRenderer<'a> {
    unit: &'a WatermarkUnit,
    resources: WatermarkResources,
}

impl<'a> WatermarkRenderer<'a> {
    /// Draw `unit` with the resources registered for it.
    pub fn new(unit: &'a WatermarkUnit, resources: WatermarkResources) -> Self {
        Self { unit, resources }
    }

    /// Append the tiles to the stamp's over-content and return how many were
    /// drawn. Every tile shares the page-wide opacity and blend mode.
    pub fn render(
        &self,
        stamp: &mut PageStamp<'_>,
        tiles: impl IntoIterator<Item = (f64, f64)>,
    ) -> usize {
        let graphics_state = stamp.add_ext_gstate(self.resources.graphics_state);
        let drawable = match self.unit {
            WatermarkUnit::Text(_) => stamp.add_font(self.resources.drawable),
            WatermarkUnit::Image(_) => stamp.add_xobject(self.resources.drawable),
        };

        let mut ops = SavedState::push(stamp.over_content());
        ops.push(Operation::new("gs", vec![Object::Name(graphics_state)]));
        let count = match self.unit {
            WatermarkUnit::Text(block) => draw_text(&mut ops, block, drawable, tiles),
            WatermarkUnit::Image(image) => draw_image(&mut ops, image, drawable, tiles),
        };
        trace!(tiles = count, kind = self.unit.kind(), "Watermark tiles drawn");
        count
    }
}

/// `q` on creation, `Q` on drop, so every save is matched by a restore.
struct SavedState<'a> {
    ops: &'a mut Vec<Operation>,
}

impl<'a> SavedState<'a> {
    fn push(ops: &'a mut Vec<Operation>) -> Self {
        ops.push(Operation::new("q", Vec::new()));
        Self { ops }
    }
}

impl Deref for SavedState<'_> {
    type Target = Vec<Operation>;

    fn deref(&self) -> &Vec<Operation> {
        self.ops
    }
}

impl DerefMut for SavedState<'_> {
    fn deref_mut(&mut self) -> &mut Vec<Operation> {
        self.ops
    }
}

impl Drop for SavedState<'_> {
    fn drop(&mut self) {
        self.ops.push(Operation::new("Q", Vec::new()));
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn draw_text(
    ops: &mut Vec<Operation>,
    block: &TextBlock,
    font: Vec<u8>,
    tiles: impl IntoIterator<Item = (f64, f64)>,
) -> usize {
    let theta = block.rotation.to_radians();
    let (sin, cos) = theta.sin_cos();
    let line_height = block.line_height();
    let lines: Vec<Object> = block
        .lines
        .iter()
        .map(|line| Object::Array(kerned_text(&block.font, line)))
        .collect();

    ops.push(Operation::new("Tf", vec![Object::Name(font), real(block.font_size)]));
    ops.push(Operation::new("g", vec![real(0.0)]));
    ops.push(Operation::new("BT", Vec::new()));
    let mut count = 0;
    for (x, y) in tiles {
        ops.push(Operation::new(
            "Tm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(x), real(y)],
        ));
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                ops.push(Operation::new("Td", vec![real(0.0), real(-line_height)]));
            }
            ops.push(Operation::new("TJ", vec![line.clone()]));
        }
        count += 1;
    }
    ops.push(Operation::new("ET", Vec::new()));
    count
}

fn draw_image(
    ops: &mut Vec<Operation>,
    image: &WatermarkImage,
    xobject: Vec<u8>,
    tiles: impl IntoIterator<Item = (f64, f64)>,
) -> usize {
    let mut count = 0;
    for (x, y) in tiles {
        let mut tile = SavedState::push(ops);
        tile.push(Operation::new(
            "cm",
            vec![
                real(image.width()),
                real(0.0),
                real(0.0),
                real(image.height()),
                real(x),
                real(y),
            ],
        ));
        tile.push(Operation::new("Do", vec![Object::Name(xobject.clone())]));
        count += 1;
    }
    count
}

/// `TJ` operand for `text`: WinAnsi runs separated by kerning adjustments.
pub(crate) fn kerned_text(font: &dyn FontMetrics, text: &str) -> Vec<Object> {
    let codes = winansi::encode(text);
    let mut items = Vec::new();
    let mut run = Vec::with_capacity(codes.len());
    for (index, code) in codes.iter().enumerate() {
        if index > 0 {
            let kern = font.kerning(codes[index - 1], *code);
            if kern != 0 {
                items.push(Object::String(std::mem::take(&mut run), StringFormat::Literal));
                // TJ numbers are subtracted from the advance.
                items.push(Object::Integer(i64::from(-kern)));
            }
        }
        run.push(*code);
    }
    if !run.is_empty() || items.is_empty() {
        items.push(Object::String(run, StringFormat::Literal));
    }
    items
}

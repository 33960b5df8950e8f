// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Helvetica-Bold, one of the 14 standard Type 1 fonts. Viewers supply the
// glyphs, so only the metrics live here (from the Adobe Core 14 AFM).

use lopdf::{Document, ObjectId, dictionary};

use super::FontMetrics;

pub const BASE_FONT: &str = "Helvetica-Bold";

/// Advance widths indexed by WinAnsi code, in 1/1000 em. Codes with no
/// glyph in the encoding are zero.
#[rustfmt::skip]
const WIDTHS: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0 - 9 : ; < = > ?
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    // @ A - O
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    // P - Z [ \ ] ^ _
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    // ` a - o
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    // p - z { | } ~
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    // Euro .. Zcaron
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    // quoteleft .. Ydieresis
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    // nbsp .. macron
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    // degree .. questiondown
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    // Agrave .. Idieresis
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    // Eth .. germandbls
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    // agrave .. idieresis
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    // eth .. ydieresis
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

const ASCENDER: i32 = 718;
const DESCENDER: i32 = -207;

/// Pair kerning as `(left, right, adjustment)` over WinAnsi codes, sorted by
/// `(left, right)`. Adieresis and Aring kern like A.
const KERNING_PAIRS: &[(u8, u8, i16)] = &[
    (b'A', b'T', -90),
    (b'A', b'V', -80),
    (b'A', b'W', -60),
    (b'A', b'Y', -110),
    (b'A', b'v', -40),
    (b'A', b'w', -30),
    (b'A', b'y', -30),
    (b'F', b',', -100),
    (b'F', b'.', -100),
    (b'F', b'A', -80),
    (b'L', b'T', -90),
    (b'L', b'V', -110),
    (b'L', b'W', -80),
    (b'L', b'Y', -120),
    (b'P', b',', -120),
    (b'P', b'.', -120),
    (b'P', b'A', -100),
    (b'T', b',', -80),
    (b'T', b'.', -80),
    (b'T', b'A', -90),
    (b'T', b'a', -80),
    (b'T', b'o', -80),
    (b'T', 0xC4, -90),
    (b'T', 0xC5, -90),
    (b'V', b',', -120),
    (b'V', b'.', -120),
    (b'V', b'A', -80),
    (b'V', b'a', -60),
    (b'V', b'o', -90),
    (b'V', 0xC4, -80),
    (b'V', 0xC5, -80),
    (b'W', b',', -80),
    (b'W', b'.', -80),
    (b'W', b'A', -60),
    (b'W', b'a', -40),
    (b'W', b'o', -60),
    (b'W', 0xC4, -60),
    (b'W', 0xC5, -60),
    (b'Y', b',', -100),
    (b'Y', b'.', -100),
    (b'Y', b'A', -110),
    (b'Y', b'a', -100),
    (b'Y', b'o', -110),
    (b'Y', 0xC4, -110),
    (b'Y', 0xC5, -110),
    (0xC4, b'T', -90),
    (0xC4, b'V', -80),
    (0xC4, b'W', -60),
    (0xC4, b'Y', -110),
    (0xC5, b'T', -90),
    (0xC5, b'V', -80),
    (0xC5, b'W', -60),
    (0xC5, b'Y', -110),
];

/// The built-in watermark font.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFont;

impl StandardFont {
    /// Helvetica-Bold with WinAnsiEncoding, the default watermark face.
    pub fn helvetica_bold() -> Self {
        Self
    }

    /// Add the (non-embedded) font dictionary to `document`.
    pub fn register(&self, document: &mut Document) -> ObjectId {
        document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => BASE_FONT,
            "Encoding" => "WinAnsiEncoding",
        })
    }
}

impl FontMetrics for StandardFont {
    fn glyph_width(&self, code: u8) -> i32 {
        i32::from(WIDTHS[usize::from(code)])
    }

    fn kerning(&self, left: u8, right: u8) -> i32 {
        KERNING_PAIRS
            .binary_search_by(|(l, r, _)| (*l, *r).cmp(&(left, right)))
            .map(|index| i32::from(KERNING_PAIRS[index].2))
            .unwrap_or(0)
    }

    fn ascender(&self) -> i32 {
        ASCENDER
    }

    fn descender(&self) -> i32 {
        DESCENDER
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fonts for text watermarks: metrics used by the layout and the PDF font
// resource used by the renderer.

pub mod standard;
pub mod truetype;
pub mod winansi;

use std::path::Path;

use kopierwerk_core::error::KopierwerkError;
use lopdf::{Document, ObjectId};

pub use standard::StandardFont;
pub use truetype::TrueTypeFont;

/// Glyph metrics over WinAnsi codes, in 1/1000 em.
pub trait FontMetrics {
    /// Advance width of the glyph for `code`.
    fn glyph_width(&self, code: u8) -> i32;

    /// Pair kerning between two codes; negative values pull glyphs together.
    fn kerning(&self, left: u8, right: u8) -> i32;

    fn ascender(&self) -> i32;

    /// Negative for fonts that extend below the baseline.
    fn descender(&self) -> i32;

    /// Width of `text` at `font_size` points, pair kerning included.
    fn width_kerned(&self, text: &str, font_size: f64) -> f64 {
        let codes = winansi::encode(text);
        let advance: i64 = codes.iter().map(|code| i64::from(self.glyph_width(*code))).sum();
        let kerning: i64 = codes
            .windows(2)
            .map(|pair| i64::from(self.kerning(pair[0], pair[1])))
            .sum();
        (advance + kerning) as f64 * font_size / 1000.0
    }

    /// Distance from the baseline to the top of the font, in points.
    fn ascent(&self, font_size: f64) -> f64 {
        f64::from(self.ascender()) * font_size / 1000.0
    }

    /// Distance from the baseline to the bottom of the font, in points.
    fn descent(&self, font_size: f64) -> f64 {
        f64::from(self.descender()) * font_size / 1000.0
    }
}

/// The font a text watermark is set in.
#[derive(Debug)]
pub enum WatermarkFont {
    Standard(StandardFont),
    TrueType(TrueTypeFont),
}

impl WatermarkFont {
    /// Load the TrueType font at `path`, or fall back to Helvetica-Bold.
    pub fn load(path: Option<&Path>) -> Result<Self, KopierwerkError> {
        match path {
            Some(path) => Ok(Self::TrueType(TrueTypeFont::open(path)?)),
            None => Ok(Self::Standard(StandardFont::helvetica_bold())),
        }
    }

    /// Add the font resource (and any embedded font program) to `document`.
    pub fn register(&self, document: &mut Document) -> ObjectId {
        match self {
            Self::Standard(font) => font.register(document),
            Self::TrueType(font) => font.register(document),
        }
    }

    /// PostScript name of the face, as written to `/BaseFont`.
    pub fn name(&self) -> &str {
        match self {
            Self::Standard(_) => standard::BASE_FONT,
            Self::TrueType(font) => font.base_name(),
        }
    }
}

impl FontMetrics for WatermarkFont {
    fn glyph_width(&self, code: u8) -> i32 {
        match self {
            Self::Standard(font) => font.glyph_width(code),
            Self::TrueType(font) => font.glyph_width(code),
        }
    }

    fn kerning(&self, left: u8, right: u8) -> i32 {
        match self {
            Self::Standard(font) => font.kerning(left, right),
            Self::TrueType(font) => font.kerning(left, right),
        }
    }

    fn ascender(&self) -> i32 {
        match self {
            Self::Standard(font) => font.ascender(),
            Self::TrueType(font) => font.ascender(),
        }
    }

    fn descender(&self) -> i32 {
        match self {
            Self::Standard(font) => font.descender(),
            Self::TrueType(font) => font.descender(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_loads_helvetica_bold() {
        let font = WatermarkFont::load(None).unwrap();
        assert_eq!(font.name(), "Helvetica-Bold");
        assert!(font.width_kerned("X", 20.0) > 0.0);
    }

    #[test]
    fn unreadable_font_file_is_font_error() {
        let err = WatermarkFont::load(Some(Path::new("/no/such/font.ttf"))).unwrap_err();
        assert!(matches!(err, KopierwerkError::FontError(_)));
    }

    #[test]
    fn empty_text_has_no_width() {
        let font = WatermarkFont::load(None).unwrap();
        assert_eq!(font.width_kerned("", 20.0), 0.0);
    }
}

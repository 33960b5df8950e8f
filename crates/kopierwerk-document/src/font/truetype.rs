// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TrueType watermark fonts, measured with `ab_glyph` and embedded whole as a
// simple WinAnsi-encoded font (`/FontFile2`).

use std::fmt;
use std::path::Path;

use ab_glyph::{Font, FontVec, GlyphId};
use kopierwerk_core::error::KopierwerkError;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, instrument};

use super::{FontMetrics, winansi};

const FIRST_CHAR: u8 = 0x20;
const LAST_CHAR: u8 = 0xFF;
const CODE_COUNT: usize = (LAST_CHAR - FIRST_CHAR) as usize + 1;

/// Font descriptor flag: uses the standard Latin character set.
const NONSYMBOLIC: i64 = 1 << 5;

pub struct TrueTypeFont {
    program: Vec<u8>,
    face: FontVec,
    base_name: String,
    units_per_em: f32,
    glyphs: [GlyphId; CODE_COUNT],
    /// Advance widths for `FIRST_CHAR..=LAST_CHAR`, in 1/1000 em.
    widths: [i32; CODE_COUNT],
    ascender: i32,
    descender: i32,
}

impl TrueTypeFont {
    /// Read a TrueType font file. The base name is derived from the file
    /// stem.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, KopierwerkError> {
        let program = std::fs::read(path).map_err(|err| {
            KopierwerkError::FontError(format!("cannot read {}: {err}", path.display()))
        })?;
        let base_name = path
            .file_stem()
            .map(|stem| postscript_name(&stem.to_string_lossy()))
            .unwrap_or_else(|| postscript_name(""));
        Self::from_bytes(program, base_name)
    }

    /// Parse a TrueType program and measure the WinAnsi glyphs.
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::FontError`] if `program` is not a font
    /// `ab_glyph` can read.
    pub fn from_bytes(program: Vec<u8>, base_name: String) -> Result<Self, KopierwerkError> {
        let face = FontVec::try_from_vec(program.clone())
            .map_err(|err| KopierwerkError::FontError(format!("not a TrueType font: {err}")))?;
        let units_per_em = face
            .units_per_em()
            .filter(|units| *units > 0.0)
            .ok_or_else(|| KopierwerkError::FontError("font has no units per em".into()))?;

        let mut glyphs = [GlyphId(0); CODE_COUNT];
        let mut widths = [0; CODE_COUNT];
        for (index, code) in (FIRST_CHAR..=LAST_CHAR).enumerate() {
            let glyph = winansi::decode(code)
                .map(|ch| face.glyph_id(ch))
                .unwrap_or(GlyphId(0));
            glyphs[index] = glyph;
            widths[index] = to_thousandths(face.h_advance_unscaled(glyph), units_per_em);
        }

        let ascender = to_thousandths(face.ascent_unscaled(), units_per_em);
        let descender = to_thousandths(face.descent_unscaled(), units_per_em);
        debug!(
            base_name = %base_name,
            units_per_em = f64::from(units_per_em),
            ascender,
            descender,
            "TrueType font loaded"
        );

        Ok(Self {
            program,
            face,
            base_name,
            units_per_em,
            glyphs,
            widths,
            ascender,
            descender,
        })
    }

    /// PostScript name written to `/BaseFont` and `/FontName`.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Embed the font program and add the font dictionary to `document`.
    pub fn register(&self, document: &mut Document) -> ObjectId {
        let program_length = self.program.len() as i64;
        let program_id = document.add_object(Stream::new(
            dictionary! { "Length1" => program_length },
            self.program.clone(),
        ));

        let max_width = self.widths.iter().copied().max().unwrap_or(1000);
        let bbox: Vec<Object> = [0, self.descender, max_width, self.ascender]
            .into_iter()
            .map(|value| Object::Integer(i64::from(value)))
            .collect();
        let descriptor_id = document.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.base_name.clone().into_bytes()),
            "Flags" => NONSYMBOLIC,
            "FontBBox" => bbox,
            "ItalicAngle" => 0,
            "Ascent" => i64::from(self.ascender),
            "Descent" => i64::from(self.descender),
            "CapHeight" => i64::from(self.ascender),
            "StemV" => 80,
            "FontFile2" => program_id,
        });

        let widths: Vec<Object> = self
            .widths
            .iter()
            .map(|width| Object::Integer(i64::from(*width)))
            .collect();
        document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(self.base_name.clone().into_bytes()),
            "FirstChar" => i64::from(FIRST_CHAR),
            "LastChar" => i64::from(LAST_CHAR),
            "Widths" => widths,
            "FontDescriptor" => descriptor_id,
            "Encoding" => "WinAnsiEncoding",
        })
    }

    fn glyph(&self, code: u8) -> GlyphId {
        match code.checked_sub(FIRST_CHAR) {
            Some(index) => self.glyphs[usize::from(index)],
            None => GlyphId(0),
        }
    }
}

impl FontMetrics for TrueTypeFont {
    fn glyph_width(&self, code: u8) -> i32 {
        match code.checked_sub(FIRST_CHAR) {
            Some(index) => self.widths[usize::from(index)],
            None => 0,
        }
    }

    fn kerning(&self, left: u8, right: u8) -> i32 {
        let kern = self.face.kern_unscaled(self.glyph(left), self.glyph(right));
        to_thousandths(kern, self.units_per_em)
    }

    fn ascender(&self) -> i32 {
        self.ascender
    }

    fn descender(&self) -> i32 {
        self.descender
    }
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("base_name", &self.base_name)
            .field("program_len", &self.program.len())
            .field("units_per_em", &self.units_per_em)
            .finish_non_exhaustive()
    }
}

fn to_thousandths(units: f32, units_per_em: f32) -> i32 {
    (units * 1000.0 / units_per_em).round() as i32
}

/// PDF names of embedded fonts may not contain spaces or delimiters.
fn postscript_name(stem: &str) -> String {
    let name: String = stem
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .collect();
    if name.is_empty() {
        "KopierwerkEmbedded".to_string()
    } else {
        name
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WinAnsiEncoding (PDF 1.7, Annex D). Watermark text is written as
// single-byte strings in this encoding for both the standard and embedded
// TrueType fonts.

/// Byte written for characters the encoding cannot represent.
pub const REPLACEMENT: u8 = b'?';

/// Codes 0x80..=0x9F, where WinAnsi departs from Latin-1. `None` marks the
/// five undefined codes.
const HIGH_CONTROL_RANGE: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// The character a WinAnsi code stands for, if any. Codes below 0x20 are
/// treated as unmapped.
pub fn decode(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E => Some(char::from(code)),
        0x80..=0x9F => HIGH_CONTROL_RANGE[usize::from(code - 0x80)],
        0xA0..=0xFF => Some(char::from(code)),
        _ => None,
    }
}

/// The WinAnsi code of `ch`, if the encoding has one.
pub fn encode_char(ch: char) -> Option<u8> {
    match u32::from(ch) {
        code @ 0x20..=0x7E => u8::try_from(code).ok(),
        code @ 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => HIGH_CONTROL_RANGE
            .iter()
            .position(|mapped| *mapped == Some(ch))
            .and_then(|offset| u8::try_from(0x80 + offset).ok()),
    }
}

/// Encode `text`, substituting [`REPLACEMENT`] for unmappable characters.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| encode_char(ch).unwrap_or(REPLACEMENT))
        .collect()
}

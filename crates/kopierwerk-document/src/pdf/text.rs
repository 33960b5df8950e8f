// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text strings and dates (ISO 32000-1, 7.9.2 and 7.9.4).

use chrono::{DateTime, Offset, TimeZone};
use lopdf::{Object, StringFormat};

/// Encode `text` as a PDF text string: a literal when it is plain ASCII,
/// otherwise UTF-16BE with a byte order mark.
pub fn encode_text_string(text: &str) -> Object {
    if text.chars().all(|ch| ch.is_ascii() && !ch.is_ascii_control()) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode the bytes of a PDF text string.
///
/// UTF-16BE and UTF-8 are recognised by their byte order marks; anything else
/// is read as PDFDocEncoding, approximated by Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|byte| char::from(*byte)).collect()
}

/// `D:YYYYMMDDHHmmSS+HH'mm'`
pub fn pdf_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    let offset_minutes = at.offset().fix().local_minus_utc() / 60;
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let offset_minutes = offset_minutes.abs();
    format!(
        "D:{}{sign}{:02}'{:02}'",
        at.naive_local().format("%Y%m%d%H%M%S"),
        offset_minutes / 60,
        offset_minutes % 60
    )
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn bytes_of(object: &Object) -> &[u8] {
        match object {
            Object::String(bytes, _) => bytes,
            other => panic!("not a string: {other:?}"),
        }
    }

    #[test]
    fn ascii_stays_literal() {
        let object = encode_text_string("Quarterly report");
        assert!(matches!(object, Object::String(_, StringFormat::Literal)));
        assert_eq!(bytes_of(&object), b"Quarterly report");
    }

    #[test]
    fn non_ascii_is_utf16_with_bom() {
        let object = encode_text_string("Prüfbericht");
        let bytes = bytes_of(&object);
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(bytes), "Prüfbericht");
    }

    #[test]
    fn latin1_fallback() {
        assert_eq!(decode_text_string(&[b'J', 0xFC, b'r', b'g']), "Jürg");
    }

    #[test]
    fn utf8_bom_is_recognised() {
        assert_eq!(decode_text_string("\u{feff}Ωmega".as_bytes()), "Ωmega");
    }

    #[test]
    fn dates_carry_the_offset() {
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = east.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(pdf_date(&at), "D:20260307090501+02'00'");

        let west = FixedOffset::west_opt(3 * 3600 + 30 * 60).unwrap();
        let at = west.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(pdf_date(&at), "D:20261231235959-03'30'");
    }
}

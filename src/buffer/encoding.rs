/// Encoding codec: byte sequences to and from text encodings.
///
/// Decode and encode never fail: malformed bytes pass through as their
/// raw values rather than raising. The only fallible entry point is
/// [`transcode`], and only when an unpaired surrogate crosses the
/// utf16/utf8 boundary.
use base64::alphabet;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use log::debug;

use crate::config::types::{EngineError, Result};

/// Forgiving parser for guest-supplied base64: padding optional,
/// trailing bits tolerated. Non-alphabet bytes are filtered out before
/// this engine ever sees them.
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Closed set of supported text encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
    Hex,
    Base64,
    Base64Url,
}

impl Encoding {
    /// Resolve an encoding name, case- and hyphen-insensitively.
    ///
    /// `"UTF-8"` ≡ `"utf8"`, `"ucs2"`/`"ucs-2"` ≡ `"utf16le"`,
    /// `"binary"` ≡ `"latin1"`.
    pub fn resolve(name: &str) -> Option<Encoding> {
        let mut key = String::with_capacity(name.len());
        for ch in name.chars() {
            if ch != '-' {
                key.push(ch.to_ascii_lowercase());
            }
        }
        match key.as_str() {
            "utf8" => Some(Encoding::Utf8),
            "utf16le" | "ucs2" => Some(Encoding::Utf16Le),
            "latin1" | "binary" => Some(Encoding::Latin1),
            "ascii" => Some(Encoding::Ascii),
            "hex" => Some(Encoding::Hex),
            "base64" => Some(Encoding::Base64),
            "base64url" => Some(Encoding::Base64Url),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Utf16Le => "utf16le",
            Encoding::Latin1 => "latin1",
            Encoding::Ascii => "ascii",
            Encoding::Hex => "hex",
            Encoding::Base64 => "base64",
            Encoding::Base64Url => "base64url",
        }
    }

}

/// Convert bytes to their text representation under `encoding`.
pub fn decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => decode_utf8_raw(bytes),
        Encoding::Utf16Le => {
            // An odd trailing byte is not half a unit; it is dropped.
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        Encoding::Ascii => bytes.iter().map(|&b| char::from(b & 0x7F)).collect(),
        Encoding::Hex => {
            const DIGITS: &[u8; 16] = b"0123456789abcdef";
            let mut out = String::with_capacity(bytes.len() * 2);
            for &b in bytes {
                out.push(DIGITS[(b >> 4) as usize] as char);
                out.push(DIGITS[(b & 0x0F) as usize] as char);
            }
            out
        }
        Encoding::Base64 => STANDARD.encode(bytes),
        Encoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
    }
}

/// Convert text to bytes under `encoding`.
pub fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Utf16Le => text
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect(),
        // Narrowing happens per UTF-16 code unit, matching the emulated
        // runtime's charCodeAt-based encoders.
        Encoding::Latin1 | Encoding::Ascii => {
            text.encode_utf16().map(|unit| (unit & 0xFF) as u8).collect()
        }
        Encoding::Hex => encode_hex(text),
        Encoding::Base64 | Encoding::Base64Url => parse_base64(text),
    }
}

/// True iff every byte is seven-bit. Empty input is ascii.
pub fn is_ascii(bytes: &[u8]) -> bool {
    bytes.is_ascii()
}

/// Byte length of `text` once converted, without materializing the
/// conversion for the fixed-width encodings.
pub fn byte_length(text: &str, encoding: Encoding) -> usize {
    match encoding {
        Encoding::Utf8 => text.len(),
        Encoding::Latin1 | Encoding::Ascii => text.encode_utf16().count(),
        Encoding::Utf16Le => text.encode_utf16().count() * 2,
        Encoding::Hex => text.encode_utf16().count() / 2,
        Encoding::Base64 | Encoding::Base64Url => {
            let meaningful = text
                .bytes()
                .filter(|b| is_base64_alphabet(*b))
                .count();
            (meaningful / 4) * 3
                + match meaningful % 4 {
                    2 => 1,
                    3 => 2,
                    // A single leftover sextet cannot form a byte.
                    _ => 0,
                }
        }
    }
}

/// Transcode bytes between two encodings from the restricted set
/// {ascii, utf8, utf16le, latin1} (ucs2 resolves to utf16le).
///
/// A dangling trailing byte of an incomplete multi-byte unit on the
/// input side is silently truncated. An unpaired surrogate is an error
/// only when crossing the utf16 → utf8 boundary, never within the
/// utf16 family.
pub fn transcode(bytes: &[u8], from: Encoding, to: Encoding) -> Result<Vec<u8>> {
    check_transcodable(from)?;
    check_transcodable(to)?;

    let units = to_units(bytes, from);
    match to {
        Encoding::Utf16Le => Ok(units
            .iter()
            .flat_map(|unit| unit.to_le_bytes())
            .collect()),
        Encoding::Utf8 => units_to_utf8(&units),
        Encoding::Latin1 | Encoding::Ascii => {
            Ok(units.iter().map(|&unit| (unit & 0xFF) as u8).collect())
        }
        _ => unreachable!("checked by check_transcodable"),
    }
}

fn check_transcodable(encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Utf8 | Encoding::Utf16Le | Encoding::Latin1 | Encoding::Ascii => Ok(()),
        other => Err(EngineError::type_error(format!(
            "Encoding '{}' is not supported for transcode",
            other.name()
        ))),
    }
}

/// Lift input bytes into UTF-16 code units, truncating a dangling
/// trailing unit.
fn to_units(bytes: &[u8], from: Encoding) -> Vec<u16> {
    match from {
        Encoding::Utf16Le => bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect(),
        Encoding::Latin1 => bytes.iter().map(|&b| u16::from(b)).collect(),
        Encoding::Ascii => bytes.iter().map(|&b| u16::from(b & 0x7F)).collect(),
        Encoding::Utf8 => {
            let mut units = Vec::with_capacity(bytes.len());
            let mut i = 0;
            let mut unit_buf = [0u16; 2];
            while i < bytes.len() {
                match next_utf8_scalar(&bytes[i..]) {
                    Some((ch, consumed)) => {
                        units.extend_from_slice(ch.encode_utf16(&mut unit_buf));
                        i += consumed;
                    }
                    None if is_truncated_tail(&bytes[i..]) => break,
                    None => {
                        units.push(u16::from(bytes[i]));
                        i += 1;
                    }
                }
            }
            units
        }
        _ => unreachable!("checked by check_transcodable"),
    }
}

fn units_to_utf8(units: &[u16]) -> Result<Vec<u8>> {
    match String::from_utf16(units) {
        Ok(s) => Ok(s.into_bytes()),
        Err(_) => Err(EngineError::transcode_failed(
            "Unable to transcode bytes: unpaired surrogate".to_string(),
        )),
    }
}

/// Decode one scalar from the front of `bytes`, rejecting overlong
/// forms, surrogates, and values beyond U+10FFFF.
fn next_utf8_scalar(bytes: &[u8]) -> Option<(char, usize)> {
    let b0 = *bytes.first()?;
    if b0 < 0x80 {
        return Some((char::from(b0), 1));
    }
    let (len, init, min) = match b0 {
        0xC2..=0xDF => (2, u32::from(b0 & 0x1F), 0x80),
        0xE0..=0xEF => (3, u32::from(b0 & 0x0F), 0x800),
        0xF0..=0xF4 => (4, u32::from(b0 & 0x07), 0x10000),
        _ => return None,
    };
    if bytes.len() < len {
        return None;
    }
    let mut cp = init;
    for &b in &bytes[1..len] {
        if b & 0xC0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | u32::from(b & 0x3F);
    }
    if cp < min {
        return None;
    }
    char::from_u32(cp).map(|ch| (ch, len))
}

/// True when the remaining bytes are a plausible prefix of one
/// multi-byte sequence cut off by the end of input.
fn is_truncated_tail(bytes: &[u8]) -> bool {
    let b0 = match bytes.first() {
        Some(&b) => b,
        None => return false,
    };
    let need = match b0 {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return false,
    };
    bytes.len() < need && bytes[1..].iter().all(|&b| b & 0xC0 == 0x80)
}

/// Raw-value UTF-8 decoding: valid sequences decode normally, every
/// invalid byte passes through as its own code point.
fn decode_utf8_raw(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match next_utf8_scalar(&bytes[i..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                i += consumed;
            }
            None => {
                out.push(char::from(bytes[i]));
                i += 1;
            }
        }
    }
    out
}

/// Parse hex text into bytes, stopping at the first invalid or
/// incomplete pair.
fn encode_hex(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut chars = text.chars();
    while let Some(hi) = chars.next() {
        let lo = match chars.next() {
            Some(lo) => lo,
            None => break,
        };
        match (hi.to_digit(16), lo.to_digit(16)) {
            (Some(h), Some(l)) => out.push(((h << 4) | l) as u8),
            _ => break,
        }
    }
    out
}

fn is_base64_alphabet(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_')
}

/// Forgiving base64 parse: url-safe characters are folded into the
/// standard alphabet, everything outside the alphabet (padding and
/// whitespace included) is dropped, and a single leftover sextet is
/// truncated.
fn parse_base64(text: &str) -> Vec<u8> {
    let mut filtered: Vec<u8> = text
        .bytes()
        .filter(|b| is_base64_alphabet(*b))
        .map(|b| match b {
            b'-' => b'+',
            b'_' => b'/',
            other => other,
        })
        .collect();
    if filtered.len() % 4 == 1 {
        filtered.pop();
    }
    match FORGIVING_BASE64.decode(&filtered) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!("base64 parse degraded to empty: {}", err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolution_case_and_hyphen_insensitive() {
        assert_eq!(Encoding::resolve("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::resolve("ucs2"), Some(Encoding::Utf16Le));
        assert_eq!(Encoding::resolve("UCS-2"), Some(Encoding::Utf16Le));
        assert_eq!(Encoding::resolve("binary"), Some(Encoding::Latin1));
        assert_eq!(Encoding::resolve("Base64URL"), Some(Encoding::Base64Url));
        assert_eq!(Encoding::resolve("koi8-r"), None);
    }

    #[test]
    fn utf8_round_trip_idempotent() {
        for s in ["", "plain", "héllo wörld", "日本語", "emoji \u{1F600} mix"] {
            assert_eq!(decode(&encode(s, Encoding::Utf8), Encoding::Utf8), s);
        }
    }

    #[test]
    fn malformed_utf8_never_throws() {
        // Lone continuation bytes pass through as raw values.
        let decoded = decode(&[0x61, 0x80, 0x62], Encoding::Utf8);
        assert_eq!(decoded, "a\u{80}b");
        // Overlong encoding of '/' is not accepted as '/'.
        let overlong = decode(&[0xC0, 0xAF], Encoding::Utf8);
        assert_eq!(overlong, "\u{C0}\u{AF}");
    }

    #[test]
    fn ascii_decode_masks_high_bit() {
        assert_eq!(decode(&[0xE9], Encoding::Ascii), "i");
        assert_eq!(decode(&[0xE9], Encoding::Latin1), "é");
    }

    #[test]
    fn latin1_narrows_per_code_unit() {
        assert_eq!(encode("é", Encoding::Latin1), vec![0xE9]);
        assert_eq!(encode("ā", Encoding::Latin1), vec![0x01]);
    }

    #[test]
    fn hex_stops_at_invalid_pair() {
        assert_eq!(encode("1a2b", Encoding::Hex), vec![0x1A, 0x2B]);
        assert_eq!(encode("1a2x3c", Encoding::Hex), vec![0x1A]);
        assert_eq!(encode("1a2", Encoding::Hex), vec![0x1A]);
        assert_eq!(decode(&[0xDE, 0xAD], Encoding::Hex), "dead");
    }

    #[test]
    fn base64_forgiving_parse() {
        assert_eq!(encode("aGk=", Encoding::Base64), b"hi");
        assert_eq!(encode("aGk", Encoding::Base64), b"hi");
        assert_eq!(encode("aG\nk=", Encoding::Base64), b"hi");
        // url-safe characters accepted by the standard parser too
        assert_eq!(
            encode("_-8", Encoding::Base64),
            encode("/+8", Encoding::Base64)
        );
        assert_eq!(decode(b"hi", Encoding::Base64), "aGk=");
        assert_eq!(decode(b"hi", Encoding::Base64Url), "aGk");
    }

    #[test]
    fn byte_length_without_materializing() {
        assert_eq!(byte_length("héllo", Encoding::Utf8), 6);
        assert_eq!(byte_length("héllo", Encoding::Latin1), 5);
        assert_eq!(byte_length("héllo", Encoding::Utf16Le), 10);
        assert_eq!(byte_length("deadbeef", Encoding::Hex), 4);
        assert_eq!(byte_length("aGk=", Encoding::Base64), 2);
        assert_eq!(byte_length("aGk", Encoding::Base64), 2);
        // Astral chars occupy two units.
        assert_eq!(byte_length("\u{1F600}", Encoding::Utf16Le), 4);
        assert_eq!(byte_length("\u{1F600}", Encoding::Latin1), 2);
    }

    #[test]
    fn is_ascii_contract() {
        assert!(is_ascii(b""));
        assert!(is_ascii(b"plain text"));
        assert!(!is_ascii(&[0x80]));
    }

    #[test]
    fn transcode_latin1_to_utf8_widens() {
        let out = transcode(&[0xE9], Encoding::Latin1, Encoding::Utf8).unwrap();
        assert_eq!(out, "é".as_bytes());
    }

    #[test]
    fn transcode_truncates_dangling_tail() {
        // 'é' in utf8 is C3 A9; a bare C3 at the end is dropped.
        let out = transcode(b"ab\xC3", Encoding::Utf8, Encoding::Utf16Le).unwrap();
        assert_eq!(out, vec![b'a', 0, b'b', 0]);
        // Odd trailing byte on the utf16 side is dropped too.
        let out = transcode(&[0x61, 0x00, 0x62], Encoding::Utf16Le, Encoding::Utf8).unwrap();
        assert_eq!(out, b"a");
    }

    #[test]
    fn lone_surrogate_fails_only_across_families() {
        // 0xD800 little-endian: a lone high surrogate.
        let lone = [0x00, 0xD8];
        let err = transcode(&lone, Encoding::Utf16Le, Encoding::Utf8).unwrap_err();
        assert_eq!(err.code(), Some("ERR_TRANSCODE_FAILED"));
        // Same family: passes through untouched.
        let same = transcode(&lone, Encoding::Utf16Le, Encoding::Utf16Le).unwrap();
        assert_eq!(same, lone);
    }

    #[test]
    fn transcode_rejects_unsupported_encodings() {
        assert!(transcode(b"x", Encoding::Hex, Encoding::Utf8).is_err());
        assert!(transcode(b"x", Encoding::Utf8, Encoding::Base64).is_err());
    }
}

//! Modified UTF-8 string payloads.
//!
//! The wire format does not carry canonical UTF-8: the null code point is
//! written as the two-byte overlong sequence `C0 80`, and code points above
//! the Basic Multilingual Plane are written as a surrogate pair of two
//! three-byte sequences (CESU-8 style) instead of one four-byte sequence.
//! Size fields always count encoded bytes, never characters.

use crate::error::{Error, Result};

/// Encoded byte length of `s`, without encoding it.
pub fn encoded_len(s: &str) -> usize {
    s.chars()
        .map(|c| match c as u32 {
            0 => 2,
            0x01..=0x7f => 1,
            0x80..=0x7ff => 2,
            0x800..=0xffff => 3,
            _ => 6,
        })
        .sum()
}

/// Append the modified UTF-8 encoding of `s` to `buf`.
pub fn encode_into(buf: &mut Vec<u8>, s: &str) {
    for c in s.chars() {
        let c = c as u32;
        match c {
            0 => buf.extend_from_slice(&[0xc0, 0x80]),
            0x01..=0x7f => buf.push(c as u8),
            0x80..=0x7ff => {
                buf.push(0xc0 | (c >> 6) as u8);
                buf.push(0x80 | (c & 0x3f) as u8);
            }
            0x800..=0xffff => {
                buf.push(0xe0 | (c >> 12) as u8);
                buf.push(0x80 | ((c >> 6) & 0x3f) as u8);
                buf.push(0x80 | (c & 0x3f) as u8);
            }
            _ => {
                // Surrogate pair, each half as a three-byte sequence.
                let v = c - 0x10000;
                let hi = 0xd800 + (v >> 10);
                let lo = 0xdc00 + (v & 0x3ff);
                for half in [hi, lo] {
                    buf.push(0xe0 | (half >> 12) as u8);
                    buf.push(0x80 | ((half >> 6) & 0x3f) as u8);
                    buf.push(0x80 | (half & 0x3f) as u8);
                }
            }
        }
    }
}

fn continuation(data: &[u8], pos: usize) -> Result<u32> {
    let b = *data
        .get(pos)
        .ok_or_else(|| Error::BadString(format!("truncated sequence at byte {}", pos)))?;
    if b & 0xc0 != 0x80 {
        return Err(Error::BadString(format!(
            "expected continuation byte at {}, got 0x{:02x}",
            pos, b
        )));
    }
    Ok((b & 0x3f) as u32)
}

// Decodes the three-byte sequence starting at `pos`; the caller has already
// checked the lead byte's high nibble.
fn three_byte(data: &[u8], pos: usize) -> Result<u32> {
    let lead = (data[pos] & 0x0f) as u32;
    let b2 = continuation(data, pos + 1)?;
    let b3 = continuation(data, pos + 2)?;
    Ok((lead << 12) | (b2 << 6) | b3)
}

/// Decode a complete modified UTF-8 payload.
pub fn decode(data: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(data.len());
    let mut pos = 0;
    while pos < data.len() {
        let b = data[pos];
        if b & 0x80 == 0 {
            out.push(b as char);
            pos += 1;
        } else if b & 0xe0 == 0xc0 {
            // Accepts the mandated `C0 80` overlong encoding of NUL.
            let c = ((b & 0x1f) as u32) << 6 | continuation(data, pos + 1)?;
            let c = char::from_u32(c).ok_or_else(|| {
                Error::BadString(format!("invalid code point at byte {}", pos))
            })?;
            out.push(c);
            pos += 2;
        } else if b & 0xf0 == 0xe0 {
            let c = three_byte(data, pos)?;
            pos += 3;
            if (0xd800..=0xdbff).contains(&c) {
                // High surrogate, a low half must follow.
                if pos >= data.len() || data[pos] & 0xf0 != 0xe0 {
                    return Err(Error::BadString(format!(
                        "unpaired high surrogate before byte {}",
                        pos
                    )));
                }
                let lo = three_byte(data, pos)?;
                pos += 3;
                if !(0xdc00..=0xdfff).contains(&lo) {
                    return Err(Error::BadString(format!(
                        "high surrogate followed by non-surrogate before byte {}",
                        pos
                    )));
                }
                let c = 0x10000 + ((c - 0xd800) << 10) + (lo - 0xdc00);
                out.push(char::from_u32(c).ok_or_else(|| {
                    Error::BadString(format!("invalid code point at byte {}", pos))
                })?);
            } else if (0xdc00..=0xdfff).contains(&c) {
                return Err(Error::BadString(format!(
                    "unpaired low surrogate before byte {}",
                    pos
                )));
            } else {
                out.push(char::from_u32(c).ok_or_else(|| {
                    Error::BadString(format!("invalid code point at byte {}", pos))
                })?);
            }
        } else {
            // Four-byte UTF-8 leads never appear in modified UTF-8.
            return Err(Error::BadString(format!(
                "illegal lead byte 0x{:02x} at {}",
                b, pos
            )));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(s: &str) -> Vec<u8> {
        let mut enc = Vec::new();
        encode_into(&mut enc, s);
        assert_eq!(enc.len(), encoded_len(s));
        assert_eq!(decode(&enc).unwrap(), s);
        enc
    }

    #[test]
    fn ascii() {
        assert_eq!(roundtrip("hello"), b"hello");
    }

    #[test]
    fn nul_is_two_bytes() {
        let enc = roundtrip("a\0b");
        assert_eq!(enc, &[0x61, 0xc0, 0x80, 0x62]);
    }

    #[test]
    fn two_and_three_byte_sequences() {
        // U+00E9 and U+20AC sit on the 2- and 3-byte ranges.
        let enc = roundtrip("é€");
        assert_eq!(enc, &[0xc3, 0xa9, 0xe2, 0x82, 0xac]);
    }

    #[test]
    fn bmp_boundary() {
        let enc = roundtrip("\u{ffff}");
        assert_eq!(enc, &[0xef, 0xbf, 0xbf]);
    }

    #[test]
    fn supplementary_plane_is_surrogate_pair() {
        // U+1D11E (musical G clef) → D834 DD1E as two 3-byte sequences.
        let enc = roundtrip("\u{1d11e}");
        assert_eq!(enc, &[0xed, 0xa0, 0xb4, 0xed, 0xb4, 0x9e]);
        assert_eq!(encoded_len("\u{1d11e}"), 6);
    }

    #[test]
    fn rejects_four_byte_utf8() {
        // Canonical UTF-8 for U+1D11E.
        let canonical = "\u{1d11e}".as_bytes();
        assert!(matches!(decode(canonical), Err(Error::BadString(_))));
    }

    #[test]
    fn rejects_unpaired_surrogates() {
        assert!(matches!(
            decode(&[0xed, 0xa0, 0xb4]),
            Err(Error::BadString(_))
        ));
        assert!(matches!(
            decode(&[0xed, 0xb4, 0x9e]),
            Err(Error::BadString(_))
        ));
        assert!(matches!(
            decode(&[0xed, 0xa0, 0xb4, 0x61, 0x61, 0x61]),
            Err(Error::BadString(_))
        ));
    }

    #[test]
    fn rejects_truncation() {
        assert!(matches!(decode(&[0xc3]), Err(Error::BadString(_))));
        assert!(matches!(decode(&[0xe2, 0x82]), Err(Error::BadString(_))));
    }
}

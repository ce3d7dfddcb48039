// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR `fixed<digits, scale>` decoding.
//!
//! Packed decimal: two digits per octet, most significant first, with the
//! low nibble of the last octet holding the sign. An even digit count gets a
//! leading zero nibble so the total nibble count stays even.

use super::CdrCursor;
use crate::error::{DecodeError, DecodeResult};

/// Maximum number of digits a CDR fixed may carry.
pub const MAX_FIXED_DIGITS: u16 = 31;

const SIGN_POSITIVE: u8 = 0x0C;
const SIGN_NEGATIVE: u8 = 0x0D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedSign {
    Positive,
    Negative,
    /// Sign nibble was neither 0xC nor 0xD.
    Unknown(u8),
}

/// A decoded fixed-point value rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDecimal {
    pub sign: FixedSign,
    /// Signed decimal string, e.g. `+123.45`. Unknown signs render as `*`,
    /// digit nibbles above 9 as `?`.
    pub text: String,
    /// Digit nibbles above 9, most significant first.
    pub invalid_digits: Vec<u8>,
}

impl FixedDecimal {
    /// True when the sign and every digit nibble are valid packed decimal.
    pub fn is_valid(&self) -> bool {
        self.invalid_digits.is_empty() && !matches!(self.sign, FixedSign::Unknown(_))
    }
}

/// Number of octets a `fixed<digits, _>` occupies on the wire.
pub const fn fixed_wire_size(digits: u16) -> usize {
    digits as usize / 2 + 1
}

/// Decode a `fixed<digits, scale>` value at the cursor.
pub fn read_fixed(cursor: &mut CdrCursor<'_>, digits: u16, scale: i16) -> DecodeResult<FixedDecimal> {
    if digits == 0 || digits > MAX_FIXED_DIGITS {
        return Err(DecodeError::BogusLength {
            offset: cursor.offset(),
            value: u64::from(digits),
        });
    }
    let raw = cursor.read_bytes(fixed_wire_size(digits))?;

    let mut nibbles = Vec::with_capacity(raw.len() * 2);
    for byte in raw {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    let sign_nibble = nibbles.pop().unwrap_or(0);
    if digits % 2 == 0 {
        nibbles.remove(0);
    }
    let invalid_digits: Vec<u8> = nibbles.iter().copied().filter(|n| *n > 9).collect();
    let numerals: String = nibbles
        .iter()
        .map(|&n| if n > 9 { '?' } else { char::from(b'0' + n) })
        .collect();

    let sign = match sign_nibble {
        SIGN_POSITIVE => FixedSign::Positive,
        SIGN_NEGATIVE => FixedSign::Negative,
        other => FixedSign::Unknown(other),
    };
    let mut text = String::with_capacity(numerals.len() + 3);
    text.push(match sign {
        FixedSign::Positive => '+',
        FixedSign::Negative => '-',
        FixedSign::Unknown(_) => '*',
    });

    let digits = usize::from(digits);
    if scale > 0 {
        let scale = scale as usize;
        if scale >= digits {
            text.push('0');
            text.push('.');
            text.extend(std::iter::repeat_n('0', scale - digits));
            text.push_str(&numerals);
        } else {
            text.push_str(&numerals[..digits - scale]);
            text.push('.');
            text.push_str(&numerals[digits - scale..]);
        }
    } else {
        text.push_str(&numerals);
        text.extend(std::iter::repeat_n('0', usize::from(scale.unsigned_abs())));
    }

    Ok(FixedDecimal {
        sign,
        text,
        invalid_digits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8], digits: u16, scale: i16) -> FixedDecimal {
        let mut cursor = CdrCursor::new(bytes);
        let value = read_fixed(&mut cursor, digits, scale).expect("fixed should decode");
        assert!(cursor.is_eof());
        value
    }

    #[test]
    fn test_odd_digits_positive_scale() {
        let v = decode(&[0x12, 0x34, 0x5C], 5, 2);
        assert_eq!(v.sign, FixedSign::Positive);
        assert_eq!(v.text, "+123.45");
    }

    #[test]
    fn test_even_digits_skip_leading_nibble() {
        let v = decode(&[0x01, 0x23, 0x4D], 4, 1);
        assert_eq!(v.sign, FixedSign::Negative);
        assert_eq!(v.text, "-123.4");
    }

    #[test]
    fn test_negative_scale_pads_zeros() {
        let v = decode(&[0x12, 0x3C], 3, -2);
        assert_eq!(v.text, "+12300");
    }

    #[test]
    fn test_zero_scale_single_digit() {
        let v = decode(&[0x7C], 1, 0);
        assert_eq!(v.text, "+7");
    }

    #[test]
    fn test_scale_larger_than_digits() {
        let v = decode(&[0x12, 0x3C], 3, 5);
        assert_eq!(v.text, "+0.00123");
    }

    #[test]
    fn test_unknown_sign() {
        let v = decode(&[0x5A], 1, 0);
        assert_eq!(v.sign, FixedSign::Unknown(0x0A));
        assert_eq!(v.text, "*5");
    }

    #[test]
    fn test_invalid_digit_nibbles_are_kept_out_of_the_text() {
        let v = decode(&[0x1B, 0xF3, 0x4C], 5, 2);
        assert_eq!(v.sign, FixedSign::Positive);
        assert_eq!(v.text, "+1??.34");
        assert_eq!(v.invalid_digits, vec![0x0B, 0x0F]);
        assert!(!v.is_valid());
        assert!(decode(&[0x7C], 1, 0).is_valid());
    }

    #[test]
    fn test_digit_count_out_of_range() {
        let mut cursor = CdrCursor::new(&[0u8; 32]);
        assert!(matches!(
            read_fixed(&mut cursor, 40, 0),
            Err(DecodeError::BogusLength { value: 40, .. })
        ));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_truncated_fixed() {
        let mut cursor = CdrCursor::new(&[0x12]);
        assert!(read_fixed(&mut cursor, 5, 2).unwrap_err().is_truncated());
    }
}

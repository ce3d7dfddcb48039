// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encapsulation reader.
//!
//! An encapsulation is a ulong length followed by that many bytes. The first
//! byte of a non-empty region is a byte-order flag and is position zero for
//! alignment of everything inside the region.

use super::{CdrCursor, Encoding, Endianness};
use crate::error::{DecodeError, DecodeResult};

/// A decoded encapsulation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encapsulation {
    /// Declared length (flag byte included).
    pub length: u32,
    /// Context for everything inside the region. Equals the caller's
    /// context when the region is empty.
    pub encoding: Encoding,
    /// Offset of the first byte after the region.
    pub end: usize,
}

impl Encapsulation {
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes still available inside the region at `offset`.
    pub fn remaining_at(&self, offset: usize) -> usize {
        self.end.saturating_sub(offset)
    }
}

/// Open an encapsulation at the cursor.
///
/// On return the cursor sits after the byte-order flag (or after the length
/// when the region is empty). The caller resumes at [`Encapsulation::end`]
/// once it has finished with the contents.
pub fn read_encapsulation(cursor: &mut CdrCursor<'_>, enc: Encoding) -> DecodeResult<Encapsulation> {
    let length_offset = cursor.offset();
    let length = cursor.read_ulong(enc)?;
    let start = cursor.offset();
    if length == 0 {
        return Ok(Encapsulation {
            length,
            encoding: enc,
            end: start,
        });
    }
    if length as usize > cursor.remaining() {
        return Err(DecodeError::BogusLength {
            offset: length_offset,
            value: u64::from(length),
        });
    }
    let order = Endianness::from_flag(cursor.read_octet()?);
    Ok(Encapsulation {
        length,
        encoding: Encoding::new(order, start),
        end: start + length as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::CdrWriter;

    #[test]
    fn test_zero_length_is_idempotent() {
        let bytes = [0u8, 0, 0, 0, 0xAA];
        let enc = Encoding::big(0);
        let mut cursor = CdrCursor::new(&bytes);

        let first = read_encapsulation(&mut cursor, enc).unwrap();
        let after_first = cursor.offset();
        assert!(first.is_empty());
        assert_eq!(first.encoding, enc);
        assert_eq!(after_first, 4);

        cursor.set_offset(0);
        let second = read_encapsulation(&mut cursor, enc).unwrap();
        assert_eq!(first, second);
        assert_eq!(cursor.offset(), after_first);
    }

    #[test]
    fn test_switches_byte_order_and_origin() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_octet(0x55);
        w.encapsulation(Endianness::Little, |inner| {
            inner.write_ulong(0xDEAD_BEEF);
        });
        let bytes = w.into_bytes();

        let mut cursor = CdrCursor::at(&bytes, 1);
        let encap = read_encapsulation(&mut cursor, Encoding::big(0)).unwrap();
        assert_eq!(encap.encoding.order, Endianness::Little);
        assert_eq!(encap.encoding.origin, 8);
        assert_eq!(encap.length, 8);
        assert_eq!(cursor.read_ulong(encap.encoding).unwrap(), 0xDEAD_BEEF);
        assert_eq!(cursor.offset(), encap.end);
    }

    #[test]
    fn test_length_past_buffer_is_bogus() {
        let bytes = [0u8, 0, 0, 0x40, 0x00, 0x01];
        let mut cursor = CdrCursor::new(&bytes);
        let err = read_encapsulation(&mut cursor, Encoding::big(0)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::BogusLength {
                offset: 0,
                value: 0x40
            }
        );
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read cursor for CDR buffers.
//!
//! The cursor owns nothing but a borrowed buffer and an offset. Byte order
//! and alignment origin are supplied per read through [`Encoding`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::{Encoding, Endianness, GiopVersion};
use crate::error::{DecodeError, DecodeResult};

/// Generate aligned read methods for numeric primitives.
///
/// Each generated method:
/// 1. Aligns the offset to `$size` relative to `enc.origin`
/// 2. Checks buffer bounds (returns `DecodeError::Truncated` on overflow)
/// 3. Decodes the value in `enc.order`
/// 4. Advances the offset
macro_rules! impl_read_aligned {
    ($name:ident, $type:ty, $size:expr, $read:ident) => {
        pub fn $name(&mut self, enc: Encoding) -> DecodeResult<$type> {
            self.align(enc, $size)?;
            let bytes = self.read_bytes($size)?;
            Ok(match enc.order {
                Endianness::Big => BigEndian::$read(bytes),
                Endianness::Little => LittleEndian::$read(bytes),
            })
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
#[derive(Debug, Clone)]
pub struct CdrCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> CdrCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Cursor positioned at `offset`.
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self { buffer, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            offset: self.offset,
            needed,
            available: self.remaining(),
        }
    }

    /// Skip padding so the next read is aligned relative to `enc.origin`.
    pub fn align(&mut self, enc: Encoding, alignment: usize) -> DecodeResult<()> {
        let pad = super::padding(self.offset, enc.origin, alignment);
        if pad > self.remaining() {
            return Err(self.truncated(pad));
        }
        self.offset += pad;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Consume everything up to the end of the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.offset.min(self.buffer.len());
        self.offset = self.buffer.len().max(self.offset);
        &self.buffer[start..]
    }

    pub fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_octet(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_boolean(&mut self) -> DecodeResult<bool> {
        Ok(self.read_octet()? != 0)
    }

    /// Narrow character (one octet, ISO 8859-1).
    pub fn read_char(&mut self) -> DecodeResult<char> {
        Ok(char::from(self.read_octet()?))
    }

    impl_read_aligned!(read_short, i16, 2, read_i16);
    impl_read_aligned!(read_ushort, u16, 2, read_u16);
    impl_read_aligned!(read_long, i32, 4, read_i32);
    impl_read_aligned!(read_ulong, u32, 4, read_u32);
    impl_read_aligned!(read_longlong, i64, 8, read_i64);
    impl_read_aligned!(read_ulonglong, u64, 8, read_u64);
    impl_read_aligned!(read_float, f32, 4, read_f32);
    impl_read_aligned!(read_double, f64, 8, read_f64);

    /// Enumerations travel as an unsigned long ordinal.
    pub fn read_enum(&mut self, enc: Encoding) -> DecodeResult<u32> {
        self.read_ulong(enc)
    }

    /// IEEE extended double: 16 raw bytes, 8-aligned.
    pub fn read_long_double(&mut self, enc: Encoding) -> DecodeResult<[u8; 16]> {
        self.align(enc, 8)?;
        let mut out = [0u8; 16];
        out.copy_from_slice(self.read_bytes(16)?);
        Ok(out)
    }

    /// Read a ulong length and validate it against the remaining bytes.
    fn read_length(&mut self, enc: Encoding) -> DecodeResult<usize> {
        let len = self.read_ulong(enc)? as usize;
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        Ok(len)
    }

    /// CDR string: ulong count, then exactly `count` bytes.
    ///
    /// A NUL terminator counted in the length is stripped from the result.
    pub fn read_string(&mut self, enc: Encoding) -> DecodeResult<String> {
        let len = self.read_length(enc)?;
        let raw = self.read_bytes(len)?;
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// `sequence<octet>`: ulong count, then the raw bytes.
    pub fn read_octet_seq(&mut self, enc: Encoding) -> DecodeResult<&'a [u8]> {
        let len = self.read_length(enc)?;
        self.read_bytes(len)
    }

    /// Wide character, laid out per GIOP version.
    pub fn read_wchar(&mut self, enc: Encoding, version: GiopVersion) -> DecodeResult<String> {
        if version.octet_counted_wide() {
            let len = self.read_octet()? as usize;
            let raw = self.read_bytes(len)?;
            Ok(decode_utf16(raw, enc.order))
        } else {
            let unit = self.read_ushort(enc)?;
            Ok(char::decode_utf16([unit])
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
    }

    /// Wide string, laid out per GIOP version.
    ///
    /// GIOP 1.2 counts octets; earlier versions count 16-bit units including
    /// the terminator.
    pub fn read_wstring(&mut self, enc: Encoding, version: GiopVersion) -> DecodeResult<String> {
        if version.octet_counted_wide() {
            let len = self.read_length(enc)?;
            let raw = self.read_bytes(len)?;
            return Ok(decode_utf16(raw, enc.order));
        }
        let count_offset = self.offset;
        let units = self.read_ulong(enc)? as usize;
        let len = units.checked_mul(2).ok_or(DecodeError::BogusLength {
            offset: count_offset,
            value: units as u64,
        })?;
        let raw = self.read_bytes(len)?;
        let mut text = decode_utf16(raw, enc.order);
        if text.ends_with('\0') {
            text.pop();
        }
        Ok(text)
    }
}

fn decode_utf16(raw: &[u8], order: Endianness) -> String {
    let units = raw.chunks_exact(2).map(|pair| match order {
        Endianness::Big => BigEndian::read_u16(pair),
        Endianness::Little => LittleEndian::read_u16(pair),
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

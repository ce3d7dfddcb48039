// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference CDR encoder.
//!
//! Mirror image of [`CdrCursor`](super::CdrCursor): same alignment rules,
//! either byte order, arbitrary origin. Used to build fixtures and to
//! assemble GIOP messages for replay.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::{padding, Endianness, GiopVersion};

/// Generate aligned write methods for numeric primitives.
macro_rules! impl_write_aligned {
    ($name:ident, $type:ty, $size:expr, $write:ident) => {
        pub fn $name(&mut self, value: $type) -> &mut Self {
            self.align($size);
            let mut bytes = [0u8; $size];
            match self.order {
                Endianness::Big => BigEndian::$write(&mut bytes, value),
                Endianness::Little => LittleEndian::$write(&mut bytes, value),
            }
            self.buffer.extend_from_slice(&bytes);
            self
        }
    };
}

/// Growable CDR writer.
#[derive(Debug, Clone)]
pub struct CdrWriter {
    buffer: Vec<u8>,
    order: Endianness,
    origin: usize,
}

impl CdrWriter {
    pub fn new(order: Endianness) -> Self {
        Self {
            buffer: Vec::new(),
            order,
            origin: 0,
        }
    }

    /// Writer whose output starts with `prefix` filler bytes; alignment is
    /// measured from the end of the filler.
    pub fn with_prefix(order: Endianness, prefix: usize) -> Self {
        Self {
            buffer: vec![0xEE; prefix],
            order,
            origin: prefix,
        }
    }

    pub fn order(&self) -> Endianness {
        self.order
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Zero-fill up to the next aligned position.
    pub fn align(&mut self, alignment: usize) -> &mut Self {
        let pad = padding(self.buffer.len(), self.origin, alignment);
        self.buffer.extend(std::iter::repeat_n(0, pad));
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    pub fn write_octet(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_boolean(&mut self, value: bool) -> &mut Self {
        self.write_octet(u8::from(value))
    }

    pub fn write_char(&mut self, value: char) -> &mut Self {
        self.write_octet(u32::from(value).min(0xFF) as u8)
    }

    impl_write_aligned!(write_short, i16, 2, write_i16);
    impl_write_aligned!(write_ushort, u16, 2, write_u16);
    impl_write_aligned!(write_long, i32, 4, write_i32);
    impl_write_aligned!(write_ulong, u32, 4, write_u32);
    impl_write_aligned!(write_longlong, i64, 8, write_i64);
    impl_write_aligned!(write_ulonglong, u64, 8, write_u64);
    impl_write_aligned!(write_float, f32, 4, write_f32);
    impl_write_aligned!(write_double, f64, 8, write_f64);

    pub fn write_long_double(&mut self, raw: [u8; 16]) -> &mut Self {
        self.align(8);
        self.write_bytes(&raw)
    }

    /// CDR string with its NUL terminator counted in the length.
    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_ulong(value.len() as u32 + 1);
        self.write_bytes(value.as_bytes());
        self.write_octet(0)
    }

    pub fn write_octet_seq(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_ulong(bytes.len() as u32);
        self.write_bytes(bytes)
    }

    fn utf16_bytes(&self, units: &[u16]) -> Vec<u8> {
        let mut out = vec![0u8; units.len() * 2];
        match self.order {
            Endianness::Big => BigEndian::write_u16_into(units, &mut out),
            Endianness::Little => LittleEndian::write_u16_into(units, &mut out),
        }
        out
    }

    pub fn write_wchar(&mut self, value: char, version: GiopVersion) -> &mut Self {
        let mut units = [0u16; 2];
        let units = value.encode_utf16(&mut units);
        if version.octet_counted_wide() {
            let bytes = self.utf16_bytes(units);
            self.write_octet(bytes.len() as u8);
            self.write_bytes(&bytes)
        } else {
            self.write_ushort(units[0])
        }
    }

    pub fn write_wstring(&mut self, value: &str, version: GiopVersion) -> &mut Self {
        let mut units: Vec<u16> = value.encode_utf16().collect();
        if version.octet_counted_wide() {
            let bytes = self.utf16_bytes(&units);
            self.write_octet_seq(&bytes)
        } else {
            units.push(0);
            self.write_ulong(units.len() as u32);
            let bytes = self.utf16_bytes(&units);
            self.write_bytes(&bytes)
        }
    }

    /// Packed-decimal `fixed` from a string of decimal digits.
    pub fn write_fixed(&mut self, digits: &str, negative: bool) -> &mut Self {
        let mut nibbles: Vec<u8> = digits
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        if nibbles.len() % 2 == 0 {
            nibbles.insert(0, 0);
        }
        nibbles.push(if negative { 0x0D } else { 0x0C });
        for pair in nibbles.chunks(2) {
            self.write_octet((pair[0] << 4) | pair.get(1).copied().unwrap_or(0));
        }
        self
    }

    /// Write an encapsulation: ulong length, byte-order flag, then whatever
    /// `body` writes, aligned relative to the flag octet.
    pub fn encapsulation<F>(&mut self, order: Endianness, body: F) -> &mut Self
    where
        F: FnOnce(&mut CdrWriter),
    {
        let mut inner = CdrWriter::new(order);
        inner.write_octet(order.flag());
        body(&mut inner);
        let bytes = inner.into_bytes();
        self.write_octet_seq(&bytes)
    }

    /// Overwrite an already written ulong (used to patch sizes).
    pub fn patch_ulong(&mut self, offset: usize, value: u32) {
        if let Some(slot) = self.buffer.get_mut(offset..offset + 4) {
            match self.order {
                Endianness::Big => BigEndian::write_u32(slot, value),
                Endianness::Little => LittleEndian::write_u32(slot, value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::{CdrCursor, Encoding};

    #[test]
    fn test_writer_aligns_and_zero_fills() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_octet(0x11).write_ushort(0x2233).write_ulong(0x4455_6677);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes[0], 0x11);
        assert_eq!(bytes[1], 0);
        assert_eq!(&bytes[2..4], &0x2233u16.to_le_bytes());
    }

    #[test]
    fn test_writer_prefix_sets_origin() {
        let mut w = CdrWriter::with_prefix(Endianness::Big, 7);
        w.write_octet(1).write_ulong(2);
        assert_eq!(w.offset(), 7 + 4 + 4);
    }

    #[test]
    fn test_string_counts_terminator() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_string("echo");
        assert_eq!(w.as_bytes(), &[0, 0, 0, 5, b'e', b'c', b'h', b'o', 0]);
    }

    #[test]
    fn test_patch_ulong() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_ulong(0);
        w.write_octet(9);
        w.patch_ulong(0, 77);
        let bytes = w.into_bytes();
        let mut cursor = CdrCursor::new(&bytes);
        assert_eq!(cursor.read_ulong(Encoding::little(0)).unwrap(), 77);
    }
}

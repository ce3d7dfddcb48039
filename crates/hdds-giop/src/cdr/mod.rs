// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR (Common Data Representation) primitives for GIOP payloads.
//!
//! CDR is alignment-aware: every primitive is aligned to its natural size,
//! measured from a *boundary origin* rather than from the start of the
//! buffer. The top-level origin of a GIOP message is the first byte of the
//! 12-byte header; each encapsulation starts a fresh origin and may switch
//! byte order.
//!
//! The active `(byte order, origin)` pair travels as an [`Encoding`] value,
//! passed by value into every read so nested decoders can never leak their
//! context back to the caller.

pub mod align;
pub mod cursor;
pub mod encap;
pub mod fixed;
pub mod writer;

pub use align::{align_offset, is_aligned, padding};
pub use cursor::CdrCursor;
pub use encap::{read_encapsulation, Encapsulation};
pub use fixed::{read_fixed, FixedDecimal, FixedSign};
pub use writer::CdrWriter;

/// Stream byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Decode a CDR byte-order flag (0 = big, anything else = little).
    pub const fn from_flag(flag: u8) -> Self {
        if flag & 0x01 == 0 {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// The flag octet written at the start of an encapsulation.
    pub const fn flag(self) -> u8 {
        match self {
            Self::Big => 0,
            Self::Little => 1,
        }
    }

    pub const fn is_little(self) -> bool {
        matches!(self, Self::Little)
    }
}

/// Decoding context: active byte order and the boundary origin used for
/// alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub order: Endianness,
    /// Buffer offset that counts as position zero for alignment.
    pub origin: usize,
}

impl Encoding {
    pub const fn new(order: Endianness, origin: usize) -> Self {
        Self { order, origin }
    }

    pub const fn big(origin: usize) -> Self {
        Self::new(Endianness::Big, origin)
    }

    pub const fn little(origin: usize) -> Self {
        Self::new(Endianness::Little, origin)
    }
}

/// GIOP protocol version.
///
/// Affects how wide characters and wide strings are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GiopVersion {
    pub major: u8,
    pub minor: u8,
}

impl GiopVersion {
    pub const V1_0: GiopVersion = GiopVersion::new(1, 0);
    pub const V1_1: GiopVersion = GiopVersion::new(1, 1);
    pub const V1_2: GiopVersion = GiopVersion::new(1, 2);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// GIOP 1.2 and later length-prefix wide characters in octets.
    pub const fn octet_counted_wide(self) -> bool {
        self.major > 1 || self.minor >= 2
    }
}

impl std::fmt::Display for GiopVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endianness_flag() {
        assert_eq!(Endianness::from_flag(0), Endianness::Big);
        assert_eq!(Endianness::from_flag(1), Endianness::Little);
        assert_eq!(Endianness::from_flag(0x03), Endianness::Little);
        assert_eq!(Endianness::from_flag(0x02), Endianness::Big);
        assert_eq!(Endianness::Little.flag(), 1);
    }

    #[test]
    fn test_version_wide_layout() {
        assert!(!GiopVersion::V1_0.octet_counted_wide());
        assert!(!GiopVersion::V1_1.octet_counted_wide());
        assert!(GiopVersion::V1_2.octet_counted_wide());
        assert!(GiopVersion::V1_1 < GiopVersion::V1_2);
        assert_eq!(GiopVersion::V1_2.to_string(), "1.2");
    }
}

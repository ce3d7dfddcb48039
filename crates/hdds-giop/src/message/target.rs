// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// GIOP 1.2 TargetAddress union.

use crate::cdr::{CdrCursor, Encoding};
use crate::error::{DecodeError, DecodeResult};
use crate::ior::{decode_object_reference, decode_tagged_profile, ObjectReference, TaggedProfile};
use crate::report::{read_field, FieldId, ReportSink};

pub const KEY_ADDR: i16 = 0;
pub const PROFILE_ADDR: i16 = 1;
pub const REFERENCE_ADDR: i16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddress {
    Key(Vec<u8>),
    Profile(TaggedProfile),
    Reference {
        selected_profile_index: u32,
        ior: ObjectReference,
    },
}

impl TargetAddress {
    /// Object key the target designates, when one can be found.
    pub fn object_key(&self) -> Option<&[u8]> {
        match self {
            Self::Key(key) => Some(key),
            Self::Profile(TaggedProfile::Iiop(iiop)) => Some(&iiop.object_key),
            Self::Profile(TaggedProfile::Opaque { .. }) => None,
            Self::Reference {
                selected_profile_index,
                ior,
            } => match ior.profiles.get(*selected_profile_index as usize) {
                Some(TaggedProfile::Iiop(iiop)) => Some(&iiop.object_key),
                _ => ior.object_key(),
            },
        }
    }
}

/// Decode a TargetAddress. An unknown disposition cannot be skipped and is
/// reported as a bogus value.
pub fn decode_target_address(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
) -> DecodeResult<TargetAddress> {
    let at = cursor.offset();
    let disposition = read_field(cursor, enc, 2, sink, FieldId::TargetDisposition, |c| c.read_short(enc))?;
    match disposition {
        KEY_ADDR => {
            let key = read_field(cursor, enc, 4, sink, FieldId::ObjectKey, |c| c.read_octet_seq(enc))?;
            Ok(TargetAddress::Key(key.to_vec()))
        }
        PROFILE_ADDR => Ok(TargetAddress::Profile(decode_tagged_profile(cursor, enc, sink)?)),
        REFERENCE_ADDR => {
            let selected_profile_index =
                read_field(cursor, enc, 4, sink, FieldId::ProfileIndex, |c| c.read_ulong(enc))?;
            let ior = decode_object_reference(cursor, enc, sink, None)?;
            Ok(TargetAddress::Reference {
                selected_profile_index,
                ior,
            })
        }
        other => Err(DecodeError::BogusLength {
            offset: at,
            value: u64::from(other as u16),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::{CdrWriter, Endianness, GiopVersion};
    use crate::ior::TAG_INTERNET_IOP;
    use crate::report::NullSink;

    fn decode(bytes: &[u8]) -> DecodeResult<TargetAddress> {
        let mut cursor = CdrCursor::new(bytes);
        decode_target_address(&mut cursor, Encoding::little(0), &mut NullSink)
    }

    #[test]
    fn test_key_addr() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_short(KEY_ADDR).write_octet_seq(b"obj");
        let target = decode(w.as_bytes()).unwrap();
        assert_eq!(target.object_key(), Some(&b"obj"[..]));
    }

    #[test]
    fn test_profile_addr() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_short(PROFILE_ADDR).write_ulong(TAG_INTERNET_IOP);
        w.encapsulation(Endianness::Little, |e| {
            e.write_octet(1).write_octet(0);
            e.write_string("h").write_ushort(1).write_octet_seq(b"pk");
        });
        let target = decode(w.as_bytes()).unwrap();
        assert_eq!(target.object_key(), Some(&b"pk"[..]));
    }

    #[test]
    fn test_reference_addr_uses_selected_profile() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_short(REFERENCE_ADDR).write_ulong(1);
        w.write_string("IDL:X:1.0").write_ulong(2);
        for key in [&b"first"[..], &b"second"[..]] {
            w.write_ulong(TAG_INTERNET_IOP);
            w.encapsulation(Endianness::Big, |e| {
                e.write_octet(1).write_octet(0);
                e.write_string("h").write_ushort(1).write_octet_seq(key);
            });
        }
        let target = decode(w.as_bytes()).unwrap();
        assert_eq!(target.object_key(), Some(&b"second"[..]));
        let TargetAddress::Reference { ior, .. } = &target else {
            panic!("expected reference, got {target:?}");
        };
        assert_eq!(ior.iiop_profiles().next().unwrap().version, GiopVersion::V1_0);
    }

    #[test]
    fn test_unknown_disposition() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_short(9);
        let err = decode(w.as_bytes()).unwrap_err();
        assert_eq!(err, DecodeError::BogusLength { offset: 0, value: 9 });
    }
}

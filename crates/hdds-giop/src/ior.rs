// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interoperable Object References.
//!
//! An IOR is a repository id plus a list of tagged profiles, each carried in
//! an encapsulation. Only IIOP profiles are interpreted; everything else is
//! kept as opaque bytes.
//!
//! Stringified IORs (`IOR:` followed by the hex of an encapsulated IOR) can
//! be parsed as well, which is how object keys are seeded from a file.

use thiserror::Error;

use crate::cdr::{CdrCursor, CdrWriter, Encoding, Endianness, GiopVersion};
use crate::error::{DecodeError, DecodeResult};
use crate::report::{abandon_encapsulation, open_encapsulation, read_field, FieldId, FieldValue, NullSink, ReportSink};
use crate::session::{ObjectKeyRegistry, Provenance};

/// Profile tag for IIOP.
pub const TAG_INTERNET_IOP: u32 = 0;
/// Profile tag for a bare component list.
pub const TAG_MULTIPLE_COMPONENTS: u32 = 1;

const STRINGIFIED_PREFIX: &str = "IOR:";

/// Errors for stringified IOR handling.
#[derive(Debug, Error)]
pub enum IorError {
    #[error("missing \"IOR:\" prefix")]
    MissingPrefix,

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("empty IOR")]
    Empty,

    #[error("malformed IOR: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Component attached to an IIOP 1.1+ profile. Kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedComponent {
    pub tag: u32,
    pub data: Vec<u8>,
}

/// Decoded IIOP profile body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiopProfile {
    pub version: GiopVersion,
    pub host: String,
    pub port: u16,
    pub object_key: Vec<u8>,
    pub components: Vec<TaggedComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedProfile {
    Iiop(IiopProfile),
    /// Any other tag, or an IIOP body that does not fit its encapsulation;
    /// `data` is the raw encapsulation including its flag.
    Opaque { tag: u32, data: Vec<u8> },
}

/// A decoded object reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectReference {
    pub type_id: String,
    pub profiles: Vec<TaggedProfile>,
}

impl ObjectReference {
    /// Nil references have no type id and no profiles.
    pub fn is_nil(&self) -> bool {
        self.type_id.is_empty() && self.profiles.is_empty()
    }

    /// IIOP profiles in wire order.
    pub fn iiop_profiles(&self) -> impl Iterator<Item = &IiopProfile> {
        self.profiles.iter().filter_map(|p| match p {
            TaggedProfile::Iiop(iiop) => Some(iiop),
            TaggedProfile::Opaque { .. } => None,
        })
    }

    /// Object key of the first IIOP profile.
    pub fn object_key(&self) -> Option<&[u8]> {
        self.iiop_profiles().next().map(|p| p.object_key.as_slice())
    }

    /// Record every IIOP object key under this reference's type id.
    ///
    /// Returns the number of keys stored. References without a type id, and
    /// profiles with an empty key, are skipped.
    pub fn register(&self, registry: &mut ObjectKeyRegistry, provenance: Provenance) -> usize {
        if self.type_id.is_empty() {
            return 0;
        }
        let mut stored = 0;
        for profile in self.iiop_profiles().filter(|p| !p.object_key.is_empty()) {
            registry.insert(&profile.object_key, &self.type_id, provenance);
            stored += 1;
        }
        stored
    }
}

/// Decode an object reference at the cursor.
///
/// When `store` is given, IIOP object keys are recorded in the registry
/// (provenance [`Provenance::ObservedOnWire`]).
pub fn decode_object_reference(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
    store: Option<&mut ObjectKeyRegistry>,
) -> DecodeResult<ObjectReference> {
    let type_id = read_field(cursor, enc, 4, sink, FieldId::TypeId, |c| c.read_string(enc))?;
    let count = read_field(cursor, enc, 4, sink, FieldId::ProfileCount, |c| c.read_ulong(enc))?;

    let mut profiles = Vec::with_capacity((count as usize).min(cursor.remaining()));
    for _ in 0..count {
        profiles.push(decode_tagged_profile(cursor, enc, sink)?);
    }

    let reference = ObjectReference { type_id, profiles };
    if let Some(registry) = store {
        reference.register(registry, Provenance::ObservedOnWire);
    }
    Ok(reference)
}

/// Decode one tagged profile (tag + encapsulated body).
pub fn decode_tagged_profile(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
) -> DecodeResult<TaggedProfile> {
    let tag = read_field(cursor, enc, 4, sink, FieldId::ProfileTag, |c| c.read_ulong(enc))?;
    if tag == TAG_INTERNET_IOP {
        return decode_iiop_profile(cursor, enc, sink);
    }
    let data = read_field(cursor, enc, 4, sink, FieldId::ProfileData, |c| c.read_octet_seq(enc))?;
    Ok(TaggedProfile::Opaque {
        tag,
        data: data.to_vec(),
    })
}

/// Decode an IIOP profile encapsulation.
///
/// A body that does not fit its encapsulation is kept as an opaque profile
/// and decoding carries on after the region.
fn decode_iiop_profile(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
) -> DecodeResult<TaggedProfile> {
    let encap = open_encapsulation(cursor, enc, sink)?;
    let region = &cursor.buffer()[..encap.end];
    let mut inner = CdrCursor::at(region, cursor.offset());

    match decode_iiop_body(&mut inner, encap.encoding, sink) {
        Ok(profile) => {
            cursor.set_offset(encap.end);
            Ok(TaggedProfile::Iiop(profile))
        }
        Err(e) => {
            let data = region[encap.end - encap.length as usize..].to_vec();
            abandon_encapsulation(cursor, &encap, &e, sink);
            Ok(TaggedProfile::Opaque {
                tag: TAG_INTERNET_IOP,
                data,
            })
        }
    }
}

fn decode_iiop_body(inner: &mut CdrCursor<'_>, enc: Encoding, sink: &mut dyn ReportSink) -> DecodeResult<IiopProfile> {
    let version_at = inner.offset();
    let major = inner.read_octet()?;
    let minor = inner.read_octet()?;
    let version = GiopVersion::new(major, minor);
    sink.field(
        FieldId::IiopVersion,
        version_at..inner.offset(),
        FieldValue::Str(version.to_string()),
    );
    let host = read_field(inner, enc, 4, sink, FieldId::IiopHost, |c| c.read_string(enc))?;
    let port = read_field(inner, enc, 2, sink, FieldId::IiopPort, |c| c.read_ushort(enc))?;
    let object_key = read_field(inner, enc, 4, sink, FieldId::ObjectKey, |c| c.read_octet_seq(enc))?;

    let mut components = Vec::new();
    if minor >= 1 {
        let count = read_field(inner, enc, 4, sink, FieldId::ComponentCount, |c| c.read_ulong(enc))?;
        for _ in 0..count {
            let tag = read_field(inner, enc, 4, sink, FieldId::ComponentTag, |c| c.read_ulong(enc))?;
            let data = read_field(inner, enc, 4, sink, FieldId::ComponentData, |c| c.read_octet_seq(enc))?;
            components.push(TaggedComponent {
                tag,
                data: data.to_vec(),
            });
        }
    }

    Ok(IiopProfile {
        version,
        host,
        port,
        object_key: object_key.to_vec(),
        components,
    })
}

/// Parse a stringified IOR (`IOR:` + hex).
pub fn parse_stringified_ior(text: &str) -> Result<ObjectReference, IorError> {
    let text = text.trim();
    let hex_part = text
        .get(..STRINGIFIED_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(STRINGIFIED_PREFIX))
        .map(|_| &text[STRINGIFIED_PREFIX.len()..])
        .ok_or(IorError::MissingPrefix)?;
    let bytes = hex::decode(hex_part)?;
    let Some(&flag) = bytes.first() else {
        return Err(IorError::Empty);
    };
    // The string is an encapsulation body: flag first, origin at the flag.
    let enc = Encoding::new(Endianness::from_flag(flag), 0);
    let mut cursor = CdrCursor::at(&bytes, 1);
    Ok(decode_object_reference(&mut cursor, enc, &mut NullSink, None)?)
}

/// Render a reference as a stringified IOR.
pub fn to_stringified_ior(reference: &ObjectReference, order: Endianness) -> String {
    let mut w = CdrWriter::new(order);
    w.write_octet(order.flag());
    write_object_reference(&mut w, reference);
    format!("{STRINGIFIED_PREFIX}{}", hex::encode_upper(w.into_bytes()))
}

/// Encode a reference at the writer's position, in the writer's byte order.
pub fn write_object_reference(w: &mut CdrWriter, reference: &ObjectReference) {
    let order = w.order();
    w.write_string(&reference.type_id);
    w.write_ulong(reference.profiles.len() as u32);
    for profile in &reference.profiles {
        match profile {
            TaggedProfile::Iiop(iiop) => {
                w.write_ulong(TAG_INTERNET_IOP);
                w.encapsulation(order, |e| {
                    e.write_octet(iiop.version.major).write_octet(iiop.version.minor);
                    e.write_string(&iiop.host).write_ushort(iiop.port);
                    e.write_octet_seq(&iiop.object_key);
                    if iiop.version.minor >= 1 {
                        e.write_ulong(iiop.components.len() as u32);
                        for component in &iiop.components {
                            e.write_ulong(component.tag).write_octet_seq(&component.data);
                        }
                    }
                });
            }
            TaggedProfile::Opaque { tag, data } => {
                w.write_ulong(*tag).write_octet_seq(data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingSink;

    fn sample_reference() -> ObjectReference {
        ObjectReference {
            type_id: "IDL:Shapes/Circle:1.0".into(),
            profiles: vec![
                TaggedProfile::Iiop(IiopProfile {
                    version: GiopVersion::V1_2,
                    host: "10.0.0.7".into(),
                    port: 2809,
                    object_key: b"circle-1".to_vec(),
                    components: vec![TaggedComponent {
                        tag: 0,
                        data: vec![0, 0x49, 0x44],
                    }],
                }),
                TaggedProfile::Opaque {
                    tag: 0x4F4D_4700,
                    data: vec![1, 2, 3],
                },
            ],
        }
    }

    #[test]
    fn test_decode_iiop_profile_with_components() {
        let text = to_stringified_ior(&sample_reference(), Endianness::Big);
        let decoded = parse_stringified_ior(&text).unwrap();
        assert_eq!(decoded, sample_reference());
        assert_eq!(decoded.object_key(), Some(&b"circle-1"[..]));
    }

    #[test]
    fn test_iiop_1_0_has_no_components() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_string("IDL:Echo:1.0").write_ulong(1).write_ulong(TAG_INTERNET_IOP);
        w.encapsulation(Endianness::Big, |e| {
            e.write_octet(1).write_octet(0);
            e.write_string("localhost").write_ushort(683);
            e.write_octet_seq(&[0xAB, 0xCD]);
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let ior = decode_object_reference(&mut cursor, Encoding::little(0), &mut sink, None).unwrap();
        assert!(cursor.is_eof());
        let iiop = ior.iiop_profiles().next().unwrap();
        assert_eq!(iiop.version, GiopVersion::V1_0);
        assert_eq!(iiop.port, 683);
        assert!(iiop.components.is_empty());
        assert_eq!(sink.value(FieldId::IiopHost).and_then(FieldValue::as_str), Some("localhost"));
        assert_eq!(sink.value(FieldId::ObjectKey).and_then(FieldValue::as_bytes), Some(&[0xAB, 0xCD][..]));
    }

    #[test]
    fn test_short_iiop_body_keeps_later_profiles() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_string("IDL:Echo:1.0").write_ulong(2).write_ulong(TAG_INTERNET_IOP);
        // Host length runs past the profile encapsulation.
        w.encapsulation(Endianness::Big, |e| {
            e.write_octet(1).write_octet(2).write_bytes(&[0]).write_ulong(500);
        });
        w.write_ulong(TAG_INTERNET_IOP);
        w.encapsulation(Endianness::Big, |e| {
            e.write_octet(1).write_octet(0);
            e.write_string("host").write_ushort(9).write_octet_seq(b"k");
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let ior = decode_object_reference(&mut cursor, Encoding::big(0), &mut sink, None).unwrap();
        assert!(cursor.is_eof());
        assert!(matches!(
            ior.profiles[0],
            TaggedProfile::Opaque {
                tag: TAG_INTERNET_IOP,
                ..
            }
        ));
        assert_eq!(ior.object_key(), Some(&b"k"[..]));
        assert!(sink.has_warning(crate::report::WarningKind::Truncated));
    }

    #[test]
    fn test_store_records_object_keys() {
        let text = to_stringified_ior(&sample_reference(), Endianness::Little);
        let bytes = hex::decode(&text[4..]).unwrap();
        let mut registry = ObjectKeyRegistry::new();
        let mut cursor = CdrCursor::at(&bytes, 1);
        decode_object_reference(&mut cursor, Encoding::little(0), &mut NullSink, Some(&mut registry))
            .unwrap();

        let entry = registry.lookup(b"circle-1").unwrap();
        assert_eq!(entry.interface_id, "IDL:Shapes/Circle:1.0");
        assert_eq!(entry.provenance, Provenance::ObservedOnWire);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_store_skips_empty_type_id() {
        let mut reference = sample_reference();
        reference.type_id.clear();
        let mut registry = ObjectKeyRegistry::new();
        assert_eq!(reference.register(&mut registry, Provenance::ObservedOnWire), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nil_reference() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(1).write_octet(0).write_ulong(0);
        let bytes = w.into_bytes();
        let mut cursor = CdrCursor::new(&bytes);
        let ior = decode_object_reference(&mut cursor, Encoding::big(0), &mut NullSink, None).unwrap();
        assert!(ior.is_nil());
    }

    #[test]
    fn test_stringified_errors() {
        assert!(matches!(parse_stringified_ior("corbaloc::x"), Err(IorError::MissingPrefix)));
        assert!(matches!(parse_stringified_ior("IOR:0"), Err(IorError::Hex(_))));
        assert!(matches!(parse_stringified_ior("IOR:"), Err(IorError::Empty)));
        assert!(matches!(parse_stringified_ior("IOR:00000000FF"), Err(IorError::Decode(_))));
    }

    #[test]
    fn test_stringified_prefix_is_case_insensitive() {
        let text = to_stringified_ior(&sample_reference(), Endianness::Big).replacen("IOR", "ior", 1);
        assert!(parse_stringified_ior(&text).is_ok());
    }
}

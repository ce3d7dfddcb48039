// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive TypeCode decoding.

use super::any::decode_value_at;
use super::{DecodeContext, TcKind, Value};
use crate::cdr::{CdrCursor, Encoding};
use crate::error::DecodeResult;
use crate::report::{abandon_encapsulation, open_encapsulation, read_field, FieldId, WarningKind};

/// Struct or exception member.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub type_code: TypeCode,
}

/// Union branch: case label, member name, member type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionMember {
    pub label: Value,
    pub name: String,
    pub type_code: TypeCode,
}

/// Valuetype state member.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMember {
    pub name: String,
    pub type_code: TypeCode,
    pub visibility: i16,
}

/// A decoded TypeCode.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCode {
    /// Any kind without parameters.
    Simple(TcKind),
    String {
        bound: u32,
    },
    WString {
        bound: u32,
    },
    Fixed {
        digits: u16,
        scale: i16,
    },
    /// objref, native or abstract_interface.
    Interface {
        kind: TcKind,
        repository_id: String,
        name: String,
    },
    /// struct or except.
    Struct {
        kind: TcKind,
        repository_id: String,
        name: String,
        members: Vec<Member>,
    },
    Union {
        repository_id: String,
        name: String,
        discriminant: Box<TypeCode>,
        default_index: i32,
        members: Vec<UnionMember>,
    },
    Enum {
        repository_id: String,
        name: String,
        members: Vec<String>,
    },
    /// sequence (bound, 0 when unbounded) or array (length).
    Sequence {
        kind: TcKind,
        element: Box<TypeCode>,
        bound: u32,
    },
    /// alias or value_box.
    Alias {
        kind: TcKind,
        repository_id: String,
        name: String,
        content: Box<TypeCode>,
    },
    Value {
        repository_id: String,
        name: String,
        modifier: i16,
        base: Box<TypeCode>,
        members: Vec<ValueMember>,
    },
    /// Unknown kind, or a complex kind cut at the nesting limit.
    Undecoded {
        kind: u32,
    },
}

impl TypeCode {
    /// Wire value of this TypeCode's kind.
    pub fn kind_value(&self) -> u32 {
        match self {
            Self::Simple(kind)
            | Self::Interface { kind, .. }
            | Self::Struct { kind, .. }
            | Self::Sequence { kind, .. }
            | Self::Alias { kind, .. } => kind.to_u32(),
            Self::String { .. } => TcKind::String.to_u32(),
            Self::WString { .. } => TcKind::WString.to_u32(),
            Self::Fixed { .. } => TcKind::Fixed.to_u32(),
            Self::Union { .. } => TcKind::Union.to_u32(),
            Self::Enum { .. } => TcKind::Enum.to_u32(),
            Self::Value { .. } => TcKind::Value.to_u32(),
            Self::Undecoded { kind } => *kind,
        }
    }

    pub fn kind(&self) -> Option<TcKind> {
        TcKind::from_u32(self.kind_value())
    }

    pub fn repository_id(&self) -> Option<&str> {
        match self {
            Self::Interface { repository_id, .. }
            | Self::Struct { repository_id, .. }
            | Self::Union { repository_id, .. }
            | Self::Enum { repository_id, .. }
            | Self::Alias { repository_id, .. }
            | Self::Value { repository_id, .. } => Some(repository_id),
            _ => None,
        }
    }

    /// Kinds of this TypeCode and all nested ones, depth first.
    pub fn kinds(&self) -> Vec<u32> {
        let mut out = Vec::new();
        self.collect_kinds(&mut out);
        out
    }

    fn collect_kinds(&self, out: &mut Vec<u32>) {
        out.push(self.kind_value());
        match self {
            Self::Struct { members, .. } => {
                members.iter().for_each(|m| m.type_code.collect_kinds(out));
            }
            Self::Union {
                discriminant,
                members,
                ..
            } => {
                discriminant.collect_kinds(out);
                members.iter().for_each(|m| m.type_code.collect_kinds(out));
            }
            Self::Sequence { element, .. } => element.collect_kinds(out),
            Self::Alias { content, .. } => content.collect_kinds(out),
            Self::Value { base, members, .. } => {
                base.collect_kinds(out);
                members.iter().for_each(|m| m.type_code.collect_kinds(out));
            }
            _ => {}
        }
    }
}

/// Decode a TypeCode at the cursor.
///
/// `enc` is the caller's context; nested encapsulations get their own and
/// the caller's is untouched on return.
pub fn decode_typecode(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
) -> DecodeResult<TypeCode> {
    decode_at_depth(cursor, enc, ctx, 0)
}

pub(crate) fn decode_at_depth(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
    depth: usize,
) -> DecodeResult<TypeCode> {
    let raw = read_field(cursor, enc, 4, ctx.sink, FieldId::TcKind, |c| c.read_ulong(enc))?;
    let Some(kind) = TcKind::from_u32(raw) else {
        let end = cursor.offset();
        ctx.sink.warning(
            WarningKind::UnknownTypeCodeKind,
            end - 4..end,
            &format!("unknown TypeCode kind {raw}"),
        );
        return Ok(TypeCode::Undecoded { kind: raw });
    };

    if kind.is_parameterless() {
        return Ok(TypeCode::Simple(kind));
    }
    match kind {
        TcKind::String | TcKind::WString => {
            let bound = read_field(cursor, enc, 4, ctx.sink, FieldId::TcBound, |c| c.read_ulong(enc))?;
            Ok(if kind == TcKind::String {
                TypeCode::String { bound }
            } else {
                TypeCode::WString { bound }
            })
        }
        TcKind::Fixed => {
            let digits = read_field(cursor, enc, 2, ctx.sink, FieldId::TcDigits, |c| c.read_ushort(enc))?;
            let scale = read_field(cursor, enc, 2, ctx.sink, FieldId::TcScale, |c| c.read_short(enc))?;
            Ok(TypeCode::Fixed { digits, scale })
        }
        _ => decode_complex(cursor, enc, ctx, kind, depth),
    }
}

fn decode_complex(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
    kind: TcKind,
    depth: usize,
) -> DecodeResult<TypeCode> {
    let encap = open_encapsulation(cursor, enc, ctx.sink)?;
    if depth >= ctx.max_depth {
        ctx.sink.warning(
            WarningKind::NestingTooDeep,
            cursor.offset()..encap.end,
            &format!("{kind} nested deeper than {} levels", ctx.max_depth),
        );
        cursor.set_offset(encap.end);
        return Ok(TypeCode::Undecoded {
            kind: kind.to_u32(),
        });
    }

    // Reads inside the region cannot spill into the enclosing data.
    let region = &cursor.buffer()[..encap.end];
    let mut inner = CdrCursor::at(region, cursor.offset());
    match decode_parameters(&mut inner, encap.encoding, ctx, kind, depth + 1) {
        Ok(tc) => {
            cursor.set_offset(encap.end);
            Ok(tc)
        }
        Err(e) => {
            abandon_encapsulation(cursor, &encap, &e, ctx.sink);
            Ok(TypeCode::Undecoded {
                kind: kind.to_u32(),
            })
        }
    }
}

fn read_name(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
    id: FieldId,
) -> DecodeResult<String> {
    read_field(cursor, enc, 4, ctx.sink, id, |c| c.read_string(enc))
}

fn read_count(cursor: &mut CdrCursor<'_>, enc: Encoding, ctx: &mut DecodeContext<'_>) -> DecodeResult<u32> {
    read_field(cursor, enc, 4, ctx.sink, FieldId::TcMemberCount, |c| c.read_ulong(enc))
}

/// Every member needs at least one byte, so the remaining length caps any
/// preallocation.
fn capacity(count: u32, cursor: &CdrCursor<'_>) -> usize {
    (count as usize).min(cursor.remaining())
}

fn decode_parameters(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
    kind: TcKind,
    depth: usize,
) -> DecodeResult<TypeCode> {
    match kind {
        TcKind::ObjRef | TcKind::Native | TcKind::AbstractInterface => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            Ok(TypeCode::Interface {
                kind,
                repository_id,
                name,
            })
        }
        TcKind::Struct | TcKind::Except => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            let count = read_count(cursor, enc, ctx)?;
            let mut members = Vec::with_capacity(capacity(count, cursor));
            for _ in 0..count {
                let name = read_name(cursor, enc, ctx, FieldId::TcMemberName)?;
                let type_code = decode_at_depth(cursor, enc, ctx, depth)?;
                members.push(Member { name, type_code });
            }
            Ok(TypeCode::Struct {
                kind,
                repository_id,
                name,
                members,
            })
        }
        TcKind::Union => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            let discriminant = decode_at_depth(cursor, enc, ctx, depth)?;
            let default_index =
                read_field(cursor, enc, 4, ctx.sink, FieldId::TcDefaultIndex, |c| c.read_long(enc))?;
            let count = read_count(cursor, enc, ctx)?;
            let mut members = Vec::with_capacity(capacity(count, cursor));
            for _ in 0..count {
                let label = decode_value_at(cursor, enc, &discriminant, ctx, FieldId::TcLabel, depth)?;
                let name = read_name(cursor, enc, ctx, FieldId::TcMemberName)?;
                let type_code = decode_at_depth(cursor, enc, ctx, depth)?;
                members.push(UnionMember {
                    label,
                    name,
                    type_code,
                });
            }
            Ok(TypeCode::Union {
                repository_id,
                name,
                discriminant: Box::new(discriminant),
                default_index,
                members,
            })
        }
        TcKind::Enum => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            let count = read_count(cursor, enc, ctx)?;
            let mut members = Vec::with_capacity(capacity(count, cursor));
            for _ in 0..count {
                members.push(read_name(cursor, enc, ctx, FieldId::TcMemberName)?);
            }
            Ok(TypeCode::Enum {
                repository_id,
                name,
                members,
            })
        }
        TcKind::Sequence | TcKind::Array => {
            let element = decode_at_depth(cursor, enc, ctx, depth)?;
            let bound = read_field(cursor, enc, 4, ctx.sink, FieldId::TcBound, |c| c.read_ulong(enc))?;
            Ok(TypeCode::Sequence {
                kind,
                element: Box::new(element),
                bound,
            })
        }
        TcKind::Alias | TcKind::ValueBox => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            let content = decode_at_depth(cursor, enc, ctx, depth)?;
            Ok(TypeCode::Alias {
                kind,
                repository_id,
                name,
                content: Box::new(content),
            })
        }
        TcKind::Value => {
            let repository_id = read_name(cursor, enc, ctx, FieldId::TcRepositoryId)?;
            let name = read_name(cursor, enc, ctx, FieldId::TcName)?;
            let modifier = read_field(cursor, enc, 2, ctx.sink, FieldId::TcModifier, |c| c.read_short(enc))?;
            let base = decode_at_depth(cursor, enc, ctx, depth)?;
            let count = read_count(cursor, enc, ctx)?;
            let mut members = Vec::with_capacity(capacity(count, cursor));
            for _ in 0..count {
                let name = read_name(cursor, enc, ctx, FieldId::TcMemberName)?;
                let type_code = decode_at_depth(cursor, enc, ctx, depth)?;
                let visibility =
                    read_field(cursor, enc, 2, ctx.sink, FieldId::TcVisibility, |c| c.read_short(enc))?;
                members.push(ValueMember {
                    name,
                    type_code,
                    visibility,
                });
            }
            Ok(TypeCode::Value {
                repository_id,
                name,
                modifier,
                base: Box::new(base),
                members,
            })
        }
        // Parameterless and simple kinds never reach here.
        _ => Ok(TypeCode::Simple(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::{CdrWriter, Endianness, GiopVersion};
    use crate::report::RecordingSink;

    fn decode(bytes: &[u8], sink: &mut RecordingSink) -> (TypeCode, usize) {
        let mut cursor = CdrCursor::new(bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, sink);
        let tc = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).expect("typecode");
        (tc, cursor.offset())
    }

    #[test]
    fn test_simple_kinds() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(TcKind::Double.to_u32());
        let mut sink = RecordingSink::new();
        let (tc, end) = decode(w.as_bytes(), &mut sink);
        assert_eq!(tc, TypeCode::Simple(TcKind::Double));
        assert_eq!(end, 4);
    }

    #[test]
    fn test_bounded_string_and_fixed() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(18).write_ulong(64);
        w.write_ulong(28).write_ushort(5).write_short(2);
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink);
        let s = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        let f = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        assert_eq!(s, TypeCode::String { bound: 64 });
        assert_eq!(f, TypeCode::Fixed { digits: 5, scale: 2 });
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_struct_of_struct_switches_byte_order() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(15);
        w.encapsulation(Endianness::Big, |e| {
            e.write_string("IDL:demo/Outer:1.0").write_string("Outer");
            e.write_ulong(2);
            e.write_string("a").write_ulong(3);
            e.write_string("inner").write_ulong(15);
            e.encapsulation(Endianness::Little, |i| {
                i.write_string("IDL:demo/Inner:1.0").write_string("Inner");
                i.write_ulong(1);
                i.write_string("x").write_ulong(7);
            });
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let (tc, end) = decode(&bytes, &mut sink);
        assert_eq!(end, bytes.len());
        assert_eq!(tc.kinds(), vec![15, 3, 15, 7]);
        assert_eq!(tc.repository_id(), Some("IDL:demo/Outer:1.0"));
        let TypeCode::Struct { members, .. } = &tc else {
            panic!("expected struct, got {tc:?}");
        };
        assert_eq!(members[1].name, "inner");
        assert_eq!(members[1].type_code.repository_id(), Some("IDL:demo/Inner:1.0"));
    }

    #[test]
    fn test_sequence_of_string() {
        let mut w = CdrWriter::new(Endianness::Little);
        w.write_ulong(19);
        w.encapsulation(Endianness::Little, |e| {
            e.write_ulong(18).write_ulong(0);
            e.write_ulong(10);
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink);
        let tc = decode_typecode(&mut cursor, Encoding::little(0), &mut ctx).unwrap();
        assert_eq!(tc.kinds(), vec![19, 18]);
        assert!(matches!(tc, TypeCode::Sequence { bound: 10, .. }));
    }

    #[test]
    fn test_union_with_enum_discriminant() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(16);
        w.encapsulation(Endianness::Big, |e| {
            e.write_string("IDL:demo/Shape:1.0").write_string("Shape");
            e.write_ulong(17);
            e.encapsulation(Endianness::Big, |d| {
                d.write_string("IDL:demo/Color:1.0").write_string("Color");
                d.write_ulong(2).write_string("RED").write_string("GREEN");
            });
            e.write_long(-1);
            e.write_ulong(2);
            e.write_ulong(0).write_string("r").write_ulong(3);
            e.write_ulong(1).write_string("g").write_ulong(18).write_ulong(0);
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let (tc, end) = decode(&bytes, &mut sink);
        assert_eq!(end, bytes.len());
        assert_eq!(tc.kinds(), vec![16, 17, 3, 18]);
        let TypeCode::Union {
            default_index,
            members,
            ..
        } = &tc
        else {
            panic!("expected union, got {tc:?}");
        };
        assert_eq!(*default_index, -1);
        assert_eq!(
            members[1].label,
            Value::Enum {
                ordinal: 1,
                name: Some("GREEN".into())
            }
        );
        assert_eq!(sink.values(FieldId::TcLabel).count(), 2);
    }

    #[test]
    fn test_alias_of_array() {
        let mut w = CdrWriter::with_prefix(Endianness::Big, 1);
        w.write_ulong(21);
        w.encapsulation(Endianness::Little, |e| {
            e.write_string("IDL:demo/Quad:1.0").write_string("Quad");
            e.write_ulong(20);
            e.encapsulation(Endianness::Big, |a| {
                a.write_ulong(2).write_ulong(4);
            });
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::at(&bytes, 1);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink);
        let tc = decode_typecode(&mut cursor, Encoding::big(1), &mut ctx).unwrap();
        assert_eq!(tc.kinds(), vec![21, 20, 2]);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_unknown_kind_stops_subtree_only() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(15);
        w.encapsulation(Endianness::Big, |e| {
            e.write_string("IDL:demo/S:1.0").write_string("S");
            e.write_ulong(1).write_string("m").write_ulong(99);
        });
        w.write_ulong(5);
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink);
        let tc = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        let next = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        assert_eq!(tc.kinds(), vec![15, 99]);
        assert_eq!(next, TypeCode::Simple(TcKind::ULong));
        assert!(sink.has_warning(WarningKind::UnknownTypeCodeKind));
    }

    fn nested_aliases(levels: usize) -> Vec<u8> {
        fn write_level(w: &mut CdrWriter, remaining: usize) {
            if remaining == 0 {
                w.write_ulong(3);
                return;
            }
            w.write_ulong(21);
            w.encapsulation(Endianness::Big, |e| {
                e.write_string("IDL:demo/A:1.0").write_string("A");
                write_level(e, remaining - 1);
            });
        }
        let mut w = CdrWriter::new(Endianness::Big);
        write_level(&mut w, levels);
        w.into_bytes()
    }

    #[test]
    fn test_depth_limit_skips_whole_subtree() {
        let bytes = nested_aliases(40);
        let mut sink = RecordingSink::new();
        let (tc, end) = decode(&bytes, &mut sink);

        assert_eq!(end, bytes.len());
        let kinds = tc.kinds();
        assert_eq!(kinds.len(), 33);
        assert!(kinds.iter().all(|k| *k == 21));
        let mut innermost = &tc;
        while let TypeCode::Alias { content, .. } = innermost {
            innermost = content;
        }
        assert_eq!(innermost, &TypeCode::Undecoded { kind: 21 });
        assert!(sink.has_warning(WarningKind::NestingTooDeep));
    }

    #[test]
    fn test_custom_depth_limit() {
        let bytes = nested_aliases(3);
        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink).with_max_depth(2);
        let tc = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        assert_eq!(tc.kinds(), vec![21, 21, 21]);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_member_count_past_region_is_contained() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(17);
        w.encapsulation(Endianness::Big, |e| {
            e.write_string("IDL:E:1.0").write_string("E").write_ulong(1000);
        });
        let region_end = w.as_bytes().len();
        w.write_ulong(TcKind::Long.to_u32());
        w.write_bytes(&[0u8; 64]);
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let mut cursor = CdrCursor::new(&bytes);
        let mut ctx = DecodeContext::new(GiopVersion::V1_2, &mut sink);
        let tc = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        assert_eq!(tc, TypeCode::Undecoded { kind: 17 });
        assert_eq!(cursor.offset(), region_end);

        // The enclosing data is still readable after the damaged region.
        let next = decode_typecode(&mut cursor, Encoding::big(0), &mut ctx).unwrap();
        assert_eq!(next, TypeCode::Simple(TcKind::Long));
        assert!(sink.has_warning(WarningKind::Truncated));
    }

    #[test]
    fn test_damaged_member_keeps_enclosing_struct() {
        let mut w = CdrWriter::new(Endianness::Big);
        w.write_ulong(TcKind::Struct.to_u32());
        w.encapsulation(Endianness::Big, |e| {
            e.write_string("IDL:Outer:1.0").write_string("Outer").write_ulong(2);
            e.write_string("inner").write_ulong(TcKind::Struct.to_u32());
            // Inner struct claims members it does not carry.
            e.encapsulation(Endianness::Little, |i| {
                i.write_string("IDL:Inner:1.0").write_string("Inner").write_ulong(9);
            });
            e.write_string("tail").write_ulong(TcKind::Short.to_u32());
        });
        let bytes = w.into_bytes();

        let mut sink = RecordingSink::new();
        let (tc, end) = decode(&bytes, &mut sink);
        assert_eq!(end, bytes.len());
        let TypeCode::Struct { members, .. } = tc else {
            panic!("expected struct, got {tc:?}");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(
            members[0].type_code,
            TypeCode::Undecoded {
                kind: TcKind::Struct.to_u32()
            }
        );
        assert_eq!(members[1].name, "tail");
        assert_eq!(members[1].type_code, TypeCode::Simple(TcKind::Short));
        assert!(sink.has_warning(WarningKind::Truncated));
    }
}

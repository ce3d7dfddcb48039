// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Values described by a TypeCode.
//!
//! Only primitive kinds, strings, enums, nested `any`, object references and
//! principals are decoded. Constructed kinds (struct, union, sequence, array,
//! alias, except, fixed, valuetypes, native, abstract interfaces and
//! TypeCode values) are reported as undecoded and consume no bytes.

use super::decode::decode_at_depth;
use super::{DecodeContext, TcKind, TypeCode};
use crate::cdr::{CdrCursor, Encoding};
use crate::error::DecodeResult;
use crate::ior::{decode_object_reference, ObjectReference};
use crate::report::{FieldId, FieldValue, WarningKind};

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// tk_null / tk_void: no bytes on the wire.
    Null,
    Short(i16),
    Long(i32),
    UShort(u16),
    ULong(u32),
    LongLong(i64),
    ULongLong(u64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Char(char),
    Octet(u8),
    LongDouble([u8; 16]),
    WChar(String),
    String(String),
    WString(String),
    Enum {
        ordinal: u32,
        /// Member name when the TypeCode lists one for `ordinal`.
        name: Option<String>,
    },
    Any(Box<TypeCode>, Box<Value>),
    ObjRef(ObjectReference),
    Principal(Vec<u8>),
    /// Kind left undecoded; nothing was consumed.
    Undecoded(u32),
}

impl Value {
    /// Leaf representation for the sink. Composite values report their own
    /// parts and return `None`.
    fn field_value(&self) -> Option<FieldValue> {
        Some(match self {
            Self::Short(v) => (*v).into(),
            Self::Long(v) => (*v).into(),
            Self::UShort(v) => (*v).into(),
            Self::ULong(v) => (*v).into(),
            Self::LongLong(v) => (*v).into(),
            Self::ULongLong(v) => (*v).into(),
            Self::Float(v) => (*v).into(),
            Self::Double(v) => (*v).into(),
            Self::Boolean(v) => (*v).into(),
            Self::Octet(v) => (*v).into(),
            Self::Char(c) => FieldValue::Str(c.to_string()),
            Self::LongDouble(raw) => FieldValue::Bytes(raw.to_vec()),
            Self::WChar(s) | Self::String(s) | Self::WString(s) => FieldValue::Str(s.clone()),
            Self::Enum {
                name: Some(name), ..
            } => FieldValue::Str(name.clone()),
            Self::Enum { ordinal, .. } => (*ordinal).into(),
            Self::Principal(bytes) => FieldValue::Bytes(bytes.clone()),
            Self::Null | Self::Any(..) | Self::ObjRef(_) | Self::Undecoded(_) => return None,
        })
    }
}

/// Decode one value of type `tc` in the caller's context.
pub fn decode_value(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    tc: &TypeCode,
    ctx: &mut DecodeContext<'_>,
) -> DecodeResult<Value> {
    decode_value_at(cursor, enc, tc, ctx, FieldId::AnyValue, 0)
}

/// Decode an `any`: a TypeCode followed by a value of that type.
pub fn decode_any(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    ctx: &mut DecodeContext<'_>,
) -> DecodeResult<(TypeCode, Value)> {
    let tc = decode_at_depth(cursor, enc, ctx, 0)?;
    let value = decode_value_at(cursor, enc, &tc, ctx, FieldId::AnyValue, 0)?;
    Ok((tc, value))
}

pub(crate) fn decode_value_at(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    tc: &TypeCode,
    ctx: &mut DecodeContext<'_>,
    id: FieldId,
    depth: usize,
) -> DecodeResult<Value> {
    let start = cursor.offset();
    let value = match tc {
        TypeCode::String { .. } => Value::String(cursor.read_string(enc)?),
        TypeCode::WString { .. } => Value::WString(cursor.read_wstring(enc, ctx.version)?),
        TypeCode::Enum { members, .. } => {
            let ordinal = cursor.read_enum(enc)?;
            Value::Enum {
                ordinal,
                name: members.get(ordinal as usize).cloned(),
            }
        }
        TypeCode::Simple(kind) => match decode_simple(cursor, enc, *kind, ctx, depth)? {
            Some(value) => value,
            None => return Ok(undecoded(cursor, tc, ctx)),
        },
        TypeCode::Interface {
            kind: TcKind::ObjRef,
            ..
        } => Value::ObjRef(decode_object_reference(cursor, enc, ctx.sink, None)?),
        _ => return Ok(undecoded(cursor, tc, ctx)),
    };
    if let Some(field) = value.field_value() {
        let end = cursor.offset();
        let start = value_width(&value).map_or(start, |width| end - width);
        ctx.sink.field(id, start..end, field);
    }
    Ok(value)
}

fn decode_simple(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    kind: TcKind,
    ctx: &mut DecodeContext<'_>,
    depth: usize,
) -> DecodeResult<Option<Value>> {
    Ok(Some(match kind {
        TcKind::Null | TcKind::Void => Value::Null,
        TcKind::Short => Value::Short(cursor.read_short(enc)?),
        TcKind::Long => Value::Long(cursor.read_long(enc)?),
        TcKind::UShort => Value::UShort(cursor.read_ushort(enc)?),
        TcKind::ULong => Value::ULong(cursor.read_ulong(enc)?),
        TcKind::LongLong => Value::LongLong(cursor.read_longlong(enc)?),
        TcKind::ULongLong => Value::ULongLong(cursor.read_ulonglong(enc)?),
        TcKind::Float => Value::Float(cursor.read_float(enc)?),
        TcKind::Double => Value::Double(cursor.read_double(enc)?),
        TcKind::Boolean => Value::Boolean(cursor.read_boolean()?),
        TcKind::Char => Value::Char(cursor.read_char()?),
        TcKind::Octet => Value::Octet(cursor.read_octet()?),
        TcKind::LongDouble => Value::LongDouble(cursor.read_long_double(enc)?),
        TcKind::WChar => Value::WChar(cursor.read_wchar(enc, ctx.version)?),
        TcKind::Principal => Value::Principal(cursor.read_octet_seq(enc)?.to_vec()),
        TcKind::Any => {
            if depth >= ctx.max_depth {
                let at = cursor.offset();
                ctx.sink.warning(
                    WarningKind::NestingTooDeep,
                    at..at,
                    &format!("any nested deeper than {} levels", ctx.max_depth),
                );
                return Ok(Some(Value::Undecoded(kind.to_u32())));
            }
            let tc = decode_at_depth(cursor, enc, ctx, depth + 1)?;
            let value = decode_value_at(cursor, enc, &tc, ctx, FieldId::AnyValue, depth + 1)?;
            Value::Any(Box::new(tc), Box::new(value))
        }
        _ => return Ok(None),
    }))
}

/// Width of fixed-size values, so their range skips alignment padding.
fn value_width(value: &Value) -> Option<usize> {
    Some(match value {
        Value::Short(_) | Value::UShort(_) => 2,
        Value::Long(_) | Value::ULong(_) | Value::Float(_) | Value::Enum { .. } => 4,
        Value::LongLong(_) | Value::ULongLong(_) | Value::Double(_) => 8,
        Value::LongDouble(_) => 16,
        Value::Boolean(_) | Value::Char(_) | Value::Octet(_) => 1,
        _ => return None,
    })
}

fn undecoded(cursor: &CdrCursor<'_>, tc: &TypeCode, ctx: &mut DecodeContext<'_>) -> Value {
    let at = cursor.offset();
    let kind = tc.kind_value();
    let label = tc.kind().map_or("unknown kind", TcKind::name);
    ctx.sink.warning(
        WarningKind::UndecodedValue,
        at..at,
        &format!("{label} ({kind}) value left undecoded"),
    );
    Value::Undecoded(kind)
}

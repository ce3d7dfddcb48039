// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reporting sink contract.
//!
//! The interpreter never builds a tree of its own. Every decoded field and
//! every anomaly is pushed to a [`ReportSink`] together with the byte range
//! it covers; what the sink does with it (display, logging, assertions in
//! tests) is its own business.

use std::fmt;
use std::ops::Range;

use crate::cdr::{read_encapsulation, read_fixed, CdrCursor, Encapsulation, Encoding, FixedDecimal, FixedSign};
use crate::error::{DecodeError, DecodeResult};

/// Identifies a reported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    // --- Header ---
    Magic,
    VersionMajor,
    VersionMinor,
    Flags,
    MessageType,
    MessageSize,

    // --- Request / Reply / Locate ---
    RequestId,
    ResponseFlags,
    Reserved,
    ObjectKey,
    TargetDisposition,
    ProfileIndex,
    Operation,
    RequestingPrincipal,
    ReplyStatus,
    LocateStatus,
    AddressingDisposition,
    ExceptionId,
    ExceptionMinor,
    CompletionStatus,
    /// Capture sequence of the request a reply answers.
    ResponseTo,

    // --- Service contexts ---
    ServiceContextCount,
    ServiceContextId,
    ServiceContextData,
    CodeSetChar,
    CodeSetWchar,
    RtCorbaPriority,

    // --- Encapsulations ---
    EncapsulationLength,
    ByteOrder,

    // --- Object references ---
    TypeId,
    ProfileCount,
    ProfileTag,
    ProfileData,
    IiopVersion,
    IiopHost,
    IiopPort,
    ComponentCount,
    ComponentTag,
    ComponentData,

    // --- TypeCodes and values ---
    TcKind,
    TcRepositoryId,
    TcName,
    TcMemberCount,
    TcMemberName,
    TcBound,
    TcDigits,
    TcScale,
    TcDefaultIndex,
    TcLabel,
    TcModifier,
    TcVisibility,
    AnyValue,

    // --- Opaque regions ---
    Payload,
    Fragment,
    Trailer,
    MalformedBytes,

    /// Field owned by an application payload decoder.
    Custom(&'static str),
}

/// Value attached to a reported field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    /// The range itself is the information (padding, subtrees).
    None,
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                Self::$variant(<$wide>::from(value))
            }
        })+
    };
}

impl_from_int!(UInt, u64, u8, u16, u32, u64);
impl_from_int!(Int, i64, i8, i16, i32, i64);
impl_from_int!(Float, f64, f32, f64);

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "{} bytes [{}]", b.len(), hex::encode(b)),
            Self::None => f.write_str("-"),
        }
    }
}

/// Kinds of anomaly the interpreter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Message ran past its buffer; the rest is reported as malformed.
    Truncated,
    BogusLength,
    UnknownTypeCodeKind,
    NestingTooDeep,
    UnsupportedVersion,
    UnknownMessageType,
    /// Reply with no matching request; decoded generically.
    UnresolvedReply,
    /// Any value whose TypeCode kind is not decoded.
    UndecodedValue,
    UnknownFixedSign,
    /// Packed-decimal digit nibble above 9.
    InvalidFixedDigit,
}

/// Receiver of decoded fields and warnings.
pub trait ReportSink {
    fn field(&mut self, id: FieldId, range: Range<usize>, value: FieldValue);

    fn warning(&mut self, kind: WarningKind, range: Range<usize>, message: &str);
}

/// A single event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Field {
        id: FieldId,
        range: Range<usize>,
        value: FieldValue,
    },
    Warning {
        kind: WarningKind,
        range: Range<usize>,
        message: String,
    },
}

/// Align, read one value with `read` and report it under `id`.
///
/// The reported range starts after the alignment padding.
pub(crate) fn read_field<'a, T, F>(
    cursor: &mut CdrCursor<'a>,
    enc: Encoding,
    alignment: usize,
    sink: &mut dyn ReportSink,
    id: FieldId,
    read: F,
) -> DecodeResult<T>
where
    T: Clone + Into<FieldValue>,
    F: FnOnce(&mut CdrCursor<'a>) -> DecodeResult<T>,
{
    cursor.align(enc, alignment)?;
    let start = cursor.offset();
    let value = read(cursor)?;
    sink.field(id, start..cursor.offset(), value.clone().into());
    Ok(value)
}

/// Open an encapsulation and report its length and byte order.
pub(crate) fn open_encapsulation(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
) -> DecodeResult<Encapsulation> {
    cursor.align(enc, 4)?;
    let start = cursor.offset();
    let encap = read_encapsulation(cursor, enc)?;
    sink.field(FieldId::EncapsulationLength, start..start + 4, encap.length.into());
    if !encap.is_empty() {
        sink.field(
            FieldId::ByteOrder,
            start + 4..start + 5,
            FieldValue::Bool(encap.encoding.order.is_little()),
        );
    }
    Ok(encap)
}

/// Give up on the contents of an encapsulation after `error`.
///
/// `cursor` is the outer cursor, still positioned at the start of the
/// contents. Everything from the failure to the region end is reported as
/// malformed and the cursor resumes after the region.
pub(crate) fn abandon_encapsulation(
    cursor: &mut CdrCursor<'_>,
    encap: &Encapsulation,
    error: &DecodeError,
    sink: &mut dyn ReportSink,
) {
    let start = cursor.offset().min(encap.end);
    let at = error.offset().clamp(start, encap.end);
    let kind = if error.is_truncated() {
        WarningKind::Truncated
    } else {
        WarningKind::BogusLength
    };
    log::debug!("[giop] encapsulation {}..{} abandoned: {}", start, encap.end, error);
    sink.warning(kind, start..encap.end, &error.to_string());
    if at < encap.end {
        let bytes = cursor.buffer()[at..encap.end].to_vec();
        sink.field(FieldId::MalformedBytes, at..encap.end, FieldValue::Bytes(bytes));
    }
    cursor.set_offset(encap.end);
}

/// Read a `fixed<digits, scale>` and report its decimal text under `id`.
///
/// An unrecognised sign nibble or a digit nibble above 9 is flagged but the
/// value is still returned.
pub fn report_fixed(
    cursor: &mut CdrCursor<'_>,
    digits: u16,
    scale: i16,
    sink: &mut dyn ReportSink,
    id: FieldId,
) -> DecodeResult<FixedDecimal> {
    let start = cursor.offset();
    let value = read_fixed(cursor, digits, scale)?;
    let range = start..cursor.offset();
    if let FixedSign::Unknown(nibble) = value.sign {
        let note = format!("fixed sign nibble 0x{:X}", nibble);
        sink.warning(WarningKind::UnknownFixedSign, range.clone(), &note);
    }
    if !value.invalid_digits.is_empty() {
        let nibbles: Vec<String> = value.invalid_digits.iter().map(|n| format!("0x{:X}", n)).collect();
        let note = format!("fixed digit nibbles {}", nibbles.join(", "));
        sink.warning(WarningKind::InvalidFixedDigit, range.clone(), &note);
    }
    sink.field(id, range, FieldValue::Str(value.text.clone()));
    Ok(value)
}

/// Sink that keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<ReportEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// First value reported for `id`.
    pub fn value(&self, id: FieldId) -> Option<&FieldValue> {
        self.values(id).next()
    }

    /// All values reported for `id`, in order.
    pub fn values(&self, id: FieldId) -> impl Iterator<Item = &FieldValue> + '_ {
        self.events.iter().filter_map(move |e| match e {
            ReportEvent::Field { id: got, value, .. } if *got == id => Some(value),
            _ => None,
        })
    }

    /// Byte range of the first field reported for `id`.
    pub fn range(&self, id: FieldId) -> Option<Range<usize>> {
        self.events.iter().find_map(|e| match e {
            ReportEvent::Field { id: got, range, .. } if *got == id => Some(range.clone()),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = (WarningKind, &str)> + '_ {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::Warning { kind, message, .. } => Some((*kind, message.as_str())),
            _ => None,
        })
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings().any(|(k, _)| k == kind)
    }
}

impl ReportSink for RecordingSink {
    fn field(&mut self, id: FieldId, range: Range<usize>, value: FieldValue) {
        self.events.push(ReportEvent::Field { id, range, value });
    }

    fn warning(&mut self, kind: WarningKind, range: Range<usize>, message: &str) {
        self.events.push(ReportEvent::Warning {
            kind,
            range,
            message: message.to_owned(),
        });
    }
}

/// Sink that forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn field(&mut self, id: FieldId, range: Range<usize>, value: FieldValue) {
        log::trace!("[giop] {:?} @{}..{} = {}", id, range.start, range.end, value);
    }

    fn warning(&mut self, kind: WarningKind, range: Range<usize>, message: &str) {
        log::warn!("[giop] {:?} @{}..{}: {}", kind, range.start, range.end, message);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn field(&mut self, _id: FieldId, _range: Range<usize>, _value: FieldValue) {}

    fn warning(&mut self, _kind: WarningKind, _range: Range<usize>, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_lookup() {
        let mut sink = RecordingSink::new();
        sink.field(FieldId::RequestId, 12..16, 42u32.into());
        sink.field(FieldId::Operation, 20..29, "echo".into());
        sink.field(FieldId::RequestId, 40..44, 43u32.into());
        sink.warning(WarningKind::UnresolvedReply, 0..12, "no request");

        assert_eq!(sink.value(FieldId::RequestId), Some(&FieldValue::UInt(42)));
        assert_eq!(sink.values(FieldId::RequestId).count(), 2);
        assert_eq!(sink.range(FieldId::Operation), Some(20..29));
        assert_eq!(
            sink.value(FieldId::Operation).and_then(FieldValue::as_str),
            Some("echo")
        );
        assert!(sink.has_warning(WarningKind::UnresolvedReply));
        assert!(!sink.has_warning(WarningKind::Truncated));
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(-3i16), FieldValue::Int(-3));
        assert_eq!(FieldValue::from(7u8).as_u64(), Some(7));
        assert_eq!(FieldValue::from(-1i32).as_u64(), None);
        assert_eq!(FieldValue::from(&[1u8, 2][..]).to_string(), "2 bytes [0102]");
        assert_eq!(FieldValue::from("x").to_string(), "\"x\"");
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        sink.field(FieldId::Payload, 0..4, FieldValue::None);
        sink.warning(WarningKind::Truncated, 0..4, "ignored");
    }

    #[test]
    fn test_report_fixed_flags_unknown_sign() {
        let bytes = [0x12, 0x3C, 0x45, 0x6A];
        let mut cursor = CdrCursor::new(&bytes);
        let mut sink = RecordingSink::new();

        let good = report_fixed(&mut cursor, 3, 1, &mut sink, FieldId::Custom("price")).unwrap();
        assert_eq!(good.text, "+12.3");
        assert_eq!(sink.range(FieldId::Custom("price")), Some(0..2));
        assert!(!sink.has_warning(WarningKind::UnknownFixedSign));

        let odd = report_fixed(&mut cursor, 3, 0, &mut sink, FieldId::Custom("qty")).unwrap();
        assert_eq!(odd.sign, FixedSign::Unknown(0x0A));
        assert!(sink.has_warning(WarningKind::UnknownFixedSign));
        assert!(!sink.has_warning(WarningKind::InvalidFixedDigit));
    }

    #[test]
    fn test_report_fixed_flags_invalid_digits() {
        let bytes = [0x1E, 0x3C];
        let mut cursor = CdrCursor::new(&bytes);
        let mut sink = RecordingSink::new();

        let value = report_fixed(&mut cursor, 3, 0, &mut sink, FieldId::Custom("qty")).unwrap();
        assert_eq!(value.text, "+1?3");
        assert!(sink.has_warning(WarningKind::InvalidFixedDigit));
        assert!(!sink.has_warning(WarningKind::UnknownFixedSign));
        assert_eq!(sink.value(FieldId::Custom("qty")).and_then(FieldValue::as_str), Some("+1?3"));
    }
}

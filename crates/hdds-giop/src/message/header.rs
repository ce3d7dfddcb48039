// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// GIOP message header and message-level enumerations.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::cdr::{CdrWriter, Encoding, Endianness, GiopVersion};
use crate::error::{DecodeError, DecodeResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const GIOP_MAGIC: [u8; 4] = *b"GIOP";

/// Fixed header size in bytes.
pub const GIOP_HEADER_SIZE: usize = 12;

/// Flags bit 0: byte order of the whole message.
pub const FLAG_LITTLE_ENDIAN: u8 = 0x01;
/// Flags bit 1 (GIOP 1.1+): more fragments follow.
pub const FLAG_FRAGMENT: u8 = 0x02;

// Message types
pub const MSG_REQUEST: u8 = 0;
pub const MSG_REPLY: u8 = 1;
pub const MSG_CANCEL_REQUEST: u8 = 2;
pub const MSG_LOCATE_REQUEST: u8 = 3;
pub const MSG_LOCATE_REPLY: u8 = 4;
pub const MSG_CLOSE_CONNECTION: u8 = 5;
pub const MSG_MESSAGE_ERROR: u8 = 6;
pub const MSG_FRAGMENT: u8 = 7;

// ---------------------------------------------------------------------------
// Message kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Reply,
    CancelRequest,
    LocateRequest,
    LocateReply,
    CloseConnection,
    MessageError,
    Fragment,
    Unknown(u8),
}

impl MessageKind {
    pub fn from_u8(v: u8) -> Self {
        match v {
            MSG_REQUEST => Self::Request,
            MSG_REPLY => Self::Reply,
            MSG_CANCEL_REQUEST => Self::CancelRequest,
            MSG_LOCATE_REQUEST => Self::LocateRequest,
            MSG_LOCATE_REPLY => Self::LocateReply,
            MSG_CLOSE_CONNECTION => Self::CloseConnection,
            MSG_MESSAGE_ERROR => Self::MessageError,
            MSG_FRAGMENT => Self::Fragment,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Request => MSG_REQUEST,
            Self::Reply => MSG_REPLY,
            Self::CancelRequest => MSG_CANCEL_REQUEST,
            Self::LocateRequest => MSG_LOCATE_REQUEST,
            Self::LocateReply => MSG_LOCATE_REPLY,
            Self::CloseConnection => MSG_CLOSE_CONNECTION,
            Self::MessageError => MSG_MESSAGE_ERROR,
            Self::Fragment => MSG_FRAGMENT,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Reply => "Reply",
            Self::CancelRequest => "CancelRequest",
            Self::LocateRequest => "LocateRequest",
            Self::LocateReply => "LocateReply",
            Self::CloseConnection => "CloseConnection",
            Self::MessageError => "MessageError",
            Self::Fragment => "Fragment",
            Self::Unknown(_) => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Reply / locate status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    NoException,
    UserException,
    SystemException,
    LocationForward,
    LocationForwardPerm,
    NeedsAddressingMode,
    Unknown(u32),
}

impl ReplyStatus {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::NoException,
            1 => Self::UserException,
            2 => Self::SystemException,
            3 => Self::LocationForward,
            4 => Self::LocationForwardPerm,
            5 => Self::NeedsAddressingMode,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::NoException => 0,
            Self::UserException => 1,
            Self::SystemException => 2,
            Self::LocationForward => 3,
            Self::LocationForwardPerm => 4,
            Self::NeedsAddressingMode => 5,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NoException => "NO_EXCEPTION",
            Self::UserException => "USER_EXCEPTION",
            Self::SystemException => "SYSTEM_EXCEPTION",
            Self::LocationForward => "LOCATION_FORWARD",
            Self::LocationForwardPerm => "LOCATION_FORWARD_PERM",
            Self::NeedsAddressingMode => "NEEDS_ADDRESSING_MODE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStatus {
    UnknownObject,
    ObjectHere,
    ObjectForward,
    ObjectForwardPerm,
    LocSystemException,
    LocNeedsAddressingMode,
    Unknown(u32),
}

impl LocateStatus {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::UnknownObject,
            1 => Self::ObjectHere,
            2 => Self::ObjectForward,
            3 => Self::ObjectForwardPerm,
            4 => Self::LocSystemException,
            5 => Self::LocNeedsAddressingMode,
            other => Self::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UnknownObject => "UNKNOWN_OBJECT",
            Self::ObjectHere => "OBJECT_HERE",
            Self::ObjectForward => "OBJECT_FORWARD",
            Self::ObjectForwardPerm => "OBJECT_FORWARD_PERM",
            Self::LocSystemException => "LOC_SYSTEM_EXCEPTION",
            Self::LocNeedsAddressingMode => "LOC_NEEDS_ADDRESSING_MODE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Name of a system exception completion status.
pub fn completion_status_name(v: u32) -> &'static str {
    match v {
        0 => "COMPLETED_YES",
        1 => "COMPLETED_NO",
        2 => "COMPLETED_MAYBE",
        _ => "UNKNOWN",
    }
}

// ---------------------------------------------------------------------------
// Message header
// ---------------------------------------------------------------------------

/// Fixed 12-byte GIOP header plus the per-message state later steps fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: GiopVersion,
    pub flags: u8,
    pub kind: MessageKind,
    /// Payload size, header excluded.
    pub message_size: u32,
    /// Correlation id, once the kind-specific header has been read.
    pub request_id: Option<u32>,
    pub reply_status: Option<ReplyStatus>,
    /// Last exception repository id decoded in this message.
    pub exception_id: Option<String>,
}

impl MessageHeader {
    /// Parse the fixed header.
    ///
    /// Returns `Ok(None)` when the buffer does not start with the GIOP magic.
    pub fn parse(buf: &[u8]) -> DecodeResult<Option<Self>> {
        if !has_magic(buf) {
            return Ok(None);
        }
        if buf.len() < GIOP_HEADER_SIZE {
            return Err(DecodeError::Truncated {
                offset: 0,
                needed: GIOP_HEADER_SIZE,
                available: buf.len(),
            });
        }
        let flags = buf[6];
        Ok(Some(Self {
            version: GiopVersion::new(buf[4], buf[5]),
            flags,
            kind: MessageKind::from_u8(buf[7]),
            message_size: read_size(&buf[8..12], flags),
            request_id: None,
            reply_status: None,
            exception_id: None,
        }))
    }

    /// Header for an outgoing message of `kind`.
    pub fn new(version: GiopVersion, order: Endianness, kind: MessageKind) -> Self {
        Self {
            version,
            flags: if order.is_little() { FLAG_LITTLE_ENDIAN } else { 0 },
            kind,
            message_size: 0,
            request_id: None,
            reply_status: None,
            exception_id: None,
        }
    }

    pub fn byte_order(&self) -> Endianness {
        Endianness::from_flag(self.flags)
    }

    /// Message-level decoding context: origin at the first header byte.
    pub fn encoding(&self) -> Encoding {
        Encoding::new(self.byte_order(), 0)
    }

    /// GIOP 1.0 has no fragment bit.
    pub fn fragments_follow(&self) -> bool {
        self.version >= GiopVersion::V1_1 && self.flags & FLAG_FRAGMENT != 0
    }

    /// Header plus payload.
    pub fn total_length(&self) -> usize {
        GIOP_HEADER_SIZE + self.message_size as usize
    }

    pub fn write_to(&self, w: &mut CdrWriter) {
        w.write_bytes(&GIOP_MAGIC);
        w.write_octet(self.version.major).write_octet(self.version.minor);
        w.write_octet(self.flags).write_octet(self.kind.as_u8());
        w.write_ulong(self.message_size);
    }
}

fn has_magic(buf: &[u8]) -> bool {
    buf.get(..GIOP_MAGIC.len()) == Some(&GIOP_MAGIC[..])
}

fn read_size(raw: &[u8], flags: u8) -> u32 {
    if flags & FLAG_LITTLE_ENDIAN != 0 {
        LittleEndian::read_u32(raw)
    } else {
        BigEndian::read_u32(raw)
    }
}

/// Length of the GIOP message starting at `buf`.
///
/// `None` until the full header is available, and for non-GIOP data.
pub fn pdu_length(buf: &[u8]) -> Option<usize> {
    if buf.len() < GIOP_HEADER_SIZE || !has_magic(buf) {
        return None;
    }
    Some(GIOP_HEADER_SIZE + read_size(&buf[8..12], buf[6]) as usize)
}

/// Assemble a complete message: header, then whatever `body` writes, with
/// the size field patched afterwards. Body alignment is relative to the
/// first header byte.
pub fn build_message<F>(version: GiopVersion, order: Endianness, kind: MessageKind, body: F) -> Vec<u8>
where
    F: FnOnce(&mut CdrWriter),
{
    let mut w = CdrWriter::new(order);
    MessageHeader::new(version, order, kind).write_to(&mut w);
    body(&mut w);
    let size = (w.offset() - GIOP_HEADER_SIZE) as u32;
    w.patch_ulong(8, size);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_big_endian() {
        let msg = build_message(GiopVersion::V1_2, Endianness::Big, MessageKind::Request, |w| {
            w.write_ulong(42);
        });
        let header = MessageHeader::parse(&msg).unwrap().unwrap();
        assert_eq!(header.version, GiopVersion::V1_2);
        assert_eq!(header.kind, MessageKind::Request);
        assert_eq!(header.byte_order(), Endianness::Big);
        assert_eq!(header.message_size, 4);
        assert_eq!(header.total_length(), 16);
        assert_eq!(pdu_length(&msg), Some(16));
    }

    #[test]
    fn test_parse_header_little_endian() {
        let msg = build_message(GiopVersion::V1_1, Endianness::Little, MessageKind::Reply, |w| {
            w.write_ulonglong(1);
        });
        let header = MessageHeader::parse(&msg).unwrap().unwrap();
        assert_eq!(header.byte_order(), Endianness::Little);
        assert_eq!(header.message_size, 12);
        assert_eq!(&msg[8..12], &12u32.to_le_bytes());
    }

    #[test]
    fn test_not_giop() {
        assert_eq!(MessageHeader::parse(b"HTTP/1.1 200 OK\r\n").unwrap(), None);
        assert_eq!(MessageHeader::parse(b"GI").unwrap(), None);
        assert_eq!(pdu_length(b"RTPS\x02\x03\x01\x0f\x00\x00\x00\x00"), None);
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = MessageHeader::parse(b"GIOP\x01\x02").unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(pdu_length(b"GIOP\x01\x02"), None);
    }

    #[test]
    fn test_fragment_flag_ignored_before_1_1() {
        let mut msg = build_message(GiopVersion::V1_0, Endianness::Big, MessageKind::Fragment, |_| {});
        msg[6] |= FLAG_FRAGMENT;
        assert!(!MessageHeader::parse(&msg).unwrap().unwrap().fragments_follow());
        msg[5] = 1;
        assert!(MessageHeader::parse(&msg).unwrap().unwrap().fragments_follow());
    }

    #[test]
    fn test_enum_round_trips() {
        for v in 0..=8u8 {
            assert_eq!(MessageKind::from_u8(v).as_u8(), v);
        }
        assert_eq!(MessageKind::from_u8(9), MessageKind::Unknown(9));
        assert_eq!(ReplyStatus::from_u32(2).name(), "SYSTEM_EXCEPTION");
        assert_eq!(ReplyStatus::from_u32(5).as_u32(), 5);
        assert_eq!(LocateStatus::from_u32(1), LocateStatus::ObjectHere);
        assert_eq!(completion_status_name(2), "COMPLETED_MAYBE");
    }
}

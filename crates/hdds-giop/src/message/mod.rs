// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// GIOP message orchestrator.
//
// One call to `Dissector::dissect` walks one message:
// AwaitingHeader -> HeaderParsed -> BodyDispatched -> Done.
// Decode errors never escape a message. They are caught here, the affected
// bytes are reported as malformed and the registries keep whatever single
// insertions happened before the failure.

mod header;
mod service_context;
mod target;

pub use header::{
    build_message, completion_status_name, pdu_length, LocateStatus, MessageHeader, MessageKind,
    ReplyStatus, FLAG_FRAGMENT, FLAG_LITTLE_ENDIAN, GIOP_HEADER_SIZE, GIOP_MAGIC, MSG_CANCEL_REQUEST,
    MSG_CLOSE_CONNECTION, MSG_FRAGMENT, MSG_LOCATE_REPLY, MSG_LOCATE_REQUEST, MSG_MESSAGE_ERROR,
    MSG_REPLY, MSG_REQUEST,
};
pub use service_context::{
    decode_service_contexts, ServiceContext, ServiceContextData, SERVICE_ID_CODE_SETS,
    SERVICE_ID_RT_CORBA_PRIORITY,
};
pub use target::{decode_target_address, TargetAddress, KEY_ADDR, PROFILE_ADDR, REFERENCE_ADDR};

use std::ops::Range;

use crate::cdr::{padding, CdrCursor, Encoding, GiopVersion};
use crate::config::{ConfigError, GiopConfig};
use crate::dispatch::{DecoderHandle, DispatchTable, PayloadContext, UNKNOWN_OPERATION};
use crate::error::{DecodeError, DecodeResult};
use crate::ior::{decode_object_reference, IorError, ObjectReference};
use crate::report::{read_field, FieldId, FieldValue, ReportSink, WarningKind};
use crate::session::{Frame, RequestRecord, Session};

/// Operation whose successful reply carries an object reference worth
/// remembering (naming service lookups).
const RESOLVE_OPERATION: &str = "resolve";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How far a message got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    AwaitingHeader,
    HeaderParsed,
    BodyDispatched,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Complete,
    /// Version above the configured maximum; body left opaque.
    UnsupportedVersion,
    /// Decoding stopped early. The bytes from the error offset on were
    /// reported as [`FieldId::MalformedBytes`].
    Malformed(DecodeError),
}

/// Everything learned from one GIOP message.
#[derive(Debug, Clone)]
pub struct DissectedMessage {
    pub header: MessageHeader,
    pub stage: Stage,
    pub status: MessageStatus,
    /// Bytes attributed to this message, header included.
    pub consumed: usize,
    /// Operation of a request, or of the request a reply answers.
    pub operation: Option<String>,
    /// Capture sequence of the request a reply was paired with.
    pub request_sequence: Option<u32>,
    /// Name of the payload decoder that ran.
    pub decoder: Option<String>,
    pub service_contexts: Vec<ServiceContext>,
    pub target: Option<TargetAddress>,
    pub locate_status: Option<LocateStatus>,
    /// Object reference carried by a resolve reply or a forward.
    pub object_reference: Option<ObjectReference>,
}

impl DissectedMessage {
    fn new(header: MessageHeader, consumed: usize) -> Self {
        Self {
            header,
            stage: Stage::HeaderParsed,
            status: MessageStatus::Complete,
            consumed,
            operation: None,
            request_sequence: None,
            decoder: None,
            service_contexts: Vec::new(),
            target: None,
            locate_status: None,
            object_reference: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == MessageStatus::Complete
    }
}

/// Outcome of [`Dissector::dissect`].
#[derive(Debug, Clone)]
pub enum Dissection {
    /// No GIOP magic. Nothing consumed, nothing reported.
    NotGiop,
    /// GIOP magic but fewer than 12 header bytes.
    Truncated(DecodeError),
    Message(DissectedMessage),
}

impl Dissection {
    pub fn message(&self) -> Option<&DissectedMessage> {
        match self {
            Self::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Message(msg) => msg.stage,
            _ => Stage::AwaitingHeader,
        }
    }

    pub fn consumed(&self) -> usize {
        self.message().map_or(0, |msg| msg.consumed)
    }
}

// ---------------------------------------------------------------------------
// Dissector
// ---------------------------------------------------------------------------

/// Interprets GIOP messages against a [`Session`].
///
/// The dissector itself is immutable once built; all per-capture state lives
/// in the session passed to each call.
#[derive(Debug)]
pub struct Dissector {
    config: GiopConfig,
    dispatch: DispatchTable,
}

impl Dissector {
    /// Validate `config` and take ownership of the registered decoders.
    pub fn new(config: GiopConfig, mut dispatch: DispatchTable) -> Result<Self, ConfigError> {
        config.validate()?;
        dispatch.set_heuristics_enabled(config.heuristic_dispatch);
        log::debug!(
            "[giop] dissector ready: GIOP 1.0..=1.{}, {} decoder(s), heuristics {}",
            config.max_minor_version,
            dispatch.len(),
            if config.heuristic_dispatch { "on" } else { "off" }
        );
        Ok(Self { config, dispatch })
    }

    pub fn config(&self) -> &GiopConfig {
        &self.config
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Fresh session, seeded from the configured IOR file.
    pub fn new_session(&self) -> Result<Session, IorError> {
        Session::with_config(&self.config)
    }

    fn version_supported(&self, version: GiopVersion) -> bool {
        version.major == 1 && version.minor <= self.config.max_minor_version
    }

    /// Interpret the message at the start of `buf`.
    pub fn dissect(
        &self,
        session: &mut Session,
        buf: &[u8],
        frame: Frame,
        sink: &mut dyn ReportSink,
    ) -> Dissection {
        let header = match MessageHeader::parse(buf) {
            Ok(Some(header)) => header,
            Ok(None) => return Dissection::NotGiop,
            Err(e) => {
                log::warn!("[giop] #{} short header: {}", frame.number, e);
                sink.warning(WarningKind::Truncated, 0..buf.len(), &e.to_string());
                return Dissection::Truncated(e);
            }
        };
        report_header(&header, sink);
        log::trace!(
            "[giop] #{} {} GIOP {} size={}",
            frame.number,
            header.kind.name(),
            header.version,
            header.message_size
        );

        let end = header.total_length().min(buf.len());
        let cursor = CdrCursor::at(&buf[..end], GIOP_HEADER_SIZE);
        let enc = header.encoding();
        let mut walk = MessageWalk {
            dissector: self,
            session,
            frame,
            cursor,
            enc,
            msg: DissectedMessage::new(header, end),
            id_range: GIOP_HEADER_SIZE..GIOP_HEADER_SIZE,
            sink,
        };

        if !self.version_supported(walk.msg.header.version) {
            let note = format!(
                "GIOP {} is above 1.{}; body not interpreted",
                walk.msg.header.version, self.config.max_minor_version
            );
            walk.sink.warning(WarningKind::UnsupportedVersion, 4..6, &note);
            walk.opaque(FieldId::Payload);
            walk.msg.status = MessageStatus::UnsupportedVersion;
            walk.msg.stage = Stage::Done;
            return Dissection::Message(walk.msg);
        }

        match walk.body() {
            Ok(()) => {
                walk.opaque(FieldId::Trailer);
                walk.msg.stage = Stage::Done;
            }
            Err(error) => walk.malformed(buf, end, error),
        }
        Dissection::Message(walk.msg)
    }
}

fn report_header(header: &MessageHeader, sink: &mut dyn ReportSink) {
    sink.field(FieldId::Magic, 0..4, FieldValue::Bytes(GIOP_MAGIC.to_vec()));
    sink.field(FieldId::VersionMajor, 4..5, header.version.major.into());
    sink.field(FieldId::VersionMinor, 5..6, header.version.minor.into());
    sink.field(FieldId::Flags, 6..7, header.flags.into());
    sink.field(FieldId::MessageType, 7..8, header.kind.as_u8().into());
    sink.field(FieldId::MessageSize, 8..12, header.message_size.into());
}

// ---------------------------------------------------------------------------
// Per-message walk
// ---------------------------------------------------------------------------

struct MessageWalk<'d, 'a, 'r> {
    dissector: &'d Dissector,
    session: &'r mut Session,
    frame: Frame,
    cursor: CdrCursor<'a>,
    /// Message-level context (origin at the first header byte).
    enc: Encoding,
    msg: DissectedMessage,
    /// Where the request id was read; pinned to by derived fields.
    id_range: Range<usize>,
    sink: &'r mut dyn ReportSink,
}

impl MessageWalk<'_, '_, '_> {
    fn version(&self) -> GiopVersion {
        self.msg.header.version
    }

    fn body(&mut self) -> DecodeResult<()> {
        match self.msg.header.kind {
            MessageKind::Request => self.request(),
            MessageKind::Reply => self.reply(),
            MessageKind::CancelRequest => self.request_id().map(drop),
            MessageKind::LocateRequest => self.locate_request(),
            MessageKind::LocateReply => self.locate_reply(),
            MessageKind::Fragment => self.fragment(),
            MessageKind::CloseConnection | MessageKind::MessageError => Ok(()),
            MessageKind::Unknown(kind) => {
                let note = format!("unknown GIOP message type {}", kind);
                log::warn!("[giop] #{} {}", self.frame.number, note);
                self.sink.warning(WarningKind::UnknownMessageType, 7..8, &note);
                self.opaque(FieldId::Payload);
                Ok(())
            }
        }
    }

    fn malformed(&mut self, buf: &[u8], end: usize, error: DecodeError) {
        let at = error.offset().min(end);
        let kind = if error.is_truncated() {
            WarningKind::Truncated
        } else {
            WarningKind::BogusLength
        };
        log::warn!(
            "[giop] #{} malformed {} at offset {}: {}",
            self.frame.number,
            self.msg.header.kind.name(),
            at,
            error
        );
        self.sink.warning(kind, at..end, &error.to_string());
        if at < end {
            self.sink
                .field(FieldId::MalformedBytes, at..end, FieldValue::Bytes(buf[at..end].to_vec()));
        }
        self.cursor.set_offset(end);
        self.msg.status = MessageStatus::Malformed(error);
    }

    /// Report everything left in the message under `id`.
    fn opaque(&mut self, id: FieldId) {
        let start = self.cursor.offset();
        let rest = self.cursor.read_rest();
        if !rest.is_empty() {
            self.sink.field(id, start..self.cursor.offset(), FieldValue::Bytes(rest.to_vec()));
        }
    }

    // -- common fields ------------------------------------------------------

    fn request_id(&mut self) -> DecodeResult<u32> {
        let enc = self.enc;
        let id = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::RequestId, |c| c.read_ulong(enc))?;
        let end = self.cursor.offset();
        self.id_range = end - 4..end;
        self.msg.header.request_id = Some(id);
        Ok(id)
    }

    fn reserved(&mut self) -> DecodeResult<()> {
        read_field(&mut self.cursor, self.enc, 1, self.sink, FieldId::Reserved, |c| c.read_bytes(3))?;
        Ok(())
    }

    fn operation(&mut self) -> DecodeResult<String> {
        let enc = self.enc;
        let operation = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::Operation, |c| c.read_string(enc))?;
        self.msg.operation = Some(operation.clone());
        Ok(operation)
    }

    fn service_contexts(&mut self) -> DecodeResult<()> {
        self.msg.service_contexts = decode_service_contexts(&mut self.cursor, self.enc, self.sink)?;
        Ok(())
    }

    /// GIOP 1.2 bodies start on an 8-byte boundary, but only when a body is
    /// present at all.
    fn align_body(&mut self) -> DecodeResult<()> {
        let pad = padding(self.cursor.offset(), self.enc.origin, 8);
        if !self.cursor.is_eof() && pad <= self.cursor.remaining() {
            self.cursor.align(self.enc, 8)?;
        }
        Ok(())
    }

    fn system_exception(&mut self) -> DecodeResult<()> {
        let enc = self.enc;
        let id = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ExceptionId, |c| c.read_string(enc))?;
        let minor = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ExceptionMinor, |c| c.read_ulong(enc))?;
        let completion =
            read_field(&mut self.cursor, enc, 4, self.sink, FieldId::CompletionStatus, |c| c.read_ulong(enc))?;
        log::debug!(
            "[giop] #{} system exception {} minor=0x{:08x} {}",
            self.frame.number,
            id,
            minor,
            completion_status_name(completion)
        );
        self.msg.header.exception_id = Some(id);
        Ok(())
    }

    fn addressing_disposition(&mut self) -> DecodeResult<()> {
        let enc = self.enc;
        read_field(&mut self.cursor, enc, 2, self.sink, FieldId::AddressingDisposition, |c| c.read_short(enc))?;
        Ok(())
    }

    /// Object reference in a reply body. Keys are only stored on the first
    /// pass.
    fn object_reference(&mut self, remember: bool) -> DecodeResult<()> {
        let store = if remember && self.frame.is_first_pass() {
            Some(&mut self.session.object_keys)
        } else {
            None
        };
        let reference = decode_object_reference(&mut self.cursor, self.enc, self.sink, store)?;
        self.msg.object_reference = Some(reference);
        Ok(())
    }

    // -- payload --------------------------------------------------------------

    fn run_decoder(
        &mut self,
        handle: &DecoderHandle,
        request_id: u32,
        operation: &str,
        exception_id: Option<&str>,
    ) -> DecodeResult<()> {
        self.msg.stage = Stage::BodyDispatched;
        self.msg.decoder = Some(handle.name().to_owned());
        let mut ctx = PayloadContext {
            cursor: &mut self.cursor,
            encoding: self.enc,
            version: self.msg.header.version,
            kind: self.msg.header.kind,
            request_id,
            operation,
            reply_status: self.msg.header.reply_status,
            exception_id,
            max_typecode_depth: self.dissector.config.max_typecode_depth,
            sink: &mut *self.sink,
        };
        handle.decode(&mut ctx)
    }

    fn dispatch(
        &mut self,
        handle: Option<DecoderHandle>,
        request_id: u32,
        operation: &str,
        exception_id: Option<&str>,
    ) -> DecodeResult<()> {
        match handle {
            Some(handle) => self.run_decoder(&handle, request_id, operation, exception_id),
            None => {
                self.opaque(FieldId::Payload);
                Ok(())
            }
        }
    }

    fn resolve(&self, interface_id: Option<&str>, operation: &str) -> Option<DecoderHandle> {
        let body = &self.cursor.buffer()[self.cursor.offset()..];
        self.dissector.dispatch.resolve(interface_id, operation, body)
    }

    // -- Request ----------------------------------------------------------------

    fn request(&mut self) -> DecodeResult<()> {
        let (request_id, operation) = if self.version() >= GiopVersion::V1_2 {
            self.request_header_1_2()?
        } else {
            self.request_header_1_0()?
        };

        if self.frame.is_first_pass() {
            self.session.requests.record(self.frame.number, request_id, &operation);
        }

        let interface_id = self
            .msg
            .target
            .as_ref()
            .and_then(TargetAddress::object_key)
            .and_then(|key| self.session.object_keys.interface_id(key))
            .map(str::to_owned);

        let handle = self.resolve(interface_id.as_deref(), &operation);
        if self.frame.is_first_pass() {
            if let Some(handle) = &handle {
                self.session
                    .requests
                    .bind(self.frame.number, handle.clone(), interface_id.as_deref());
            }
        }
        self.dispatch(handle, request_id, &operation, None)
    }

    fn request_header_1_0(&mut self) -> DecodeResult<(u32, String)> {
        let enc = self.enc;
        self.service_contexts()?;
        let request_id = self.request_id()?;
        read_field(&mut self.cursor, enc, 1, self.sink, FieldId::ResponseFlags, |c| c.read_boolean())?;
        if self.version() >= GiopVersion::V1_1 {
            self.reserved()?;
        }
        let key = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ObjectKey, |c| c.read_octet_seq(enc))?;
        self.msg.target = Some(TargetAddress::Key(key.to_vec()));
        let operation = self.operation()?;
        read_field(&mut self.cursor, enc, 4, self.sink, FieldId::RequestingPrincipal, |c| {
            c.read_octet_seq(enc)
        })?;
        Ok((request_id, operation))
    }

    fn request_header_1_2(&mut self) -> DecodeResult<(u32, String)> {
        let request_id = self.request_id()?;
        read_field(&mut self.cursor, self.enc, 1, self.sink, FieldId::ResponseFlags, |c| c.read_octet())?;
        self.reserved()?;
        self.msg.target = Some(decode_target_address(&mut self.cursor, self.enc, self.sink)?);
        let operation = self.operation()?;
        self.service_contexts()?;
        self.align_body()?;
        Ok((request_id, operation))
    }

    // -- Reply ------------------------------------------------------------------

    fn reply_status(&mut self) -> DecodeResult<ReplyStatus> {
        let enc = self.enc;
        let raw = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ReplyStatus, |c| c.read_ulong(enc))?;
        let status = ReplyStatus::from_u32(raw);
        self.msg.header.reply_status = Some(status);
        Ok(status)
    }

    fn reply(&mut self) -> DecodeResult<()> {
        let v1_2 = self.version() >= GiopVersion::V1_2;
        if !v1_2 {
            self.service_contexts()?;
        }
        let request_id = self.request_id()?;
        let status = self.reply_status()?;
        if v1_2 {
            self.service_contexts()?;
            self.align_body()?;
        }

        self.session.correlate_reply(self.frame, request_id);
        let request = self.session.request_for_reply(self.frame.number).cloned();
        match &request {
            Some(record) => {
                self.sink
                    .field(FieldId::ResponseTo, self.id_range.clone(), record.sequence.into());
                self.msg.request_sequence = Some(record.sequence);
                self.msg.operation = Some(record.operation.clone());
            }
            None => {
                let note = format!("no earlier request with id {}", request_id);
                self.sink
                    .warning(WarningKind::UnresolvedReply, self.id_range.clone(), &note);
            }
        }
        log::trace!(
            "[giop] #{} reply id={} status={} request={:?}",
            self.frame.number,
            request_id,
            status.name(),
            self.msg.request_sequence
        );

        match status {
            ReplyStatus::SystemException => self.system_exception(),
            ReplyStatus::LocationForward | ReplyStatus::LocationForwardPerm => self.object_reference(false),
            ReplyStatus::NeedsAddressingMode => self.addressing_disposition(),
            ReplyStatus::UserException => {
                let enc = self.enc;
                let exception_id =
                    read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ExceptionId, |c| c.read_string(enc))?;
                self.msg.header.exception_id = Some(exception_id.clone());
                self.reply_payload(request_id, request.as_ref(), Some(exception_id.as_str()))
            }
            ReplyStatus::NoException => {
                if request.as_ref().is_some_and(|r| r.operation == RESOLVE_OPERATION) {
                    return self.object_reference(true);
                }
                self.reply_payload(request_id, request.as_ref(), None)
            }
            ReplyStatus::Unknown(_) => {
                self.opaque(FieldId::Payload);
                Ok(())
            }
        }
    }

    /// Hand a reply body to the decoder that handled its request, or pick one
    /// afresh when none is bound (or it has been disabled since).
    fn reply_payload(
        &mut self,
        request_id: u32,
        request: Option<&RequestRecord>,
        exception_id: Option<&str>,
    ) -> DecodeResult<()> {
        let operation = request.map_or(UNKNOWN_OPERATION, |r| r.operation.as_str());
        let handle = match request.and_then(|r| r.decoder.clone()).filter(DecoderHandle::is_enabled) {
            Some(bound) => Some(bound),
            None => self.resolve(request.and_then(|r| r.interface_id.as_deref()), operation),
        };
        self.dispatch(handle, request_id, operation, exception_id)
    }

    // -- Locate / Fragment ----------------------------------------------------------

    fn locate_request(&mut self) -> DecodeResult<()> {
        let enc = self.enc;
        self.request_id()?;
        let target = if self.version() >= GiopVersion::V1_2 {
            decode_target_address(&mut self.cursor, enc, self.sink)?
        } else {
            let key = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::ObjectKey, |c| c.read_octet_seq(enc))?;
            TargetAddress::Key(key.to_vec())
        };
        self.msg.target = Some(target);
        Ok(())
    }

    fn locate_reply(&mut self) -> DecodeResult<()> {
        let enc = self.enc;
        self.request_id()?;
        let raw = read_field(&mut self.cursor, enc, 4, self.sink, FieldId::LocateStatus, |c| c.read_ulong(enc))?;
        let status = LocateStatus::from_u32(raw);
        self.msg.locate_status = Some(status);
        if self.version() >= GiopVersion::V1_2 {
            self.align_body()?;
        }
        match status {
            LocateStatus::ObjectForward | LocateStatus::ObjectForwardPerm => self.object_reference(false),
            LocateStatus::LocSystemException => self.system_exception(),
            LocateStatus::LocNeedsAddressingMode => self.addressing_disposition(),
            _ => Ok(()),
        }
    }

    fn fragment(&mut self) -> DecodeResult<()> {
        if self.version() >= GiopVersion::V1_2 {
            self.request_id()?;
        }
        self.opaque(FieldId::Fragment);
        Ok(())
    }
}

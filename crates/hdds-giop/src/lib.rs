// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GIOP/CDR message interpreter.
//!
//! Decodes CORBA GIOP 1.0-1.2 messages into a stream of labelled fields,
//! pairs replies with the requests they answer and hands application
//! payloads to registered decoders.
//!
//! # Architecture
//!
//! ```text
//!  bytes --> Dissector::dissect --> header --> Request/Reply/Locate/... walk
//!                 |                                |            |
//!                 |                       service contexts   payload
//!                 v                       TargetAddress      DispatchTable
//!              Session                    Object references     |
//!   (requests, replies, object keys)                            v
//!                                                  PayloadDecoder (TypeCode/Any)
//!                                  ReportSink <-- every field and warning
//! ```
//!
//! # Key Features
//!
//! - **CDR primitives**: alignment relative to an origin, both byte orders,
//!   encapsulations with their own byte order
//! - **TypeCodes**: all 33 kinds, depth-limited, plus `any` values
//! - **Correlation**: replies are paired with the most recent unanswered
//!   request with the same id, even when ids are reused
//! - **Dispatch**: explicit decoders per IDL module, heuristic fallback
//! - **Object keys**: learned from `resolve` replies or loaded from an IOR
//!   file, and used to find the interface behind a request
//!
//! # Example
//!
//! ```
//! use hdds_giop::{
//!     build_message, DispatchTable, Dissector, Endianness, Frame, GiopConfig, GiopVersion,
//!     MessageKind, RecordingSink, KEY_ADDR,
//! };
//!
//! let msg = build_message(GiopVersion::V1_2, Endianness::Big, MessageKind::Request, |w| {
//!     w.write_ulong(42).write_octet(3).write_bytes(&[0; 3]);
//!     w.write_short(KEY_ADDR).write_octet_seq(b"echo-key");
//!     w.write_string("echo").write_ulong(0);
//! });
//!
//! let dissector = Dissector::new(GiopConfig::default(), DispatchTable::new()).unwrap();
//! let mut session = dissector.new_session().unwrap();
//! let mut sink = RecordingSink::new();
//! let out = dissector.dissect(&mut session, &msg, Frame::first(1), &mut sink);
//!
//! assert_eq!(out.message().unwrap().operation.as_deref(), Some("echo"));
//! assert_eq!(session.requests.len(), 1);
//! ```

pub mod cdr;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ior;
pub mod message;
pub mod report;
pub mod session;
pub mod typecode;

// Re-exports for convenience.
pub use cdr::{CdrCursor, CdrWriter, Encoding, Endianness, GiopVersion};
pub use config::{ConfigError, GiopConfig};
pub use dispatch::{
    module_from_repo_id, DecoderHandle, DispatchTable, PayloadContext, PayloadDecoder, UNKNOWN_OPERATION,
};
pub use error::{DecodeError, DecodeResult};
pub use ior::{
    parse_stringified_ior, to_stringified_ior, write_object_reference, IiopProfile, IorError, ObjectReference,
    TaggedProfile,
};
pub use message::{
    build_message, pdu_length, DissectedMessage, Dissection, Dissector, LocateStatus, MessageHeader,
    MessageKind, MessageStatus, ReplyStatus, Stage, TargetAddress, GIOP_HEADER_SIZE, KEY_ADDR,
};
pub use report::{
    report_fixed, FieldId, FieldValue, LogSink, NullSink, RecordingSink, ReportEvent, ReportSink, WarningKind,
};
pub use session::{Frame, ObjectKeyRegistry, Pass, Provenance, RequestRecord, Session};
pub use typecode::{decode_any, decode_typecode, DecodeContext, TcKind, TypeCode, Value};

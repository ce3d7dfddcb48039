// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Service context lists carried by requests and replies.

use crate::cdr::{CdrCursor, Encoding};
use crate::error::DecodeResult;
use crate::report::{abandon_encapsulation, open_encapsulation, read_field, FieldId, ReportSink};

pub const SERVICE_ID_CODE_SETS: u32 = 1;
pub const SERVICE_ID_RT_CORBA_PRIORITY: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceContextData {
    /// Negotiated transmission code sets.
    CodeSets { char_data: u32, wchar_data: u32 },
    RtCorbaPriority(i16),
    /// Unknown id, empty encapsulation, or a known id whose body does not
    /// fit its encapsulation; raw encapsulation bytes.
    Opaque(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub id: u32,
    pub data: ServiceContextData,
}

/// Decode a `ServiceContextList`: ulong count, then (id, encapsulation)
/// pairs.
pub fn decode_service_contexts(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    sink: &mut dyn ReportSink,
) -> DecodeResult<Vec<ServiceContext>> {
    let count = read_field(cursor, enc, 4, sink, FieldId::ServiceContextCount, |c| c.read_ulong(enc))?;
    let mut contexts = Vec::with_capacity((count as usize).min(cursor.remaining()));
    for _ in 0..count {
        let id = read_field(cursor, enc, 4, sink, FieldId::ServiceContextId, |c| c.read_ulong(enc))?;
        let data = match id {
            SERVICE_ID_CODE_SETS | SERVICE_ID_RT_CORBA_PRIORITY => decode_known(cursor, enc, id, sink)?,
            _ => {
                let raw = read_field(cursor, enc, 4, sink, FieldId::ServiceContextData, |c| {
                    c.read_octet_seq(enc)
                })?;
                ServiceContextData::Opaque(raw.to_vec())
            }
        };
        contexts.push(ServiceContext { id, data });
    }
    Ok(contexts)
}

fn decode_known(
    cursor: &mut CdrCursor<'_>,
    enc: Encoding,
    id: u32,
    sink: &mut dyn ReportSink,
) -> DecodeResult<ServiceContextData> {
    let encap = open_encapsulation(cursor, enc, sink)?;
    if encap.is_empty() {
        return Ok(ServiceContextData::Opaque(Vec::new()));
    }
    let region = &cursor.buffer()[..encap.end];
    let mut inner = CdrCursor::at(region, cursor.offset());

    match decode_known_body(&mut inner, encap.encoding, id, sink) {
        Ok(data) => {
            cursor.set_offset(encap.end);
            Ok(data)
        }
        Err(e) => {
            // Keep the whole encapsulation, flag included.
            let raw = region[encap.end - encap.length as usize..].to_vec();
            abandon_encapsulation(cursor, &encap, &e, sink);
            Ok(ServiceContextData::Opaque(raw))
        }
    }
}

fn decode_known_body(
    inner: &mut CdrCursor<'_>,
    enc: Encoding,
    id: u32,
    sink: &mut dyn ReportSink,
) -> DecodeResult<ServiceContextData> {
    if id == SERVICE_ID_CODE_SETS {
        let char_data = read_field(inner, enc, 4, sink, FieldId::CodeSetChar, |c| c.read_ulong(enc))?;
        let wchar_data = read_field(inner, enc, 4, sink, FieldId::CodeSetWchar, |c| c.read_ulong(enc))?;
        Ok(ServiceContextData::CodeSets {
            char_data,
            wchar_data,
        })
    } else {
        let priority = read_field(inner, enc, 2, sink, FieldId::RtCorbaPriority, |c| c.read_short(enc))?;
        Ok(ServiceContextData::RtCorbaPriority(priority))
    }
}

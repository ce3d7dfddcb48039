// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request registry and reply correlation.
//!
//! GIOP request ids are only unique per connection and get reused, so a
//! reply is paired with the most recent unanswered request carrying the same
//! id, or with the most recent answered one when it is a duplicate. The
//! pairing is decided once, on the first pass, and replayed from
//! [`ReplyCorrelation`] afterwards.

use std::collections::HashMap;

use crate::dispatch::DecoderHandle;

/// A request seen on the first pass.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// Capture sequence number of the request message.
    pub sequence: u32,
    pub request_id: u32,
    pub operation: String,
    /// Decoder that committed to this request, once known.
    pub decoder: Option<DecoderHandle>,
    pub interface_id: Option<String>,
    claimed: bool,
}

impl RequestRecord {
    /// True once a reply has been paired with this request.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Requests in capture order.
#[derive(Debug, Default, Clone)]
pub struct RequestRegistry {
    records: Vec<RequestRecord>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sequence: u32, request_id: u32, operation: &str) {
        log::debug!(
            "[giop] request #{} id={} op='{}' recorded",
            sequence,
            request_id,
            operation
        );
        self.records.push(RequestRecord {
            sequence,
            request_id,
            operation: operation.to_owned(),
            decoder: None,
            interface_id: None,
            claimed: false,
        });
    }

    /// Record for the request captured at `sequence`.
    pub fn get(&self, sequence: u32) -> Option<&RequestRecord> {
        self.records.iter().rev().find(|r| r.sequence == sequence)
    }

    /// Back-fill the decoder (and interface id) that handled a request.
    pub fn bind(&mut self, sequence: u32, decoder: DecoderHandle, interface_id: Option<&str>) {
        if let Some(record) = self.records.iter_mut().rev().find(|r| r.sequence == sequence) {
            log::debug!(
                "[giop] request #{} bound to decoder '{}'",
                sequence,
                decoder.name()
            );
            record.decoder = Some(decoder);
            if let Some(id) = interface_id {
                record.interface_id = Some(id.to_owned());
            }
        }
    }

    /// Claim the request a reply with `request_id` answers.
    ///
    /// The most recent unclaimed request wins. When every match is already
    /// claimed the reply is a duplicate and pairs with the most recent one.
    /// Returns its capture sequence.
    pub fn claim_latest(&mut self, request_id: u32) -> Option<u32> {
        if let Some(record) = self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.request_id == request_id && !r.claimed)
        {
            record.claimed = true;
            return Some(record.sequence);
        }
        let record = self.records.iter().rev().find(|r| r.request_id == request_id)?;
        log::debug!(
            "[giop] duplicate reply for id={} paired with request #{}",
            request_id,
            record.sequence
        );
        Some(record.sequence)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Reply sequence → request sequence. Each reply is mapped once.
#[derive(Debug, Default, Clone)]
pub struct ReplyCorrelation {
    map: HashMap<u32, u32>,
}

impl ReplyCorrelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. Later inserts for the same reply are ignored.
    pub fn insert(&mut self, reply_sequence: u32, request_sequence: u32) {
        self.map.entry(reply_sequence).or_insert(request_sequence);
    }

    pub fn get(&self, reply_sequence: u32) -> Option<u32> {
        self.map.get(&reply_sequence).copied()
    }

    /// Mapped request sequence, or the reply's own sequence when unmatched.
    pub fn resolve(&self, reply_sequence: u32) -> u32 {
        self.get(reply_sequence).unwrap_or(reply_sequence)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

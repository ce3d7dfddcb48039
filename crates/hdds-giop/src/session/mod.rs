// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Per-capture interpretation state.
//
// A `Session` owns every registry that outlives a single message. One
// session corresponds to one capture; rebuilding the capture means
// `reset()`, never patching entries in place.

mod correlation;
mod objkey;

pub use correlation::{ReplyCorrelation, RequestRecord, RequestRegistry};
pub use objkey::{ObjectKeyEntry, ObjectKeyRegistry, Provenance};

use std::path::PathBuf;

use crate::config::GiopConfig;
use crate::ior::IorError;

/// Which pass over the capture a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Capture order, exactly once per message. Registries are written.
    First,
    /// Any later visit. Registries are only read.
    Revisit,
}

/// Position of a message in the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Capture sequence number.
    pub number: u32,
    pub pass: Pass,
}

impl Frame {
    pub const fn first(number: u32) -> Self {
        Self {
            number,
            pass: Pass::First,
        }
    }

    pub const fn revisit(number: u32) -> Self {
        Self {
            number,
            pass: Pass::Revisit,
        }
    }

    pub fn is_first_pass(&self) -> bool {
        self.pass == Pass::First
    }
}

/// Registries for one capture.
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub requests: RequestRegistry,
    pub replies: ReplyCorrelation,
    pub object_keys: ObjectKeyRegistry,
    ior_file: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose object key registry is seeded from `config.ior_file`.
    pub fn with_config(config: &GiopConfig) -> Result<Self, IorError> {
        let mut session = Self {
            ior_file: config.ior_file.clone(),
            ..Self::default()
        };
        session.load_ior_file()?;
        Ok(session)
    }

    /// Drop everything learned so far (new capture). Keys from the IOR file
    /// are loaded again.
    pub fn reset(&mut self) -> Result<(), IorError> {
        self.requests.clear();
        self.replies.clear();
        self.object_keys.clear();
        self.load_ior_file()
    }

    fn load_ior_file(&mut self) -> Result<(), IorError> {
        if let Some(path) = &self.ior_file {
            self.object_keys.load_ior_file(path)?;
        }
        Ok(())
    }

    /// Pair a reply with its request.
    ///
    /// On the first pass the most recent unclaimed request with the same id
    /// is claimed (a duplicate reply falls back to the most recent claimed
    /// one) and the pairing recorded; later passes only replay it.
    /// Returns the request's capture sequence, or the reply's own sequence
    /// when nothing matched.
    pub fn correlate_reply(&mut self, frame: Frame, request_id: u32) -> u32 {
        if frame.is_first_pass() {
            let matched = self.requests.claim_latest(request_id).unwrap_or(frame.number);
            self.replies.insert(frame.number, matched);
        }
        self.replies.resolve(frame.number)
    }

    /// Request paired with a reply, if any.
    pub fn request_for_reply(&self, reply_sequence: u32) -> Option<&RequestRecord> {
        let request = self.replies.get(reply_sequence)?;
        if request == reply_sequence {
            return None;
        }
        self.requests.get(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_replies_with_reused_id() {
        let mut session = Session::new();
        session.requests.record(1, 5, "first");
        session.requests.record(2, 5, "second");

        // Reply to the second request arrives first.
        assert_eq!(session.correlate_reply(Frame::first(3), 5), 2);
        assert_eq!(session.correlate_reply(Frame::first(4), 5), 1);

        // Replay never re-derives.
        assert_eq!(session.correlate_reply(Frame::revisit(4), 5), 1);
        assert_eq!(session.correlate_reply(Frame::revisit(3), 5), 2);
        assert_eq!(session.request_for_reply(4).unwrap().operation, "first");
    }

    #[test]
    fn test_unmatched_reply_maps_to_itself() {
        let mut session = Session::new();
        assert_eq!(session.correlate_reply(Frame::first(7), 99), 7);
        assert!(session.request_for_reply(7).is_none());
        assert_eq!(session.correlate_reply(Frame::revisit(8), 99), 8);
    }

    #[test]
    fn test_reset_clears_registries() {
        let mut session = Session::new();
        session.requests.record(1, 1, "op");
        session.correlate_reply(Frame::first(2), 1);
        session
            .object_keys
            .insert(b"key", "IDL:A:1.0", Provenance::ObservedOnWire);
        session.reset().unwrap();
        assert!(session.requests.is_empty());
        assert!(session.replies.is_empty());
        assert!(session.object_keys.is_empty());
    }
}

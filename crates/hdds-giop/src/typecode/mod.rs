// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TypeCode interpreter and Any-value decoder.
//!
//! A TypeCode is the runtime description of an IDL type as it travels inside
//! the stream (most visibly in front of every `any`). Complex kinds carry
//! their parameters in an encapsulation, so every nesting level may switch
//! byte order and restart alignment.
//!
//! TypeCodes are decoded fresh on every occurrence; nothing is cached
//! between messages.

pub mod any;
pub mod decode;
pub mod kind;

pub use any::{decode_any, decode_value, Value};
pub use decode::{decode_typecode, Member, TypeCode, UnionMember, ValueMember};
pub use kind::TcKind;

use crate::cdr::GiopVersion;
use crate::report::ReportSink;

/// Default bound on complex TypeCode nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Shared state for one TypeCode/value decode.
pub struct DecodeContext<'s> {
    /// Version of the enclosing GIOP message (wide char layout).
    pub version: GiopVersion,
    /// Complex TypeCodes nested deeper than this are skipped.
    pub max_depth: usize,
    pub sink: &'s mut dyn ReportSink,
}

impl<'s> DecodeContext<'s> {
    pub fn new(version: GiopVersion, sink: &'s mut dyn ReportSink) -> Self {
        Self {
            version,
            max_depth: DEFAULT_MAX_DEPTH,
            sink,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for GIOP/CDR decoding.
//!
//! Every primitive read returns [`DecodeResult`]. Errors are local to the
//! message being decoded: the orchestrator catches them at the message
//! boundary, reports the affected bytes as malformed and moves on.

use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding a single GIOP message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read would run past the end of the supplied buffer.
    #[error("truncated message: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A length or count field that cannot describe the bytes that follow.
    #[error("bogus length field {value} at offset {offset}")]
    BogusLength { offset: usize, value: u64 },
}

impl DecodeError {
    /// Offset at which decoding failed.
    pub fn offset(&self) -> usize {
        match self {
            Self::Truncated { offset, .. } | Self::BogusLength { offset, .. } => *offset,
        }
    }

    /// True for [`DecodeError::Truncated`].
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

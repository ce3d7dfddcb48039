// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Alignment arithmetic relative to a boundary origin.
//!
//! Alignments are always powers of two (1, 2, 4 or 8).

/// Number of padding bytes needed at `offset` so that `offset - origin` is a
/// multiple of `alignment`.
pub fn padding(offset: usize, origin: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    let mask = alignment - 1;
    let relative = offset.saturating_sub(origin);
    ((relative + mask) & !mask) - relative
}

/// Advance `offset` to the next position aligned relative to `origin`.
pub fn align_offset(offset: usize, origin: usize, alignment: usize) -> usize {
    offset + padding(offset, origin, alignment)
}

/// True when `offset` is aligned relative to `origin`.
pub fn is_aligned(offset: usize, origin: usize, alignment: usize) -> bool {
    padding(offset, origin, alignment) == 0
}

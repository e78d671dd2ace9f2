//! Error types for the page codec.

use std::fmt;

/// Errors raised while decoding a page.
///
/// Pages are only ever written through [`Page::append`](super::Page), which
/// maintains the layout invariants, so any of these indicates a corrupt or
/// truncated file rather than a recoverable condition.
#[derive(Debug)]
pub enum PageError {
    /// The page header describes a layout that cannot fit in the page.
    CorruptHeader {
        /// `used_bytes` from the header.
        used_bytes: u32,
        /// `record_count` from the header.
        record_count: u32,
        /// The fixed page size.
        page_size: usize,
    },
    /// A slot points outside the record heap.
    CorruptSlot {
        /// Index of the offending slot.
        slot: u32,
        /// Heap offset stored in the slot.
        offset: u32,
        /// Record length stored in the slot.
        length: u32,
    },
    /// A record's serialized bytes do not decode cleanly.
    CorruptRecord {
        /// Index of the slot whose record failed to decode.
        slot: u32,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::CorruptHeader {
                used_bytes,
                record_count,
                page_size,
            } => write!(
                f,
                "corrupt page header: used_bytes={} record_count={} exceeds page size {}",
                used_bytes, record_count, page_size
            ),
            PageError::CorruptSlot {
                slot,
                offset,
                length,
            } => write!(
                f,
                "corrupt slot {}: offset={} length={} points outside the record heap",
                slot, offset, length
            ),
            PageError::CorruptRecord { slot, reason } => {
                write!(f, "corrupt record in slot {}: {}", slot, reason)
            }
        }
    }
}

impl std::error::Error for PageError {}

//! Slotted page codec for variable-length records.
//!
//! This module provides the on-disk page format used by every table file in
//! the engine:
//!
//! - [`Page`]: fixed-size byte buffer with a slot directory
//! - [`Record`]: a row of string fields with compact serialization
//!
//! All multi-byte header and slot values are little-endian, so `.dat` files
//! are portable across hosts.

mod error;
mod record;
mod slotted;

pub use error::PageError;
pub use record::Record;
pub use slotted::{Page, RecordIter, DEFAULT_PAGE_SIZE, PAGE_HEADER_SIZE, SLOT_SIZE};

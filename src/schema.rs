//! TPC-H schema registry and join-key extraction.
//!
//! The engine stores records as untyped string fields; this module supplies
//! the typing. A [`TableTag`] names one of the eight TPC-H tables, the
//! registry maps it to an ordered field list, and a [`Relation`] is the
//! runtime descriptor executors consult to locate fields and extract
//! integer join keys. Relations compose under joins — the descriptor of a
//! join result is the concatenation of its inputs' descriptors — which is
//! what lets multi-table plans resolve fields on intermediate files that
//! have no tag of their own.

mod error;
mod registry;
mod relation;

pub use error::SchemaError;
pub use registry::{fields, FieldDesc, FieldKind, TableTag};
pub use relation::{extract_int_key, parse_line, Relation};

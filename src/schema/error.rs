//! Error types for the schema registry.

use std::fmt;

use super::registry::FieldKind;

/// Errors from schema lookups and key extraction.
#[derive(Debug)]
pub enum SchemaError {
    /// The table tag is not one of the recognized TPC-H tables.
    UnknownTable(String),
    /// The named field is not declared by the relation.
    UnknownField {
        /// The field name that failed to resolve.
        field: String,
    },
    /// A parsed line's field count does not match the schema.
    FieldCount {
        /// Declared number of fields.
        expected: usize,
        /// Number of fields found on the line.
        actual: usize,
    },
    /// A join key was requested on a field not declared integral.
    NotIntegral {
        /// The field name.
        field: String,
        /// The field's declared kind.
        kind: FieldKind,
    },
    /// A declared-integer field holds text that does not parse.
    KeyParse {
        /// The field name.
        field: String,
        /// The offending text.
        value: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownTable(tag) => write!(f, "unknown table tag: {}", tag),
            SchemaError::UnknownField { field } => {
                write!(f, "field '{}' is not declared by the relation", field)
            }
            SchemaError::FieldCount { expected, actual } => {
                write!(f, "expected {} fields, line has {}", expected, actual)
            }
            SchemaError::NotIntegral { field, kind } => {
                write!(f, "field '{}' has kind {:?}, not int", field, kind)
            }
            SchemaError::KeyParse { field, value } => {
                write!(f, "field '{}' value '{}' is not an integer", field, value)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

//! Error types for external sorting.

use std::fmt;

use crate::io::IoError;
use crate::schema::SchemaError;

/// Errors from the external sorter.
#[derive(Debug)]
pub enum SortError {
    /// Page or file I/O failed.
    Io(IoError),
    /// The sort key is not usable for the relation (unknown field or not
    /// declared integral). Detected up front, before any file is touched.
    Schema(SchemaError),
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Io(e) => write!(f, "{}", e),
            SortError::Schema(e) => write!(f, "invalid sort key: {}", e),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortError::Io(e) => Some(e),
            SortError::Schema(e) => Some(e),
        }
    }
}

impl From<IoError> for SortError {
    fn from(e: IoError) -> Self {
        SortError::Io(e)
    }
}

impl From<SchemaError> for SortError {
    fn from(e: SchemaError) -> Self {
        SortError::Schema(e)
    }
}

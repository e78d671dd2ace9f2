//! Error types for the block I/O layer.

use std::fmt;
use std::path::PathBuf;

use crate::page::PageError;

/// Errors from table file I/O.
#[derive(Debug)]
pub enum IoError {
    /// A table file could not be opened or created.
    Open {
        /// The file that failed to open.
        path: PathBuf,
        /// The underlying OS error.
        source: std::io::Error,
    },
    /// A read, write, seek, or delete failed mid-operation.
    Io(std::io::Error),
    /// A page read from disk failed validation or decoding.
    CorruptPage(PageError),
    /// A single record exceeds what an empty page can hold.
    RecordTooLarge {
        /// Serialized size of the record.
        bytes: usize,
        /// Capacity of an empty page.
        capacity: usize,
    },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Open { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            IoError::Io(e) => write!(f, "I/O error: {}", e),
            IoError::CorruptPage(e) => write!(f, "corrupt page: {}", e),
            IoError::RecordTooLarge { bytes, capacity } => write!(
                f,
                "record of {} serialized bytes exceeds page capacity of {} bytes",
                bytes, capacity
            ),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::Open { source, .. } => Some(source),
            IoError::Io(e) => Some(e),
            IoError::CorruptPage(e) => Some(e),
            IoError::RecordTooLarge { .. } => None,
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e)
    }
}

impl From<PageError> for IoError {
    fn from(e: PageError) -> Self {
        IoError::CorruptPage(e)
    }
}

//! Sequential table file reader.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::page::Page;
use crate::stats::Statistics;

use super::error::IoError;

/// Sequential page reader over a table file.
///
/// The file handle is acquired at construction and released on drop, so it
/// survives every exit path through an executor. Reads advance through the
/// file one page at a time; [`reset`](Self::reset) rewinds to the first page
/// for algorithms that rescan (BNLJ rescans the inner table once per outer
/// block).
pub struct TableReader<'a> {
    path: PathBuf,
    file: File,
    page_size: usize,
    stats: &'a Statistics,
}

impl<'a> TableReader<'a> {
    /// Opens a table file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Open`] if the file cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        page_size: usize,
        stats: &'a Statistics,
    ) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| IoError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            file,
            page_size,
            stats,
        })
    }

    /// Returns the path this reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size this reader transfers per call.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reads the next page of the file into `page`.
    ///
    /// Returns `Ok(false)` at end of file. On success the page's header has
    /// been validated; the header's `used_bytes` is authoritative for how
    /// much of the page is live, independent of how many bytes the transfer
    /// moved.
    ///
    /// # Panics
    ///
    /// Panics if `page` was not allocated with this reader's page size.
    pub fn read_block(&mut self, page: &mut Page) -> Result<bool, IoError> {
        assert_eq!(
            page.page_size(),
            self.page_size,
            "page/reader size mismatch"
        );

        page.clear();
        let buf = page.buffer_mut();
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(false);
        }

        page.validate_header()?;
        self.stats.record_block_read();
        Ok(true)
    }

    /// Repositions the reader to the first page.
    pub fn reset(&mut self) -> Result<(), IoError> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

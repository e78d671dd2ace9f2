//! Sequential table file writer.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::page::{Page, Record};
use crate::stats::Statistics;

use super::error::IoError;

/// Sequential page writer into a truncated table file.
///
/// Pages are written whole, so the output file size is always a multiple of
/// the page size; the final page's header `used_bytes` marks where live data
/// ends and trailing padding begins.
pub struct TableWriter<'a> {
    path: PathBuf,
    file: File,
    stats: &'a Statistics,
}

impl<'a> TableWriter<'a> {
    /// Creates (or truncates) a table file for writing.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Open`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>, stats: &'a Statistics) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| IoError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file, stats })
    }

    /// Returns the path this writer was created on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `page` to the file.
    ///
    /// Empty pages are silently refused with `Ok(false)`, so flushing at end
    /// of stream never emits a trailing empty page.
    pub fn write_block(&mut self, page: &Page) -> Result<bool, IoError> {
        if page.is_empty() {
            return Ok(false);
        }
        self.file.write_all(page.buffer())?;
        self.stats.record_block_write();
        Ok(true)
    }
}

/// A [`TableWriter`] paired with a working page.
///
/// Implements the protocol every producer of `.dat` files follows: append to
/// the working page; when the page refuses, flush it, clear it, and retry
/// once. A second refusal means the record cannot fit in any page and is
/// fatal.
pub struct PagedWriter<'a> {
    writer: TableWriter<'a>,
    page: Page,
}

impl<'a> PagedWriter<'a> {
    /// Wraps `writer` with a fresh working page of `page_size` bytes.
    pub fn new(writer: TableWriter<'a>, page_size: usize) -> Self {
        Self {
            writer,
            page: Page::new(page_size),
        }
    }

    /// Appends a record, flushing the working page when it fills.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::RecordTooLarge`] if the record does not fit even
    /// in an empty page.
    pub fn push(&mut self, record: &Record) -> Result<(), IoError> {
        if self.page.append(record) {
            return Ok(());
        }

        self.writer.write_block(&self.page)?;
        self.page.clear();

        if self.page.append(record) {
            Ok(())
        } else {
            Err(IoError::RecordTooLarge {
                bytes: record.serialized_size(),
                capacity: self.page.max_record_size(),
            })
        }
    }

    /// Flushes the final partial page, if any, and closes the writer.
    pub fn finish(mut self) -> Result<(), IoError> {
        self.writer.write_block(&self.page)?;
        Ok(())
    }
}

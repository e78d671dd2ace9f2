//! Record-at-a-time table scanning.

use crate::page::{Page, Record};

use super::error::IoError;
use super::reader::TableReader;

/// Streams records from a table file one at a time.
///
/// Owns a single working page; when the current page's records are
/// exhausted, the next page is read and iteration continues, so callers
/// never see page boundaries. This is the access pattern the sort merge
/// phases and the merge join use to advance one side independently of the
/// other.
pub struct TableScanner<'a> {
    reader: TableReader<'a>,
    page: Page,
    slot: u32,
}

impl<'a> TableScanner<'a> {
    /// Wraps a reader in a scanner with its own working page.
    pub fn new(reader: TableReader<'a>) -> Self {
        let page = Page::new(reader.page_size());
        Self {
            reader,
            page,
            slot: 0,
        }
    }

    /// Returns the next record, or `None` when the file is exhausted.
    pub fn next_record(&mut self) -> Result<Option<Record>, IoError> {
        loop {
            if let Some(item) = self.page.record_at(self.slot) {
                self.slot += 1;
                return Ok(Some(item?));
            }
            if !self.reader.read_block(&mut self.page)? {
                return Ok(None);
            }
            self.slot = 0;
        }
    }
}

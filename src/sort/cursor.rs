//! Key-aware record cursor.

use tracing::warn;

use crate::io::{IoError, TableReader, TableScanner};
use crate::page::Record;
use crate::schema::Relation;

/// A [`TableScanner`] that keeps the current record decoded alongside its
/// extracted integer key.
///
/// Both the pairwise run merge and the merge join walk two inputs this way:
/// peek at each side's current key, consume the smaller, advance that side.
/// Records whose key fails to extract are logged and skipped during
/// advancement, so `current` always holds a keyed record or nothing.
pub struct KeyedScanner<'a> {
    scanner: TableScanner<'a>,
    relation: &'a Relation,
    key: &'a str,
    current: Option<(i64, Record)>,
}

impl<'a> KeyedScanner<'a> {
    /// Wraps a reader and positions the cursor on the first keyed record.
    ///
    /// The caller is expected to have validated that `key` names an integral
    /// field of `relation`; per-record extraction failures are skipped here.
    pub fn new(
        reader: TableReader<'a>,
        relation: &'a Relation,
        key: &'a str,
    ) -> Result<Self, IoError> {
        let mut cursor = Self {
            scanner: TableScanner::new(reader),
            relation,
            key,
            current: None,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// Returns the current key and record, or `None` past end of input.
    pub fn current(&self) -> Option<(i64, &Record)> {
        self.current.as_ref().map(|(k, r)| (*k, r))
    }

    /// Takes the current record, leaving the cursor empty until the next
    /// [`advance`](Self::advance).
    pub fn take(&mut self) -> Option<(i64, Record)> {
        self.current.take()
    }

    /// Moves to the next record whose key extracts cleanly.
    pub fn advance(&mut self) -> Result<(), IoError> {
        loop {
            match self.scanner.next_record()? {
                Some(record) => match self.relation.int_key(&record, self.key) {
                    Ok(key) => {
                        self.current = Some((key, record));
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping record with unusable key");
                    }
                },
                None => {
                    self.current = None;
                    return Ok(());
                }
            }
        }
    }
}

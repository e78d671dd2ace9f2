//! Sort-merge join.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::io::{suffixed_path, IoError, PagedWriter, TableReader, TableWriter};
use crate::page::Record;
use crate::schema::{Relation, TableTag};
use crate::sort::{ExternalSorter, KeyedScanner};
use crate::stats::Statistics;

use super::bnlj::resolve_int_key;
use super::error::JoinError;

/// Sort-merge equi-join.
///
/// Both inputs are externally sorted by the join key into
/// `<output>.sorted_outer` and `<output>.sorted_inner`, then merged in a
/// single forward pass. Output rows are ordered by ascending join key,
/// outer-side order first within a key group.
///
/// The sorted temp files are deleted on success and left in place on a
/// fatal error for diagnosis.
pub struct SortMergeJoin {
    outer_table: PathBuf,
    inner_table: PathBuf,
    output: PathBuf,
    outer: Relation,
    inner: Relation,
    join_key: String,
    buffer_size: usize,
    page_size: usize,
}

impl SortMergeJoin {
    /// Configures a sort-merge join between two tagged tables.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Schema`] if `join_key` is not a declared
    /// integral field of both tables.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        outer_table: impl Into<PathBuf>,
        inner_table: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        outer_tag: TableTag,
        inner_tag: TableTag,
        join_key: &str,
        buffer_size: usize,
        page_size: usize,
    ) -> Result<Self, JoinError> {
        let outer = Relation::from_tag(outer_tag);
        let inner = Relation::from_tag(inner_tag);
        resolve_int_key(&outer, join_key)?;
        resolve_int_key(&inner, join_key)?;

        Ok(Self {
            outer_table: outer_table.into(),
            inner_table: inner_table.into(),
            output: output.into(),
            outer,
            inner,
            join_key: join_key.to_string(),
            buffer_size,
            page_size,
        })
    }

    /// Runs the join, writing merged records to the output file.
    pub fn execute(&self, stats: &Statistics) -> Result<(), JoinError> {
        let start = Instant::now();

        let sorted_outer = suffixed_path(&self.output, ".sorted_outer");
        let sorted_inner = suffixed_path(&self.output, ".sorted_inner");

        ExternalSorter::new(
            &self.outer,
            &self.join_key,
            self.buffer_size,
            self.page_size,
            stats,
        )?
        .sort(&self.outer_table, &sorted_outer)?;

        ExternalSorter::new(
            &self.inner,
            &self.join_key,
            self.buffer_size,
            self.page_size,
            stats,
        )?
        .sort(&self.inner_table, &sorted_inner)?;

        self.merge_join(&sorted_outer, &sorted_inner, stats)?;

        fs::remove_file(&sorted_outer).map_err(IoError::from)?;
        fs::remove_file(&sorted_inner).map_err(IoError::from)?;

        stats.set_elapsed_seconds(start.elapsed().as_secs_f64());
        stats.set_memory_usage((self.buffer_size * self.page_size) as u64);
        Ok(())
    }

    /// Single-pass merge over the two sorted files.
    fn merge_join(
        &self,
        sorted_outer: &std::path::Path,
        sorted_inner: &std::path::Path,
        stats: &Statistics,
    ) -> Result<(), JoinError> {
        info!("merging sorted inputs");

        let mut outer = KeyedScanner::new(
            TableReader::open(sorted_outer, self.page_size, stats)?,
            &self.outer,
            &self.join_key,
        )?;
        let mut inner = KeyedScanner::new(
            TableReader::open(sorted_inner, self.page_size, stats)?,
            &self.inner,
            &self.join_key,
        )?;

        let writer = TableWriter::create(&self.output, stats)?;
        let mut output = PagedWriter::new(writer, self.page_size);

        loop {
            let (outer_key, inner_key) = match (outer.current(), inner.current()) {
                (Some((ok, _)), Some((ik, _))) => (ok, ik),
                _ => break,
            };

            if outer_key < inner_key {
                outer.advance()?;
            } else if outer_key > inner_key {
                inner.advance()?;
            } else {
                // Collect the full inner group for this key, then join every
                // outer record in the group against it.
                let key = inner_key;
                let mut group: Vec<Record> = Vec::new();
                while let Some((k, _)) = inner.current() {
                    if k != key {
                        break;
                    }
                    if let Some((_, record)) = inner.take() {
                        group.push(record);
                    }
                    inner.advance()?;
                }

                while let Some((k, _)) = outer.current() {
                    if k != key {
                        break;
                    }
                    if let Some((_, outer_record)) = outer.take() {
                        for inner_record in &group {
                            output.push(&outer_record.concat(inner_record))?;
                            stats.record_output();
                        }
                    }
                    outer.advance()?;
                }
            }
        }

        output.finish()?;
        Ok(())
    }
}

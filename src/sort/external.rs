//! Two-phase external sort.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::io::{suffixed_path, IoError, PagedWriter, TableReader, TableWriter};
use crate::page::Page;
use crate::schema::{FieldKind, Relation, SchemaError};
use crate::stats::Statistics;

use super::cursor::KeyedScanner;
use super::error::SortError;

/// Sorts a table file by an integer key using bounded memory.
///
/// Phase one reads up to `buffer_size` pages at a time, sorts their records
/// stably by key, and writes each batch as a run. Phase two merges runs
/// pairwise, round by round, with the earlier-generated run always the left
/// operand of its pair; ties prefer the left side, so the overall sort is
/// stable.
pub struct ExternalSorter<'a> {
    relation: &'a Relation,
    key: &'a str,
    buffer_size: usize,
    page_size: usize,
    stats: &'a Statistics,
}

impl<'a> ExternalSorter<'a> {
    /// Creates a sorter for the given relation and key.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::Schema`] if `key` is not a declared integral
    /// field of `relation`.
    pub fn new(
        relation: &'a Relation,
        key: &'a str,
        buffer_size: usize,
        page_size: usize,
        stats: &'a Statistics,
    ) -> Result<Self, SortError> {
        // Validate the key once so per-record failures during the sort can
        // only be value-level (unparseable text), which are skipped.
        let index = relation.field_index(key)?;
        if relation.field_kind(index) != FieldKind::Int {
            return Err(SchemaError::NotIntegral {
                field: key.to_string(),
                kind: relation.field_kind(index),
            }
            .into());
        }

        Ok(Self {
            relation,
            key,
            buffer_size,
            page_size,
            stats,
        })
    }

    /// Sorts `input` into `output`.
    ///
    /// `output` must not collide with `input`; intermediate runs are placed
    /// next to `output` and removed as they are consumed.
    pub fn sort(&self, input: &Path, output: &Path) -> Result<(), SortError> {
        info!(input = %input.display(), output = %output.display(), key = self.key, "sorting");

        let runs = self.generate_runs(input, output)?;
        info!(runs = runs.len(), "run generation complete");

        self.merge_runs(runs, output)?;
        Ok(())
    }

    /// Phase one: produce sorted runs of up to `buffer_size` pages each.
    fn generate_runs(&self, input: &Path, output: &Path) -> Result<Vec<PathBuf>, SortError> {
        let mut reader = TableReader::open(input, self.page_size, self.stats)?;
        let mut page = Page::new(self.page_size);
        let mut runs = Vec::new();
        let mut exhausted = false;

        while !exhausted {
            let mut batch: Vec<(i64, crate::page::Record)> = Vec::new();

            for _ in 0..self.buffer_size {
                if !reader.read_block(&mut page)? {
                    exhausted = true;
                    break;
                }
                for record in page.records() {
                    let record = record.map_err(IoError::from)?;
                    match self.relation.int_key(&record, self.key) {
                        Ok(key) => batch.push((key, record)),
                        Err(e) => warn!(error = %e, "skipping record with unusable key"),
                    }
                }
            }

            if batch.is_empty() {
                continue;
            }

            // Stable, so equal keys keep their input order within the run.
            batch.sort_by_key(|(key, _)| *key);

            let run_path = suffixed_path(output, &format!(".run{}", runs.len()));
            let writer = TableWriter::create(&run_path, self.stats)?;
            let mut paged = PagedWriter::new(writer, self.page_size);
            for (_, record) in &batch {
                paged.push(record)?;
            }
            paged.finish()?;

            debug!(run = %run_path.display(), records = batch.len(), "wrote run");
            runs.push(run_path);
        }

        Ok(runs)
    }

    /// Phase two: merge runs pairwise until a single sorted file remains.
    ///
    /// Runs are merged round by round in generation order, the earlier run
    /// of each pair on the left, so records with equal keys keep their
    /// input order all the way to the final file. An odd leftover run moves
    /// to the end of the next round.
    fn merge_runs(&self, runs: Vec<PathBuf>, output: &Path) -> Result<(), SortError> {
        if runs.is_empty() {
            // Empty input sorts to an empty output file.
            fs::File::create(output).map_err(|source| IoError::Open {
                path: output.to_path_buf(),
                source,
            })?;
            return Ok(());
        }

        let mut seq = runs.len();
        let mut round = runs;

        while round.len() > 1 {
            let mut next = Vec::with_capacity(round.len().div_ceil(2));
            for pair in round.chunks(2) {
                let [left, right] = pair else {
                    // Odd leftover; carried to the end of the next round.
                    next.push(pair[0].clone());
                    continue;
                };

                let merged = suffixed_path(output, &format!(".merged{}", seq));
                seq += 1;

                debug!(
                    left = %left.display(),
                    right = %right.display(),
                    into = %merged.display(),
                    "merging runs"
                );
                self.merge_pair(left, right, &merged)?;

                fs::remove_file(left).map_err(IoError::from)?;
                fs::remove_file(right).map_err(IoError::from)?;
                next.push(merged);
            }
            round = next;
        }

        if let Some(last) = round.pop() {
            fs::rename(&last, output).map_err(IoError::from)?;
        }
        Ok(())
    }

    /// Merges two sorted runs into one, preferring the left side on ties.
    fn merge_pair(&self, left: &Path, right: &Path, output: &Path) -> Result<(), SortError> {
        let mut lhs = KeyedScanner::new(
            TableReader::open(left, self.page_size, self.stats)?,
            self.relation,
            self.key,
        )?;
        let mut rhs = KeyedScanner::new(
            TableReader::open(right, self.page_size, self.stats)?,
            self.relation,
            self.key,
        )?;

        let writer = TableWriter::create(output, self.stats)?;
        let mut paged = PagedWriter::new(writer, self.page_size);

        loop {
            let side = match (lhs.current(), rhs.current()) {
                (Some((lk, _)), Some((rk, _))) if lk <= rk => &mut lhs,
                (Some(_), Some(_)) => &mut rhs,
                (Some(_), None) => &mut lhs,
                (None, Some(_)) => &mut rhs,
                (None, None) => break,
            };

            if let Some((_, record)) = side.take() {
                paged.push(&record)?;
            }
            side.advance()?;
        }

        paged.finish()?;
        Ok(())
    }
}

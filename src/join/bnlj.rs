//! Block nested loops join.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::buffer::BufferPool;
use crate::io::{PagedWriter, TableReader, TableWriter};
use crate::page::Record;
use crate::schema::{FieldKind, Relation, SchemaError, TableTag};
use crate::stats::Statistics;

use super::error::JoinError;

/// Block nested loops equi-join.
///
/// Allocates a pool of M pages: the first M−1 hold a block of outer pages,
/// the last is the inner scan page. Each outer block is decoded into memory,
/// then the inner file is rescanned from the start and every outer/inner
/// pair with equal join keys is emitted as `outer fields ‖ inner fields`.
///
/// Cost: the outer file is read once; the inner file is read
/// `⌈outer_pages / (M−1)⌉` times.
pub struct BlockNestedLoopsJoin {
    outer_table: PathBuf,
    inner_table: PathBuf,
    output: PathBuf,
    outer: Relation,
    inner: Relation,
    outer_key: usize,
    inner_key: usize,
    buffer_size: usize,
    page_size: usize,
}

impl BlockNestedLoopsJoin {
    /// Configures a BNLJ between two tagged tables on the named key.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::BufferTooSmall`] if `buffer_size < 2`, and
    /// [`JoinError::Schema`] if `join_key` is not a declared integral field
    /// of both tables.
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
        let outer_key = resolve_int_key(&outer, join_key)?;
        let inner_key = resolve_int_key(&inner, join_key)?;

        Self::with_key_indices(
            outer_table,
            inner_table,
            output,
            outer,
            inner,
            outer_key,
            inner_key,
            buffer_size,
            page_size,
        )
    }

    /// Configures a BNLJ with pre-resolved key positions.
    ///
    /// Multi-table plans use this form: intermediate relations carry
    /// duplicate field names, so keys are addressed by position.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn with_key_indices(
        outer_table: impl Into<PathBuf>,
        inner_table: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        outer: Relation,
        inner: Relation,
        outer_key: usize,
        inner_key: usize,
        buffer_size: usize,
        page_size: usize,
    ) -> Result<Self, JoinError> {
        if buffer_size < 2 {
            return Err(JoinError::BufferTooSmall {
                actual: buffer_size,
            });
        }

        Ok(Self {
            outer_table: outer_table.into(),
            inner_table: inner_table.into(),
            output: output.into(),
            outer,
            inner,
            outer_key,
            inner_key,
            buffer_size,
            page_size,
        })
    }

    /// Runs the join, writing merged records to the output file.
    pub fn execute(&self, stats: &Statistics) -> Result<(), JoinError> {
        let start = Instant::now();
        self.run(stats)?;
        stats.set_elapsed_seconds(start.elapsed().as_secs_f64());
        stats.set_memory_usage((self.buffer_size * self.page_size) as u64);
        Ok(())
    }

    fn run(&self, stats: &Statistics) -> Result<(), JoinError> {
        info!(
            outer = %self.outer_table.display(),
            inner = %self.inner_table.display(),
            buffer_pages = self.buffer_size,
            "block nested loops join"
        );

        let mut outer_reader = TableReader::open(&self.outer_table, self.page_size, stats)?;
        let mut inner_reader = TableReader::open(&self.inner_table, self.page_size, stats)?;
        let writer = TableWriter::create(&self.output, stats)?;
        let mut output = PagedWriter::new(writer, self.page_size);

        let mut pool = BufferPool::new(self.buffer_size, self.page_size);
        let window = self.buffer_size - 1;

        loop {
            // Fill the outer block window and decode it into memory.
            let mut outer_records: Vec<(i64, Record)> = Vec::new();
            let mut pages_loaded = 0;
            for i in 0..window {
                if !outer_reader.read_block(pool.page_mut(i)?)? {
                    break;
                }
                pages_loaded += 1;
                collect_keyed(pool.page(i)?, &self.outer, self.outer_key, &mut outer_records)?;
            }

            if pages_loaded == 0 {
                break;
            }
            if outer_records.is_empty() {
                // Every record in this window was skipped for an unusable
                // key; the outer scan itself goes on.
                continue;
            }

            // Rescan the inner file against this outer block.
            inner_reader.reset()?;
            loop {
                if !inner_reader.read_block(pool.page_mut(window)?)? {
                    break;
                }
                let mut inner_records: Vec<(i64, Record)> = Vec::new();
                collect_keyed(pool.page(window)?, &self.inner, self.inner_key, &mut inner_records)?;

                for (outer_key, outer_record) in &outer_records {
                    for (inner_key, inner_record) in &inner_records {
                        if outer_key == inner_key {
                            output.push(&outer_record.concat(inner_record))?;
                            stats.record_output();
                        }
                    }
                }
            }
        }

        output.finish()?;
        Ok(())
    }
}

/// Resolves `key` to a field position and checks it is declared integral.
pub(crate) fn resolve_int_key(relation: &Relation, key: &str) -> Result<usize, JoinError> {
    let index = relation.field_index(key)?;
    if relation.field_kind(index) != FieldKind::Int {
        return Err(SchemaError::NotIntegral {
            field: key.to_string(),
            kind: relation.field_kind(index),
        }
        .into());
    }
    Ok(index)
}

/// Decodes a page, extracting each record's key at `key_index`.
///
/// Records whose key does not extract are logged and skipped; a corrupt
/// page is fatal.
pub(crate) fn collect_keyed(
    page: &crate::page::Page,
    relation: &Relation,
    key_index: usize,
    out: &mut Vec<(i64, Record)>,
) -> Result<(), JoinError> {
    for record in page.records() {
        let record = record.map_err(crate::io::IoError::from)?;
        match relation.int_key_at(&record, key_index) {
            Ok(key) => out.push((key, record)),
            Err(e) => warn!(error = %e, "skipping record with unusable key"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TableScanner;
    use crate::schema::TableTag;
    use std::path::Path;
    use tempfile::tempdir;

    const PAGE_SIZE: usize = 256;

    fn part_record(key: &str) -> Record {
        Record::new(vec![
            key.to_string(),
            format!("Part {}", key),
            "Mfgr#1".to_string(),
            "Brand#11".to_string(),
            "STANDARD".to_string(),
            "7".to_string(),
            "JUMBO".to_string(),
            "901.00".to_string(),
            "c".to_string(),
        ])
    }

    fn write_part(path: &Path, keys: &[i64], stats: &Statistics) {
        let writer = TableWriter::create(path, stats).unwrap();
        let mut paged = PagedWriter::new(writer, PAGE_SIZE);
        for &k in keys {
            paged.push(&part_record(&k.to_string())).unwrap();
        }
        paged.finish().unwrap();
    }

    fn write_partsupp(path: &Path, keys: &[(i64, i64)], stats: &Statistics) {
        let writer = TableWriter::create(path, stats).unwrap();
        let mut paged = PagedWriter::new(writer, PAGE_SIZE);
        for &(partkey, suppkey) in keys {
            let record = Record::new(vec![
                partkey.to_string(),
                suppkey.to_string(),
                "100".to_string(),
                "9.99".to_string(),
                "c".to_string(),
            ]);
            paged.push(&record).unwrap();
        }
        paged.finish().unwrap();
    }

    fn read_all(path: &Path, stats: &Statistics) -> Vec<Record> {
        let reader = TableReader::open(path, PAGE_SIZE, stats).unwrap();
        let mut scanner = TableScanner::new(reader);
        let mut all = Vec::new();
        while let Some(record) = scanner.next_record().unwrap() {
            all.push(record);
        }
        all
    }

    #[test]
    fn test_join_matches_expected_pairs() {
        let dir = tempdir().unwrap();
        let outer = dir.path().join("part.dat");
        let inner = dir.path().join("partsupp.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        write_part(&outer, &(1..=10).collect::<Vec<_>>(), &stats);
        let pairs: Vec<(i64, i64)> = (1..=10).flat_map(|p| (1..=2).map(move |s| (p, s))).collect();
        write_partsupp(&inner, &pairs, &stats);

        let join = BlockNestedLoopsJoin::new(
            &outer,
            &inner,
            &output,
            TableTag::Part,
            TableTag::PartSupp,
            "partkey",
            3,
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        let rows = read_all(&output, &stats);
        assert_eq!(rows.len(), 20);
        assert_eq!(stats.output_records(), 20);
        for row in &rows {
            assert_eq!(row.field_count(), 14);
            // PART.partkey == PARTSUPP.partkey
            assert_eq!(row.field(0), row.field(9));
        }
    }

    #[test]
    fn test_empty_outer_produces_empty_output() {
        let dir = tempdir().unwrap();
        let outer = dir.path().join("part.dat");
        let inner = dir.path().join("partsupp.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        std::fs::File::create(&outer).unwrap();
        write_partsupp(&inner, &[(1, 1)], &stats);

        let join = BlockNestedLoopsJoin::new(
            &outer,
            &inner,
            &output,
            TableTag::Part,
            TableTag::PartSupp,
            "partkey",
            2,
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        assert_eq!(stats.output_records(), 0);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
    }

    #[test]
    fn test_unparseable_outer_keys_do_not_end_scan() {
        let dir = tempdir().unwrap();
        let outer = dir.path().join("part.dat");
        let inner = dir.path().join("partsupp.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        // Several full pages of records with unusable keys ahead of the
        // matching ones. With a one-page outer window, the first blocks
        // decode to nothing and must not end the outer scan.
        {
            let writer = TableWriter::create(&outer, &stats).unwrap();
            let mut paged = PagedWriter::new(writer, PAGE_SIZE);
            for i in 0..6 {
                paged.push(&part_record(&format!("bad-{}", i))).unwrap();
            }
            for k in 1..=2 {
                paged.push(&part_record(&k.to_string())).unwrap();
            }
            paged.finish().unwrap();
        }
        write_partsupp(&inner, &[(1, 1), (2, 1)], &stats);

        let join = BlockNestedLoopsJoin::new(
            &outer,
            &inner,
            &output,
            TableTag::Part,
            TableTag::PartSupp,
            "partkey",
            2,
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        assert_eq!(stats.output_records(), 2);
        let rows = read_all(&output, &stats);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.field(0), row.field(9));
        }
    }

    #[test]
    fn test_buffer_size_must_be_at_least_two() {
        let result = BlockNestedLoopsJoin::new(
            "a.dat",
            "b.dat",
            "out.dat",
            TableTag::Part,
            TableTag::PartSupp,
            "partkey",
            1,
            PAGE_SIZE,
        );
        assert!(matches!(
            result,
            Err(JoinError::BufferTooSmall { actual: 1 })
        ));
    }

    #[test]
    fn test_join_key_must_exist_on_both_sides() {
        let result = BlockNestedLoopsJoin::new(
            "a.dat",
            "b.dat",
            "out.dat",
            TableTag::Part,
            TableTag::PartSupp,
            "suppkey",
            4,
            PAGE_SIZE,
        );
        // PART has no suppkey.
        assert!(matches!(result, Err(JoinError::Schema(_))));
    }

    #[test]
    fn test_inner_rescan_counts_reads() {
        let dir = tempdir().unwrap();
        let outer = dir.path().join("part.dat");
        let inner = dir.path().join("partsupp.dat");
        let output = dir.path().join("out.dat");

        let setup_stats = Statistics::new();
        write_part(&outer, &(1..=40).collect::<Vec<_>>(), &setup_stats);
        let pairs: Vec<(i64, i64)> = (1..=40).map(|p| (p, 1)).collect();
        write_partsupp(&inner, &pairs, &setup_stats);

        let outer_pages = std::fs::metadata(&outer).unwrap().len() as usize / PAGE_SIZE;
        let inner_pages = std::fs::metadata(&inner).unwrap().len() as usize / PAGE_SIZE;
        assert!(outer_pages > 2, "test needs a multi-block outer table");

        let stats = Statistics::new();
        let buffer_size = 3;
        let join = BlockNestedLoopsJoin::new(
            &outer,
            &inner,
            &output,
            TableTag::Part,
            TableTag::PartSupp,
            "partkey",
            buffer_size,
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        let blocks = outer_pages.div_ceil(buffer_size - 1);
        let expected_reads = (outer_pages + blocks * inner_pages) as u64;
        assert!(stats.block_reads() >= expected_reads);
    }
}

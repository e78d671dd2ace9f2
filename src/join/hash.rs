//! In-memory hash join.

use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::io::{PagedWriter, TableReader, TableWriter};
use crate::page::{Page, Record};
use crate::schema::{Relation, TableTag};
use crate::stats::Statistics;

use super::bnlj::resolve_int_key;
use super::error::JoinError;

/// Hash equi-join with an in-memory build side.
///
/// The build file is streamed once into a `key → bucket` table preserving
/// insertion order within each bucket, then the probe file is streamed and
/// each match is emitted as `build fields ‖ probe fields`. Both inputs are
/// read exactly once.
///
/// The entire build side must fit in memory; for one-to-many joins put the
/// one-side here. If it does not fit, the allocator aborts the process —
/// there is no graceful fallback within this executor, the caller chooses
/// a different algorithm instead.
pub struct HashJoin {
    build_table: PathBuf,
    probe_table: PathBuf,
    output: PathBuf,
    build: Relation,
    probe: Relation,
    build_key: usize,
    probe_key: usize,
    page_size: usize,
}

impl HashJoin {
    /// Configures a hash join between two tagged tables on the named key.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Schema`] if `join_key` is not a declared
    /// integral field of both tables.
    pub fn new(
        build_table: impl Into<PathBuf>,
        probe_table: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        build_tag: TableTag,
        probe_tag: TableTag,
        join_key: &str,
        page_size: usize,
    ) -> Result<Self, JoinError> {
        let build = Relation::from_tag(build_tag);
        let probe = Relation::from_tag(probe_tag);
        let build_key = resolve_int_key(&build, join_key)?;
        let probe_key = resolve_int_key(&probe, join_key)?;

        Ok(Self {
            build_table: build_table.into(),
            probe_table: probe_table.into(),
            output: output.into(),
            build,
            probe,
            build_key,
            probe_key,
            page_size,
        })
    }

    /// Runs the join, writing merged records to the output file.
    pub fn execute(&self, stats: &Statistics) -> Result<(), JoinError> {
        let start = Instant::now();

        let table = self.build_phase(stats)?;
        self.probe_phase(&table, stats)?;

        stats.set_elapsed_seconds(start.elapsed().as_secs_f64());
        // Heuristic only: per-bucket map overhead plus the two working pages.
        let bucket_overhead = mem::size_of::<i64>() + mem::size_of::<Vec<Record>>();
        stats.set_memory_usage((table.len() * bucket_overhead + 2 * self.page_size) as u64);
        Ok(())
    }

    /// Streams the build file into the hash table.
    fn build_phase(&self, stats: &Statistics) -> Result<HashMap<i64, Vec<Record>>, JoinError> {
        info!(build = %self.build_table.display(), "building hash table");

        let mut reader = TableReader::open(&self.build_table, self.page_size, stats)?;
        let mut page = Page::new(self.page_size);
        let mut table: HashMap<i64, Vec<Record>> = HashMap::new();
        let mut loaded = 0u64;

        while reader.read_block(&mut page)? {
            for record in page.records() {
                let record = record.map_err(crate::io::IoError::from)?;
                match self.build.int_key_at(&record, self.build_key) {
                    Ok(key) => {
                        table.entry(key).or_default().push(record);
                        loaded += 1;
                    }
                    Err(e) => warn!(error = %e, "skipping build record with unusable key"),
                }
            }
        }

        info!(records = loaded, keys = table.len(), "hash table built");
        Ok(table)
    }

    /// Streams the probe file, emitting every bucket match.
    fn probe_phase(
        &self,
        table: &HashMap<i64, Vec<Record>>,
        stats: &Statistics,
    ) -> Result<(), JoinError> {
        info!(probe = %self.probe_table.display(), "probing");

        let mut reader = TableReader::open(&self.probe_table, self.page_size, stats)?;
        let writer = TableWriter::create(&self.output, stats)?;
        let mut output = PagedWriter::new(writer, self.page_size);
        let mut page = Page::new(self.page_size);

        while reader.read_block(&mut page)? {
            for record in page.records() {
                let probe_record = record.map_err(crate::io::IoError::from)?;
                let key = match self.probe.int_key_at(&probe_record, self.probe_key) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!(error = %e, "skipping probe record with unusable key");
                        continue;
                    }
                };

                if let Some(bucket) = table.get(&key) {
                    for build_record in bucket {
                        output.push(&build_record.concat(&probe_record))?;
                        stats.record_output();
                    }
                }
            }
        }

        output.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TableScanner;
    use std::path::Path;
    use tempfile::tempdir;

    const PAGE_SIZE: usize = 256;

    fn write_nation(path: &Path, rows: &[(i64, i64)], stats: &Statistics) {
        let writer = TableWriter::create(path, stats).unwrap();
        let mut paged = PagedWriter::new(writer, PAGE_SIZE);
        for &(nationkey, regionkey) in rows {
            let record = Record::new(vec![
                nationkey.to_string(),
                format!("NATION {}", nationkey),
                regionkey.to_string(),
                "c".to_string(),
            ]);
            paged.push(&record).unwrap();
        }
        paged.finish().unwrap();
    }

    fn write_region(path: &Path, keys: &[i64], stats: &Statistics) {
        let writer = TableWriter::create(path, stats).unwrap();
        let mut paged = PagedWriter::new(writer, PAGE_SIZE);
        for &k in keys {
            let record = Record::new(vec![
                k.to_string(),
                format!("REGION {}", k),
                "c".to_string(),
            ]);
            paged.push(&record).unwrap();
        }
        paged.finish().unwrap();
    }

    #[test]
    fn test_hash_join_duplicates_preserved() {
        let dir = tempdir().unwrap();
        let build = dir.path().join("region.dat");
        let probe = dir.path().join("nation.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        write_region(&build, &[0, 1], &stats);
        // Five nations per region; region 2 has no match.
        let rows: Vec<(i64, i64)> = (0..15).map(|i| (i, i % 3)).collect();
        write_nation(&probe, &rows, &stats);

        let join = HashJoin::new(
            &build,
            &probe,
            &output,
            TableTag::Region,
            TableTag::Nation,
            "regionkey",
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        // 10 nations fall in regions 0 and 1.
        assert_eq!(stats.output_records(), 10);

        let reader = TableReader::open(&output, PAGE_SIZE, &stats).unwrap();
        let mut scanner = TableScanner::new(reader);
        let mut count = 0;
        while let Some(row) = scanner.next_record().unwrap() {
            // REGION fields (3) then NATION fields (4); keys agree.
            assert_eq!(row.field_count(), 7);
            assert_eq!(row.field(0), row.field(5));
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[test]
    fn test_build_side_on_left_of_output() {
        let dir = tempdir().unwrap();
        let build = dir.path().join("region.dat");
        let probe = dir.path().join("nation.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        write_region(&build, &[7], &stats);
        write_nation(&probe, &[(3, 7)], &stats);

        let join = HashJoin::new(
            &build,
            &probe,
            &output,
            TableTag::Region,
            TableTag::Nation,
            "regionkey",
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        let reader = TableReader::open(&output, PAGE_SIZE, &stats).unwrap();
        let mut scanner = TableScanner::new(reader);
        let row = scanner.next_record().unwrap().unwrap();
        assert_eq!(row.field(1), Some("REGION 7"));
        assert_eq!(row.field(4), Some("NATION 3"));
    }

    #[test]
    fn test_empty_build_side() {
        let dir = tempdir().unwrap();
        let build = dir.path().join("region.dat");
        let probe = dir.path().join("nation.dat");
        let output = dir.path().join("out.dat");
        let stats = Statistics::new();

        std::fs::File::create(&build).unwrap();
        write_nation(&probe, &[(0, 0)], &stats);

        let join = HashJoin::new(
            &build,
            &probe,
            &output,
            TableTag::Region,
            TableTag::Nation,
            "regionkey",
            PAGE_SIZE,
        )
        .unwrap();
        join.execute(&stats).unwrap();

        assert_eq!(stats.output_records(), 0);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
    }
}

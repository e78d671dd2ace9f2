//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use blockjoin::io::{TableReader, TableScanner};
use blockjoin::page::Record;
use blockjoin::stats::Statistics;

/// Generates `n` PART lines in `.tbl` format, partkey 1..=n.
pub fn part_lines(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| {
            format!(
                "{}|Part {}|Mfgr#1|Brand#11|T|{}|C|1000.5|c",
                i,
                i,
                (i % 50) + 1
            )
        })
        .collect()
}

/// Generates PARTSUPP lines: partkey 1..=parts crossed with
/// suppkey 1..=supps_per_part.
pub fn partsupp_lines(parts: usize, supps_per_part: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(parts * supps_per_part);
    for p in 1..=parts {
        for s in 1..=supps_per_part {
            lines.push(format!("{}|{}|{}|7.50|c", p, s, p * 10 + s));
        }
    }
    lines
}

/// Generates `n` SUPPLIER lines, suppkey 1..=n.
pub fn supplier_lines(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("{}|Supplier#{:09}|addr|{}|phone|500.00|c", i, i, i % 25))
        .collect()
}

/// Writes lines to a text file, one per line.
pub fn write_text(path: &Path, lines: &[String]) {
    let mut file = File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
}

/// Reads every record of a `.dat` file in file order.
pub fn read_records(path: &Path, page_size: usize) -> Vec<Record> {
    let stats = Statistics::new();
    let reader = TableReader::open(path, page_size, &stats).unwrap();
    let mut scanner = TableScanner::new(reader);
    let mut records = Vec::new();
    while let Some(record) = scanner.next_record().unwrap() {
        records.push(record);
    }
    records
}

/// Projects records to sorted field vectors for multiset comparison.
pub fn multiset(records: &[Record]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = records.iter().map(|r| r.fields().to_vec()).collect();
    rows.sort();
    rows
}

//! Text-to-page ingest.
//!
//! Converts a pipe-delimited text file (TPC-H `.tbl` format) into a paged
//! `.dat` table file. Lines that fail to parse are logged and skipped; a
//! record too large for an empty page aborts the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::io::{IoError, PagedWriter, TableWriter};
use crate::schema::{parse_line, TableTag};
use crate::stats::Statistics;

/// Converts `input` (pipe-delimited text) into the paged table file
/// `output`, returning the number of records written.
///
/// # Errors
///
/// Returns [`IoError::Open`] if either file cannot be opened,
/// [`IoError::RecordTooLarge`] if a parsed record exceeds the page payload,
/// and [`IoError::Io`] on any read or write failure. Malformed lines are not
/// errors; they are logged at `warn` and skipped.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    tag: TableTag,
    page_size: usize,
    stats: &Statistics,
) -> Result<u64, IoError> {
    let input = input.as_ref();
    let file = File::open(input).map_err(|source| IoError::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let writer = TableWriter::create(output.as_ref(), stats)?;
    let mut paged = PagedWriter::new(writer, page_size);

    let mut converted = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_line(tag, &line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed line");
                continue;
            }
        };

        paged.push(&record)?;
        converted += 1;
    }

    paged.finish()?;
    info!(
        records = converted,
        input = %input.display(),
        output = %output.as_ref().display(),
        "conversion complete"
    );
    Ok(converted)
}

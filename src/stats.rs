//! Execution statistics.
//!
//! A [`Statistics`] instance is owned by the caller and shared by reference
//! with every reader, writer, and executor participating in one operation.
//! The engine is single-threaded, so the counters use [`Cell`] for interior
//! mutability — a reader and a writer can both hold `&Statistics` without
//! borrow conflicts.

use std::cell::Cell;
use std::fmt;

/// Additive counters collected during conversion, sorting, and joins.
///
/// `block_reads` and `block_writes` are incremented by the I/O layer on every
/// successful page transfer. `output_records` is incremented by executors on
/// every emitted join result. `elapsed_seconds` and `memory_usage_bytes` are
/// set once by the executor around its top-level call.
#[derive(Debug, Default)]
pub struct Statistics {
    block_reads: Cell<u64>,
    block_writes: Cell<u64>,
    output_records: Cell<u64>,
    elapsed_seconds: Cell<f64>,
    memory_usage_bytes: Cell<u64>,
}

impl Statistics {
    /// Creates a statistics block with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful page read.
    pub fn record_block_read(&self) {
        self.block_reads.set(self.block_reads.get() + 1);
    }

    /// Records one successful page write.
    pub fn record_block_write(&self) {
        self.block_writes.set(self.block_writes.get() + 1);
    }

    /// Records one emitted output record.
    pub fn record_output(&self) {
        self.output_records.set(self.output_records.get() + 1);
    }

    /// Sets the wall-clock duration of the top-level operation.
    pub fn set_elapsed_seconds(&self, seconds: f64) {
        self.elapsed_seconds.set(seconds);
    }

    /// Sets the post-hoc memory estimate for the operation.
    pub fn set_memory_usage(&self, bytes: u64) {
        self.memory_usage_bytes.set(bytes);
    }

    pub fn block_reads(&self) -> u64 {
        self.block_reads.get()
    }

    pub fn block_writes(&self) -> u64 {
        self.block_writes.get()
    }

    pub fn output_records(&self) -> u64 {
        self.output_records.get()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds.get()
    }

    pub fn memory_usage_bytes(&self) -> u64 {
        self.memory_usage_bytes.get()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block Reads: {}", self.block_reads.get())?;
        writeln!(f, "Block Writes: {}", self.block_writes.get())?;
        writeln!(f, "Output Records: {}", self.output_records.get())?;
        writeln!(f, "Elapsed Time: {:.6} seconds", self.elapsed_seconds.get())?;
        write!(
            f,
            "Memory Usage: {} bytes ({:.2} MB)",
            self.memory_usage_bytes.get(),
            self.memory_usage_bytes.get() as f64 / 1024.0 / 1024.0
        )
    }
}

//! Command-line front-end for the blockjoin engine.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter;
use tracing_subscriber::prelude::*;

use blockjoin::ingest::convert;
use blockjoin::join::{
    BlockNestedLoopsJoin, HashJoin, JoinCondition, MultiTableJoin, SortMergeJoin,
};
use blockjoin::schema::TableTag;
use blockjoin::stats::Statistics;

/// blockjoin: equi-joins over paged TPC-H table files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group = ArgGroup::new("mode").required(true).args(
    ["convert", "join", "hash_join", "sort_merge_join", "multi_join", "compare_all"],
))]
struct Args {
    /// Convert a pipe-delimited text file into a paged .dat file
    #[arg(long)]
    convert: bool,

    /// Block nested loops join between two tables
    #[arg(long)]
    join: bool,

    /// Hash join with an in-memory build side
    #[arg(long)]
    hash_join: bool,

    /// External sort both inputs, then merge join
    #[arg(long)]
    sort_merge_join: bool,

    /// Left-deep join over three or more tables
    #[arg(long)]
    multi_join: bool,

    /// Run every algorithm over the same inputs and compare statistics
    #[arg(long)]
    compare_all: bool,

    /// Input text file (convert)
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Output .dat file (convert)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Table type of the converted file (PART, PARTSUPP, ...)
    #[arg(long)]
    table_type: Option<TableTag>,

    /// Outer table file (join, sort-merge-join, compare-all)
    #[arg(long)]
    outer_table: Option<PathBuf>,

    /// Inner table file (join, sort-merge-join, compare-all)
    #[arg(long)]
    inner_table: Option<PathBuf>,

    /// Outer table type
    #[arg(long)]
    outer_type: Option<TableTag>,

    /// Inner table type
    #[arg(long)]
    inner_type: Option<TableTag>,

    /// Build-side table file (hash-join)
    #[arg(long)]
    build_table: Option<PathBuf>,

    /// Probe-side table file (hash-join)
    #[arg(long)]
    probe_table: Option<PathBuf>,

    /// Build-side table type
    #[arg(long)]
    build_type: Option<TableTag>,

    /// Probe-side table type
    #[arg(long)]
    probe_type: Option<TableTag>,

    /// Join key field name, e.g. partkey
    #[arg(long)]
    join_key: Option<String>,

    /// Output file for join results
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output directory for compare-all result files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Comma-separated table files (multi-join)
    #[arg(long)]
    tables: Option<String>,

    /// Comma-separated table types (multi-join)
    #[arg(long)]
    table_types: Option<String>,

    /// Join conditions, e.g. "0.partkey=1.partkey;1.suppkey=2.suppkey"
    #[arg(long)]
    join_conditions: Option<String>,

    /// Number of buffer pages
    #[arg(long, default_value_t = 10)]
    buffer_size: usize,

    /// Page size in bytes
    #[arg(long, default_value_t = 4096)]
    block_size: usize,
}

fn require<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
    value
        .clone()
        .with_context(|| format!("--{} is required for this mode", name))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter_layer =
        filter::EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into());
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    if args.convert {
        run_convert(&args)
    } else if args.join {
        run_bnlj(&args)
    } else if args.hash_join {
        run_hash_join(&args)
    } else if args.sort_merge_join {
        run_sort_merge_join(&args)
    } else if args.multi_join {
        run_multi_join(&args)
    } else {
        run_compare_all(&args)
    }
}

fn run_convert(args: &Args) -> Result<()> {
    let stats = Statistics::new();
    let count = convert(
        require(&args.input_file, "input-file")?,
        require(&args.output_file, "output-file")?,
        require(&args.table_type, "table-type")?,
        args.block_size,
        &stats,
    )?;
    println!("Converted {} records", count);
    Ok(())
}

fn run_bnlj(args: &Args) -> Result<()> {
    let stats = Statistics::new();
    BlockNestedLoopsJoin::new(
        require(&args.outer_table, "outer-table")?,
        require(&args.inner_table, "inner-table")?,
        require(&args.output, "output")?,
        require(&args.outer_type, "outer-type")?,
        require(&args.inner_type, "inner-type")?,
        &require(&args.join_key, "join-key")?,
        args.buffer_size,
        args.block_size,
    )?
    .execute(&stats)?;

    println!("\n=== Join Statistics ===");
    println!("{}", stats);
    Ok(())
}

fn run_hash_join(args: &Args) -> Result<()> {
    let stats = Statistics::new();
    HashJoin::new(
        require(&args.build_table, "build-table")?,
        require(&args.probe_table, "probe-table")?,
        require(&args.output, "output")?,
        require(&args.build_type, "build-type")?,
        require(&args.probe_type, "probe-type")?,
        &require(&args.join_key, "join-key")?,
        args.block_size,
    )?
    .execute(&stats)?;

    println!("\n=== Hash Join Statistics ===");
    println!("{}", stats);
    Ok(())
}

fn run_sort_merge_join(args: &Args) -> Result<()> {
    let stats = Statistics::new();
    SortMergeJoin::new(
        require(&args.outer_table, "outer-table")?,
        require(&args.inner_table, "inner-table")?,
        require(&args.output, "output")?,
        require(&args.outer_type, "outer-type")?,
        require(&args.inner_type, "inner-type")?,
        &require(&args.join_key, "join-key")?,
        args.buffer_size,
        args.block_size,
    )?
    .execute(&stats)?;

    println!("\n=== Sort-Merge Join Statistics ===");
    println!("{}", stats);
    Ok(())
}

fn run_multi_join(args: &Args) -> Result<()> {
    let files: Vec<PathBuf> = require(&args.tables, "tables")?
        .split(',')
        .map(PathBuf::from)
        .collect();
    let types: Vec<TableTag> = require(&args.table_types, "table-types")?
        .split(',')
        .map(|t| t.trim().parse())
        .collect::<Result<_, _>>()?;
    if files.len() != types.len() {
        bail!(
            "--tables lists {} files but --table-types lists {} types",
            files.len(),
            types.len()
        );
    }

    let conditions = JoinCondition::parse_list(&require(&args.join_conditions, "join-conditions")?)?;
    let tables: Vec<(PathBuf, TableTag)> = files.into_iter().zip(types).collect();

    let stats = Statistics::new();
    MultiTableJoin::new(
        tables,
        conditions,
        require(&args.output, "output")?,
        args.buffer_size,
        args.block_size,
    )?
    .execute(&stats)?;

    println!("\n=== Multi-Table Join Statistics ===");
    println!("{}", stats);
    Ok(())
}

/// Runs BNLJ at several buffer sizes, hash join, and sort-merge join over
/// the same pair of tables, then prints a comparison.
fn run_compare_all(args: &Args) -> Result<()> {
    let outer_table = require(&args.outer_table, "outer-table")?;
    let inner_table = require(&args.inner_table, "inner-table")?;
    let outer_type = require(&args.outer_type, "outer-type")?;
    let inner_type = require(&args.inner_type, "inner-type")?;
    let join_key = require(&args.join_key, "join-key")?;
    let output_dir = require(&args.output_dir, "output-dir")?;
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut results: Vec<(String, Statistics)> = Vec::new();

    for buffer_size in [5, 10, 20] {
        let stats = Statistics::new();
        BlockNestedLoopsJoin::new(
            &outer_table,
            &inner_table,
            output_dir.join(format!("bnlj_buf{}.dat", buffer_size)),
            outer_type,
            inner_type,
            &join_key,
            buffer_size,
            args.block_size,
        )?
        .execute(&stats)?;
        results.push((format!("Block Nested Loops (buf={})", buffer_size), stats));
    }

    {
        let stats = Statistics::new();
        HashJoin::new(
            &outer_table,
            &inner_table,
            output_dir.join("hash_join.dat"),
            outer_type,
            inner_type,
            &join_key,
            args.block_size,
        )?
        .execute(&stats)?;
        results.push(("Hash Join".to_string(), stats));
    }

    {
        let stats = Statistics::new();
        SortMergeJoin::new(
            &outer_table,
            &inner_table,
            output_dir.join("sort_merge_join.dat"),
            outer_type,
            inner_type,
            &join_key,
            args.buffer_size,
            args.block_size,
        )?
        .execute(&stats)?;
        results.push(("Sort-Merge Join".to_string(), stats));
    }

    println!("\n========================================");
    println!("  Performance Comparison");
    println!("========================================");
    for (name, stats) in &results {
        println!("\n--- {} ---", name);
        println!("{}", stats);
    }

    let (baseline_name, baseline) = &results[0];
    println!("\n=== Speedup vs {} ===", baseline_name);
    for (name, stats) in &results[1..] {
        let speedup = if stats.elapsed_seconds() > 0.0 {
            baseline.elapsed_seconds() / stats.elapsed_seconds()
        } else {
            1.0
        };
        println!("{}: {:.2}x", name, speedup);
    }

    Ok(())
}

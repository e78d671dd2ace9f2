//! Equi-join executors.
//!
//! Three classical algorithms over paged table files, each with its own
//! memory/I/O trade-off:
//!
//! - [`BlockNestedLoopsJoin`]: M−1 outer pages buffered, inner file
//!   rescanned once per outer block. Works in fixed memory for any inputs.
//! - [`HashJoin`]: build side loaded into an in-memory hash table, probe
//!   side streamed. One pass over each input, but the build side must fit
//!   in memory.
//! - [`SortMergeJoin`]: both inputs externally sorted by the join key, then
//!   merged in one pass. Output is key-ordered.
//!
//! [`MultiTableJoin`] chains BNLJ steps into a left-deep plan over three or
//! more tables.
//!
//! All executors emit merged records (left fields then right fields) through
//! the same flush-and-retry output protocol, and update the caller's
//! [`Statistics`](crate::stats::Statistics) with reads, writes, emitted
//! records, wall-clock time, and a memory estimate.

mod bnlj;
mod error;
mod hash;
mod multi;
mod sort_merge;

pub use bnlj::BlockNestedLoopsJoin;
pub use error::JoinError;
pub use hash::HashJoin;
pub use multi::{JoinCondition, MultiTableJoin};
pub use sort_merge::SortMergeJoin;

//! External sorting of table files by integer key.
//!
//! Implements the classic two-phase approach:
//!
//! 1. **Run generation** — read up to M pages worth of records into memory,
//!    sort them stably by key, write a sorted run file.
//! 2. **Merge** — repeatedly merge runs pairwise until one file remains,
//!    then rename it to the target output.
//!
//! Temp files are named `<output>.run<n>` and `<output>.merged<n>`; they are
//! deleted as the merge consumes them and only survive a fatal error, where
//! they are useful for diagnosis.

mod cursor;
mod error;
mod external;

pub use cursor::KeyedScanner;
pub use error::SortError;
pub use external::ExternalSorter;

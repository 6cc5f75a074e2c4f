//! Partitions a multiset of numbers into groups whose sums match a list of targets,
//! exactly or within a decimal tolerance.
//!
//! The work is split in two searches: `SubsetSums` enumerates, per target, every
//! combination of candidates reaching it, and `CoverSearch` picks among those the
//! collections that use every candidate exactly once. Targets within tolerance
//! of zero are served beforehand by the greedy extractor in `zero`.

pub mod budget;
pub mod combinations;
pub mod error;
pub mod multiset;
pub mod partitioner;
pub mod problem;
pub mod search;
pub mod tolerance;
pub mod validate;
pub mod values;
pub mod zero;

pub use budget::Budget;
pub use combinations::{Combination, SubsetSums, checked_sum, normalize};
pub use error::{Error, Stage};
pub use multiset::Tally;
pub use partitioner::Partitioner;
pub use problem::{Prepared, Problem};
pub use search::{Cover, CoverSearch, Group, select};
pub use tolerance::Tolerance;
pub use validate::{Rejection, validate_cover};
pub use values::{check_balance, read_values, write_cover};
pub use zero::{extract_zero_sums, find_zero_sum, is_zero_target};

//! Zero and near-zero targets.
//!
//! A target `t` is served here when `|t| <= tolerance`; in the exact regime
//! that means `t == 0` only. `SubsetSums` cannot serve such a target: its
//! terminal case would already be met by the empty selection. These targets
//! are served instead, before the general enumeration, by an exhaustive search
//! over subsets of growing size. A group found for `t` sums to within the
//! tolerance of `t` itself, not of zero, and is tagged with `t`.
//!
//! The extraction is greedy. For every such target, in target order, the first
//! matching subset is taken out of the pool for good, and that choice is never
//! revisited. A different subset could leave a pool that the remaining targets
//! partition while the chosen one does not, so a solve may report no cover
//! although one exists.

use itertools::Itertools;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::budget::{Budget, Meter};
use crate::combinations::{Combination, checked_sum};
use crate::error::{Error, Stage};
use crate::tolerance::Tolerance;

/// True if `target` is served by the extractor rather than by `SubsetSums`.
pub fn is_zero_target(target: Decimal, tolerance: Tolerance) -> bool {
    tolerance.covers(target)
}

/// Returns the first subset of `pool` summing to `target` (up to the tolerance):
/// smallest size first, then in index order.
pub fn find_zero_sum(
    pool: &[Decimal],
    target: Decimal,
    tolerance: Tolerance,
    meter: &mut Meter,
) -> Result<Option<Vec<Decimal>>, Error> {
    for size in 1..=pool.len() {
        for subset in pool.iter().copied().combinations(size) {
            meter.tick()?;
            if checked_sum(&subset).is_some_and(|sum| tolerance.within(sum, target)) {
                return Ok(Some(subset));
            }
        }
    }
    Ok(None)
}

/// Takes one subset out of `pool` for each of `targets`, in order.
/// Stops at the first target for which nothing is found.
pub fn extract_zero_sums(
    pool: &mut Vec<Decimal>,
    targets: &[Decimal],
    tolerance: Tolerance,
    budget: &Budget,
) -> Result<Vec<Combination>, Error> {
    let mut meter = budget.meter(Stage::ZeroExtraction);
    let mut groups = Vec::with_capacity(targets.len());

    for &target in targets {
        debug_assert!(is_zero_target(target, tolerance));
        let Some(subset) = find_zero_sum(pool, target, tolerance, &mut meter)? else {
            warn!(
                "No subset left for zero target {} ({}/{})",
                target,
                groups.len() + 1,
                targets.len()
            );
            break;
        };

        info!("Found a group of {} values for {}: {:?}", subset.len(), target, subset);
        for v in &subset {
            if let Some(pos) = pool.iter().position(|p| p == v) {
                pool.remove(pos);
            }
        }
        groups.push(Combination {
            target,
            values: subset,
        });
    }

    debug!(
        "Zero extraction visited {} subsets, {} values left",
        meter.nodes(),
        pool.len()
    );
    Ok(groups)
}

//! Independent re-check of a proposed cover against the original lists.
//! Nothing computed by the search is trusted here.

use log::{debug, error};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::combinations::checked_sum;
use crate::multiset::Tally;
use crate::search::Cover;
use crate::tolerance::Tolerance;

/// The first rule a rejected cover breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("the cover is empty")]
    Empty,

    #[error("{groups} groups for {targets} targets")]
    LengthMismatch { groups: usize, targets: usize },

    #[error("group {index} is empty")]
    EmptyGroup { index: usize },

    #[error("group {index} sums past the decimal range")]
    Overflow { index: usize },

    #[error("group {index} sums to {sum}, not within tolerance of {target}")]
    OutOfTolerance {
        index: usize,
        sum: Decimal,
        target: Decimal,
    },

    #[error("group {index} uses {value} {used} times, the input has it {available} times")]
    Overdrawn {
        index: usize,
        value: Decimal,
        used: usize,
        available: usize,
    },

    #[error("{value} is used {used} times overall, the input has it {available} times")]
    CountMismatch {
        value: Decimal,
        used: usize,
        available: usize,
    },
}

/// Checks that `cover` partitions `candidates` into groups matching `targets` in order.
pub fn validate_cover(
    cover: &Cover,
    candidates: &[Decimal],
    targets: &[Decimal],
    tolerance: Tolerance,
) -> Result<(), Rejection> {
    let verdict = check(cover, candidates, targets, tolerance);
    match &verdict {
        Ok(()) => debug!("Cover is valid"),
        Err(rejection) => error!("Cover rejected: {}", rejection),
    }
    verdict
}

fn check(
    cover: &Cover,
    candidates: &[Decimal],
    targets: &[Decimal],
    tolerance: Tolerance,
) -> Result<(), Rejection> {
    if cover.is_empty() {
        return Err(Rejection::Empty);
    }
    if cover.len() != targets.len() {
        return Err(Rejection::LengthMismatch {
            groups: cover.len(),
            targets: targets.len(),
        });
    }

    let input = Tally::count(candidates);
    let mut used = Tally::new_empty();

    for (index, (group, &target)) in cover.iter().zip(targets).enumerate() {
        if group.is_empty() {
            return Err(Rejection::EmptyGroup { index });
        }

        let sum = checked_sum(group).ok_or(Rejection::Overflow { index })?;
        if !tolerance.within(sum, target) {
            return Err(Rejection::OutOfTolerance { index, sum, target });
        }

        let group_tally = Tally::count(group);
        for (value, n) in group_tally.entries() {
            let available = input.available(value);
            if n > available {
                return Err(Rejection::Overdrawn {
                    index,
                    value,
                    used: n,
                    available,
                });
            }
        }
        used.add(&group_tally);
    }

    // Values of the input that were left out, or used too often
    let mut values: Vec<Decimal> = input.entries().into_iter().map(|(v, _)| v).collect();
    values.extend(used.entries().into_iter().map(|(v, _)| v));
    values.sort_unstable();
    values.dedup();
    for value in values {
        let (n, available) = (used.available(value), input.available(value));
        if n != available {
            return Err(Rejection::CountMismatch {
                value,
                used: n,
                available,
            });
        }
    }

    Ok(())
}

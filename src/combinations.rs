use std::fmt;

use rust_decimal::Decimal;

use crate::budget::{Budget, Meter};
use crate::error::{Error, Stage};
use crate::tolerance::Tolerance;

/// Sorts the candidates ascending. `SubsetSums` relies on this order to
/// recognize interchangeable duplicates at the same depth.
pub fn normalize(values: &[Decimal]) -> Vec<Decimal> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted
}

/// A group of candidates whose sum matches `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    pub target: Decimal,
    pub values: Vec<Decimal>,
}

impl Combination {
    /// None if the sum leaves the decimal range.
    pub fn sum(&self) -> Option<Decimal> {
        checked_sum(&self.values)
    }
}

/// Adds the values in order, None on overflow.
pub fn checked_sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, &v| acc.checked_add(v))
}

/// Generate the combinations of `candidates` whose sum is equal to `target`
/// (up to the tolerance). Each candidate is used at most once.
#[derive(Debug)]
pub struct SubsetSums {
    target: Decimal,
    tolerance: Tolerance,
    candidates: Vec<Decimal>,
    floor: Vec<Decimal>,   // floor[i] = sum of the negative candidates from i on
    ceiling: Vec<Decimal>, // ceiling[i] = sum of the positive candidates from i on
    sets: Vec<Vec<Decimal>>,
}

impl SubsetSums {
    /// Constructor. `candidates` must be sorted ascending (see `normalize`).
    pub fn new(
        candidates: &[Decimal],
        target: Decimal,
        tolerance: Tolerance,
        budget: &Budget,
    ) -> Result<Self, Error> {
        debug_assert!(candidates.is_sorted(), "Candidates must be sorted");

        let n = candidates.len();
        let mut floor = vec![Decimal::ZERO; n + 1];
        let mut ceiling = vec![Decimal::ZERO; n + 1];
        for i in (0..n).rev() {
            let c = candidates[i];
            // Saturated bounds stay valid bounds
            floor[i] = floor[i + 1].saturating_add(c.min(Decimal::ZERO));
            ceiling[i] = ceiling[i + 1].saturating_add(c.max(Decimal::ZERO));
        }

        let mut subset_sums = Self {
            target,
            tolerance,
            candidates: candidates.to_vec(),
            floor,
            ceiling,
            sets: Vec::new(),
        };
        subset_sums.generate_sets(budget)?;
        subset_sums.sets.shrink_to_fit();
        Ok(subset_sums)
    }

    /// Returns the number of sets found
    pub fn get_sets_number(&self) -> usize {
        self.sets.len()
    }

    /// Returns a reference to the i-th set
    pub fn get_set(&self, i: usize) -> &Vec<Decimal> {
        assert!(i < self.sets.len());
        &self.sets[i]
    }

    /// Consumes the enumerator, tagging every set with its target.
    pub fn into_combinations(self) -> Vec<Combination> {
        let target = self.target;
        self.sets
            .into_iter()
            .map(|values| Combination { target, values })
            .collect()
    }

    /// Generate all sets
    fn generate_sets(&mut self, budget: &Budget) -> Result<(), Error> {
        let mut meter = budget.meter(Stage::Enumeration);
        let mut path = Vec::with_capacity(self.candidates.len());
        self.combine(0, &mut path, self.target, &mut meter)
    }

    /// Recursive combination generation
    fn combine(
        &mut self,
        start: usize,
        path: &mut Vec<Decimal>,
        remaining: Decimal,
        meter: &mut Meter,
    ) -> Result<(), Error> {
        meter.tick()?;

        // Terminal case
        if !path.is_empty() && self.tolerance.covers(remaining) {
            self.sets.push(path.clone());
            return Ok(());
        }

        // Prune: the rest of the candidates cannot bring the sum back in range
        let tol = self.tolerance.value();
        if remaining < self.floor[start].saturating_sub(tol)
            || remaining > self.ceiling[start].saturating_add(tol)
        {
            return Ok(());
        }

        // Recursive part
        for i in start..self.candidates.len() {
            if i > start && self.candidates[i] == self.candidates[i - 1] {
                continue;
            }
            let c = self.candidates[i];
            // A remainder past the decimal range cannot come back to zero
            let Some(next) = remaining.checked_sub(c) else {
                continue;
            };
            path.push(c);
            self.combine(i + 1, path, next, meter)?;
            path.pop(); // Backtracking
        }
        Ok(())
    }
}

/// Implement `Display` for printing
impl fmt::Display for SubsetSums {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for set in &self.sets {
            for n in set {
                write!(f, "{} ", n)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    fn exact(candidates: &[i64], target: i64) -> SubsetSums {
        SubsetSums::new(
            &normalize(&ints(candidates)),
            Decimal::from(target),
            Tolerance::EXACT,
            &Budget::unlimited(),
        )
        .unwrap()
    }

    fn sets(rcs: &SubsetSums) -> Vec<Vec<Decimal>> {
        (0..rcs.get_sets_number())
            .map(|i| rcs.get_set(i).clone())
            .collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&ints(&[3, -1, 2, 2])), ints(&[-1, 2, 2, 3]));
    }

    #[test]
    fn test_basic_combinations() {
        let rcs = exact(&[1, 2, 3, 4, 5], 7);
        assert_eq!(
            sets(&rcs),
            vec![ints(&[1, 2, 4]), ints(&[2, 5]), ints(&[3, 4])]
        );
        for set in sets(&rcs) {
            assert_eq!(set.iter().sum::<Decimal>(), Decimal::from(7));
        }
    }

    #[test]
    fn test_duplicates_are_emitted_once() {
        let rcs = exact(&[2, 2, 3], 4);
        assert_eq!(sets(&rcs), vec![ints(&[2, 2])]);
    }

    #[test]
    fn test_duplicates_with_several_paths() {
        let rcs = exact(&[1, 2, 2, 3, 4, 5], 8);
        assert_eq!(
            sets(&rcs),
            vec![
                ints(&[1, 2, 2, 3]),
                ints(&[1, 2, 5]),
                ints(&[1, 3, 4]),
                ints(&[2, 2, 4]),
                ints(&[3, 5]),
            ]
        );
    }

    #[test]
    fn test_no_solution() {
        let rcs = exact(&[10, 20, 30], 5);
        assert_eq!(rcs.get_sets_number(), 0);
    }

    #[test]
    fn test_negative_candidates() {
        let rcs = exact(&[-3, 1, 2, 5], 2);
        assert_eq!(sets(&rcs), vec![ints(&[-3, 5]), ints(&[2])]);
    }

    #[test]
    fn test_deterministic() {
        let a = exact(&[5, 1, 4, 2, 3, 2, 6], 9);
        let b = exact(&[5, 1, 4, 2, 3, 2, 6], 9);
        assert_eq!(sets(&a), sets(&b));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_tolerance() {
        let candidates: Vec<Decimal> = ["1.5", "2.5", "3.0", "4.0"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let rcs = SubsetSums::new(
            &candidates,
            "5.5".parse().unwrap(),
            "0.01".parse().unwrap(),
            &Budget::unlimited(),
        )
        .unwrap();
        assert_eq!(
            sets(&rcs),
            vec![
                vec![Decimal::new(15, 1), Decimal::new(40, 1)],
                vec![Decimal::new(25, 1), Decimal::new(30, 1)],
            ]
        );
    }

    #[test]
    fn test_tolerance_accepts_near_sums() {
        let candidates: Vec<Decimal> = ["1.004", "2.003"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let rcs = SubsetSums::new(
            &candidates,
            Decimal::from(3),
            "0.01".parse().unwrap(),
            &Budget::unlimited(),
        )
        .unwrap();
        assert_eq!(rcs.get_sets_number(), 1);
    }

    #[test]
    fn test_into_combinations_keeps_target() {
        let combinations = exact(&[1, 2, 3], 3).into_combinations();
        assert_eq!(combinations.len(), 2);
        for c in &combinations {
            assert_eq!(c.target, Decimal::from(3));
            assert_eq!(c.sum(), Some(Decimal::from(3)));
        }
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let candidates = normalize(&[Decimal::MAX, Decimal::MAX, -Decimal::MAX]);
        let rcs = SubsetSums::new(
            &candidates,
            Decimal::MAX,
            Tolerance::EXACT,
            &Budget::unlimited(),
        )
        .unwrap();
        assert_eq!(sets(&rcs), vec![vec![Decimal::MAX]]);

        let rcs = SubsetSums::new(
            &[Decimal::MAX, Decimal::MAX],
            Decimal::ONE,
            Tolerance::EXACT,
            &Budget::unlimited(),
        )
        .unwrap();
        assert_eq!(rcs.get_sets_number(), 0);
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum(&ints(&[1, 2, 3])), Some(Decimal::from(6)));
        assert_eq!(checked_sum(&[]), Some(Decimal::ZERO));
        assert_eq!(checked_sum(&[Decimal::MAX, Decimal::ONE]), None);
        let c = Combination {
            target: Decimal::MAX,
            values: vec![Decimal::MAX, Decimal::MAX],
        };
        assert_eq!(c.sum(), None);
    }

    #[test]
    fn test_budget_is_enforced() {
        let candidates = normalize(&ints(&(1..=20).collect::<Vec<_>>()));
        let result = SubsetSums::new(
            &candidates,
            Decimal::from(105),
            Tolerance::EXACT,
            &Budget::unlimited().with_max_nodes(50),
        );
        assert!(matches!(
            result,
            Err(Error::BudgetExhausted {
                stage: Stage::Enumeration,
                ..
            })
        ));
    }
}

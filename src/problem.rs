use log::{debug, info};
use rust_decimal::Decimal;

use crate::budget::Budget;
use crate::combinations::{Combination, SubsetSums, normalize};
use crate::error::Error;
use crate::search::{Cover, select};
use crate::tolerance::Tolerance;
use crate::values::check_balance;
use crate::zero::{extract_zero_sums, is_zero_target};

/// One solve: the candidates to partition, the sums to reach and the tolerance.
#[derive(Clone, Debug)]
pub struct Problem {
    pub candidates: Vec<Decimal>,
    pub targets: Vec<Decimal>,
    pub tolerance: Tolerance,
}

/// A problem after the zero targets have been served.
#[derive(Debug)]
pub struct Prepared {
    /// Groups taken out for the zero targets.
    pub zero_groups: Vec<Combination>,
    /// Sorted candidates not used by the zero groups.
    pub pool: Vec<Decimal>,
    /// Targets left for `SubsetSums`, one entry per occurrence, in target order.
    pub targets: Vec<Decimal>,
}

impl Prepared {
    /// Combinations of the pool for one target.
    pub fn enumerate(
        &self,
        target: Decimal,
        tolerance: Tolerance,
        budget: &Budget,
    ) -> Result<Vec<Combination>, Error> {
        let subset_sums = SubsetSums::new(&self.pool, target, tolerance, budget)?;
        debug!("{} combinations for {}", subset_sums.get_sets_number(), target);
        Ok(subset_sums.into_combinations())
    }
}

impl Problem {
    pub fn new(candidates: Vec<Decimal>, targets: Vec<Decimal>, tolerance: Tolerance) -> Self {
        Self {
            candidates,
            targets,
            tolerance,
        }
    }

    /// See `values::check_balance`.
    pub fn check_balance(&self) -> Result<(), Error> {
        check_balance(&self.candidates, &self.targets, self.tolerance)
    }

    /// Sorts the candidates and serves the zero targets.
    pub fn prepare(&self, budget: &Budget) -> Result<Prepared, Error> {
        let mut pool = normalize(&self.candidates);
        let (zeros, targets): (Vec<Decimal>, Vec<Decimal>) = self
            .targets
            .iter()
            .partition(|&&t| is_zero_target(t, self.tolerance));

        let zero_groups = if zeros.is_empty() {
            Vec::new()
        } else {
            info!("{} zero targets", zeros.len());
            extract_zero_sums(&mut pool, &zeros, self.tolerance, budget)?
        };

        Ok(Prepared {
            zero_groups,
            pool,
            targets,
        })
    }

    /// The flat list of combinations: zero groups first, then every non-zero
    /// target occurrence in target order.
    pub fn combinations(&self, budget: &Budget) -> Result<Vec<Combination>, Error> {
        let prepared = self.prepare(budget)?;
        let mut all = prepared.zero_groups.clone();
        for &target in &prepared.targets {
            all.extend(prepared.enumerate(target, self.tolerance, budget)?);
        }
        Ok(all)
    }

    /// Every distinct cover, in the order found. Does not check the balance:
    /// an unbalanced problem just has no cover.
    pub fn solve(&self, budget: &Budget) -> Result<Vec<Cover>, Error> {
        let combinations = self.combinations(budget)?;
        info!("{} combinations to select from", combinations.len());
        select(
            &combinations,
            &self.candidates,
            &self.targets,
            self.tolerance,
            budget,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::multiset::Tally;
    use crate::validate::validate_cover;

    fn ints(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|&v| Decimal::from(v)).collect()
    }

    fn decimals(values: &[&str]) -> Vec<Decimal> {
        values.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn assert_all_valid(problem: &Problem, covers: &[Cover]) {
        for cover in covers {
            let verdict =
                validate_cover(cover, &problem.candidates, &problem.targets, problem.tolerance);
            assert!(verdict.is_ok());
            let used: Vec<Decimal> = cover.iter().flatten().copied().collect();
            assert_eq!(Tally::count(&used), Tally::count(&problem.candidates));
            assert!(cover.iter().all(|g| !g.is_empty()));
        }
    }

    #[test]
    fn test_exact_unique() {
        let problem = Problem::new(ints(&[1, 2, 3, 4, 5]), ints(&[7, 8]), Tolerance::EXACT);
        problem.check_balance().unwrap();
        let covers = problem.solve(&Budget::unlimited()).unwrap();

        assert!(covers.contains(&vec![ints(&[3, 4]), ints(&[1, 2, 5])]));
        assert_all_valid(&problem, &covers);
    }

    #[test]
    fn test_exact_duplicates() {
        let problem = Problem::new(ints(&[1, 2, 2, 3, 4, 5]), ints(&[8, 9]), Tolerance::EXACT);
        let covers = problem.solve(&Budget::unlimited()).unwrap();

        assert!(covers.contains(&vec![ints(&[1, 2, 2, 3]), ints(&[4, 5])]));
        assert_all_valid(&problem, &covers);
    }

    #[test]
    fn test_zero_in_target() {
        let problem = Problem::new(
            ints(&[1, 2, 2, 3, 4, 5, 2, 2, 7, 8, -8, 8]),
            ints(&[8, 9, 4, 15, 0]),
            Tolerance::EXACT,
        );
        problem.check_balance().unwrap();

        let prepared = problem.prepare(&Budget::unlimited()).unwrap();
        assert_eq!(prepared.zero_groups.len(), 1);
        assert_eq!(prepared.zero_groups[0].values, ints(&[-8, 8]));
        assert_eq!(prepared.targets, ints(&[8, 9, 4, 15]));

        let covers = problem.solve(&Budget::unlimited()).unwrap();
        assert!(covers.contains(&vec![
            ints(&[1, 2, 2, 3]),
            ints(&[4, 5]),
            ints(&[2, 2]),
            ints(&[7, 8]),
            ints(&[-8, 8]),
        ]));
        assert_all_valid(&problem, &covers);
        for cover in &covers {
            assert_eq!(cover[4], ints(&[-8, 8]));
        }
    }

    #[test]
    fn test_decimal_tolerance() {
        let problem = Problem::new(
            decimals(&["1.5", "2.5", "3.0", "4.0"]),
            decimals(&["5.5", "5.5"]),
            "0.01".parse().unwrap(),
        );
        problem.check_balance().unwrap();
        let covers = problem.solve(&Budget::unlimited()).unwrap();

        assert_eq!(
            covers,
            vec![vec![decimals(&["1.5", "4.0"]), decimals(&["2.5", "3.0"])]]
        );
        assert_all_valid(&problem, &covers);
    }

    #[test]
    fn test_near_zero_target_within_tolerance() {
        let problem = Problem::new(
            decimals(&["-0.01", "0.01", "3.01"]),
            decimals(&["0.005", "3.005"]),
            "0.01".parse().unwrap(),
        );
        problem.check_balance().unwrap();

        let prepared = problem.prepare(&Budget::unlimited()).unwrap();
        assert_eq!(prepared.zero_groups.len(), 1);
        assert_eq!(prepared.zero_groups[0].target, Decimal::new(5, 3));
        assert_eq!(prepared.zero_groups[0].values, decimals(&["0.01"]));
        assert_eq!(prepared.targets, decimals(&["3.005"]));

        let covers = problem.solve(&Budget::unlimited()).unwrap();
        assert_eq!(
            covers,
            vec![vec![decimals(&["0.01"]), decimals(&["-0.01", "3.01"])]]
        );
        assert_all_valid(&problem, &covers);
    }

    #[test]
    fn test_values_at_the_decimal_limit() {
        let max = Decimal::MAX;
        let problem = Problem::new(vec![max, max, -max], vec![max], Tolerance::EXACT);
        assert!(matches!(problem.check_balance(), Err(Error::Overflow(_))));
        // MAX alone reaches the target but leaves MAX and -MAX unused
        assert!(problem.solve(&Budget::unlimited()).unwrap().is_empty());

        let targets = vec![max, Decimal::ZERO];
        let problem = Problem::new(vec![max, -max, max], targets, Tolerance::EXACT);
        let covers = problem.solve(&Budget::unlimited()).unwrap();
        assert_eq!(covers, vec![vec![vec![max], vec![-max, max]]]);
        assert_all_valid(&problem, &covers);
    }

    #[test]
    fn test_sum_mismatch() {
        let problem = Problem::new(ints(&[1, 2, 3]), ints(&[10]), Tolerance::EXACT);
        assert!(matches!(problem.check_balance(), Err(Error::SumMismatch { .. })));
        // searching anyway is not an error, it just finds nothing
        assert!(problem.solve(&Budget::unlimited()).unwrap().is_empty());
    }

    #[test]
    fn test_combinations_order() {
        let problem = Problem::new(ints(&[-1, 1, 2, 3]), ints(&[3, 0, 2]), Tolerance::EXACT);
        let combinations = problem.combinations(&Budget::unlimited()).unwrap();
        let targets: Vec<Decimal> = combinations.iter().map(|c| c.target).collect();
        // zero group first, then 3, then 2
        assert_eq!(targets, ints(&[0, 3, 2]));
        assert_eq!(combinations[0].values, ints(&[-1, 1]));
        assert_eq!(combinations[1].values, ints(&[3]));
        assert_eq!(combinations[2].values, ints(&[2]));
    }

    #[test]
    fn test_deterministic() {
        let problem =
            Problem::new(ints(&[4, 1, 3, 2, 2, 5, 3]), ints(&[5, 5, 10]), Tolerance::EXACT);
        let a = problem.solve(&Budget::unlimited()).unwrap();
        let b = problem.solve(&Budget::unlimited()).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_budget_reports_stage() {
        let problem = Problem::new(
            ints(&(1..=24).collect::<Vec<_>>()),
            ints(&[100, 200]),
            Tolerance::EXACT,
        );
        let result = problem.solve(&Budget::unlimited().with_max_nodes(1_000));
        assert!(matches!(
            result,
            Err(Error::BudgetExhausted {
                stage: Stage::Enumeration,
                ..
            })
        ));
    }
}

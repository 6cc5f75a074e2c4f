use ahash::HashSetExt;
use crossbeam_channel::{Sender, unbounded};
use fxhash::FxHashSet;
use rust_decimal::Decimal;

use crate::budget::{Budget, Meter};
use crate::combinations::Combination;
use crate::error::{Error, Stage};
use crate::multiset::Tally;
use crate::tolerance::Tolerance;

/// One group of candidates.
pub type Group = Vec<Decimal>;

/// A full solution: group `i` is paired with target `i`.
pub type Cover = Vec<Group>;

/// Temporary mutable state passed during the recursive search.
/// Kept apart from CoverSearch so that the search can borrow &self and &mut state at the same time.
struct SearchState {
    remaining_inputs: Tally,
    remaining_targets: Tally,
    quota: usize,                  // remaining_targets.len()
    chosen: Vec<(usize, Decimal)>, // combination index, target it is assigned to
    cover_set: FxHashSet<Cover>,
    meter: Meter,
}

/// Picks, among the enumerated combinations, every sub-collection that uses each
/// candidate exactly once and serves every target as many times as it occurs.
pub struct CoverSearch<'a> {
    combinations: &'a [Combination],
    tallies: Vec<Tally>,
    sums: Vec<Option<Decimal>>, // None when the sum overflows
    targets: &'a [Decimal],
    distinct_targets: Vec<Decimal>,
    candidates: Tally,
    tolerance: Tolerance,
    sender: Sender<Cover>,
}

impl<'a> CoverSearch<'a> {
    pub fn new(
        combinations: &'a [Combination],
        candidates: &[Decimal],
        targets: &'a [Decimal],
        tolerance: Tolerance,
        sender: Sender<Cover>,
    ) -> Self {
        let tallies = combinations.iter().map(|c| Tally::count(&c.values)).collect();
        let sums = combinations.iter().map(Combination::sum).collect();

        let mut distinct_targets: Vec<Decimal> = Vec::new();
        for &t in targets {
            if !distinct_targets.contains(&t) {
                distinct_targets.push(t);
            }
        }

        Self {
            combinations,
            tallies,
            sums,
            targets,
            distinct_targets,
            candidates: Tally::count(candidates),
            tolerance,
            sender,
        }
    }

    /// Launches the search. Every distinct cover is sent once; returns how many were sent.
    pub fn run(&self, budget: &Budget) -> Result<usize, Error> {
        let remaining_targets = Tally::count(self.targets);
        let mut state = SearchState {
            remaining_inputs: self.candidates.clone(),
            quota: remaining_targets.len(),
            remaining_targets,
            chosen: Vec::with_capacity(self.targets.len()),
            cover_set: FxHashSet::new(),
            meter: budget.meter(Stage::Selection),
        };

        self.search(0, &mut state)?;
        Ok(state.cover_set.len())
    }

    /// Recursive include/exclude search.
    fn search(&self, index: usize, state: &mut SearchState) -> Result<(), Error> {
        state.meter.tick()?;

        // Base case
        debug_assert!(index <= self.combinations.len());
        if index == self.combinations.len() {
            if state.remaining_inputs.is_empty() && state.remaining_targets.is_empty() {
                self.emit(state)?;
            }
            return Ok(());
        }

        // Prune: each combination serves one target at most
        if state.quota > self.combinations.len() - index {
            return Ok(());
        }

        // Include
        let tally = &self.tallies[index];
        if let Some(sum) = self.sums[index]
            && state.quota > 0
            && tally.fits(&state.remaining_inputs)
        {
            for &target in &self.distinct_targets {
                if state.remaining_targets.available(target) == 0
                    || !self.tolerance.within(sum, target)
                {
                    continue;
                }

                state.remaining_inputs.sub(tally);
                state.remaining_targets.take(target);
                state.quota -= 1;
                state.chosen.push((index, target));

                let result = self.search(index + 1, state);

                // Backtracking
                state.chosen.pop();
                state.quota += 1;
                state.remaining_targets.put(target);
                state.remaining_inputs.add(tally);
                result?;
            }
        }

        // Exclude
        self.search(index + 1, state)
    }

    /// Lays the chosen combinations out in target order and sends the cover if it is new.
    /// Groups serving equal targets are sorted, so that swapping them gives the same cover.
    /// Fails once nobody listens to the covers any more.
    fn emit(&self, state: &mut SearchState) -> Result<(), Error> {
        let mut cover: Cover = vec![Vec::new(); self.targets.len()];

        for &target in &self.distinct_targets {
            let mut groups: Vec<&Group> = state
                .chosen
                .iter()
                .filter(|(_, t)| *t == target)
                .map(|(i, _)| &self.combinations[*i].values)
                .collect();
            groups.sort_unstable();

            let slots = self
                .targets
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == target)
                .map(|(i, _)| i);
            for (slot, group) in slots.zip(groups) {
                cover[slot] = group.clone();
            }
        }

        debug_assert!(cover.iter().all(|g| !g.is_empty()));
        if state.cover_set.insert(cover.clone()) {
            self.sender.send(cover).map_err(|_| Error::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Runs a `CoverSearch` and collects its covers, in the order they were found.
pub fn select(
    combinations: &[Combination],
    candidates: &[Decimal],
    targets: &[Decimal],
    tolerance: Tolerance,
    budget: &Budget,
) -> Result<Vec<Cover>, Error> {
    let (sender, receiver) = unbounded();
    let search = CoverSearch::new(combinations, candidates, targets, tolerance, sender);
    search.run(budget)?;
    drop(search);
    Ok(receiver.try_iter().collect())
}

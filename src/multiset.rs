use std::fmt;

use ahash::HashMapExt;
use fxhash::FxHashMap;
use rust_decimal::Decimal;

/// A multiset of values, stored as value --> occurrences.
/// Keys are normalized (`1.50` and `1.5` are the same key) and never map to zero,
/// so two tallies are equal exactly when they describe the same multiset.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Tally {
    counts: FxHashMap<Decimal, usize>,
}

impl Tally {
    /// Counts the occurrences of every value.
    pub fn count(values: &[Decimal]) -> Self {
        let mut tally = Self::new_empty();
        for &v in values {
            tally.put(v);
        }
        tally
    }

    /// Creates an empty tally.
    pub fn new_empty() -> Self {
        Self {
            counts: FxHashMap::new(),
        }
    }

    /// Occurrences of `value` still available.
    #[inline(always)]
    pub fn available(&self, value: Decimal) -> usize {
        self.counts.get(&value.normalize()).copied().unwrap_or(0)
    }

    /// Adds one occurrence of `value`.
    #[inline(always)]
    pub fn put(&mut self, value: Decimal) {
        *self.counts.entry(value.normalize()).or_insert(0) += 1;
    }

    /// Removes one occurrence of `value`.
    #[inline(always)]
    pub fn take(&mut self, value: Decimal) {
        let key = value.normalize();
        let count = self
            .counts
            .get_mut(&key)
            .expect("Subtraction would go negative");
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&key);
        }
    }

    /// Add another tally to this one.
    pub fn add(&mut self, other: &Tally) {
        for (&v, &n) in &other.counts {
            *self.counts.entry(v).or_insert(0) += n;
        }
    }

    /// Subtract another tally from this one.
    pub fn sub(&mut self, other: &Tally) {
        for (v, &n) in &other.counts {
            let count = self
                .counts
                .get_mut(v)
                .filter(|c| **c >= n)
                .expect("Subtraction would go negative");
            *count -= n;
            if *count == 0 {
                self.counts.remove(v);
            }
        }
    }

    /// Returns true if every count of self is <= the same count in `parent`.
    #[inline(always)]
    pub fn fits(&self, parent: &Tally) -> bool {
        self.counts.iter().all(|(v, &n)| {
            parent.counts.get(v).is_some_and(|&available| n <= available)
        })
    }

    /// True when no occurrence is left.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of occurrences.
    pub fn len(&self) -> usize {
        self.counts.values().sum()
    }

    /// The distinct values with their counts, ascending.
    pub fn entries(&self) -> Vec<(Decimal, usize)> {
        let mut entries: Vec<(Decimal, usize)> =
            self.counts.iter().map(|(&v, &n)| (v, n)).collect();
        entries.sort_unstable();
        entries
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (v, n)) in self.entries().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", v, n)?;
        }
        write!(f, "}}")
    }
}

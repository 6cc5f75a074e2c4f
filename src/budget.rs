use std::time::{Duration, Instant};

use crate::error::{Error, Stage};

// The clock is only read every 1024 nodes
const CLOCK_MASK: u64 = 0x3ff;

/// Limits on how far a search may go. Every recursive step of the zero
/// extractor, the enumerator and the selector is charged one node.
#[derive(Clone, Copy, Debug, Default)]
pub struct Budget {
    max_nodes: Option<u64>,
    deadline: Option<Instant>,
}

impl Budget {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Caps the number of nodes each search may visit.
    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Stops every search once `limit` has elapsed from now.
    /// A limit past what the clock can represent means no deadline.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.deadline = Instant::now().checked_add(limit);
        self
    }

    pub fn max_nodes(&self) -> Option<u64> {
        self.max_nodes
    }

    /// Starts counting nodes for one search.
    pub fn meter(&self, stage: Stage) -> Meter {
        Meter {
            budget: *self,
            stage,
            nodes: 0,
        }
    }
}

/// Node counter of a single search.
#[derive(Debug)]
pub struct Meter {
    budget: Budget,
    stage: Stage,
    nodes: u64,
}

impl Meter {
    /// Charges one node, failing once the budget is spent.
    #[inline]
    pub fn tick(&mut self) -> Result<(), Error> {
        self.nodes += 1;

        if let Some(max) = self.budget.max_nodes {
            if self.nodes > max {
                return Err(Error::BudgetExhausted {
                    stage: self.stage,
                    nodes: self.nodes - 1,
                });
            }
        }

        if self.nodes & CLOCK_MASK == 0 {
            if let Some(deadline) = self.budget.deadline {
                if Instant::now() >= deadline {
                    return Err(Error::DeadlineExceeded {
                        stage: self.stage,
                        nodes: self.nodes,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }
}

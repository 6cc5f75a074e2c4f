use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

/// The search stage a budget belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ZeroExtraction,
    Enumeration,
    Selection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ZeroExtraction => "zero extraction",
            Stage::Enumeration => "enumeration",
            Stage::Selection => "selection",
        };
        write!(f, "{}", name)
    }
}

/// Everything that can stop a solve from running to completion.
/// Finding no cover is not an error: the searches simply return nothing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("tolerance must be >= 0, got {0}")]
    InvalidTolerance(Decimal),

    #[error("cannot parse tolerance {0:?}")]
    BadTolerance(String),

    #[error("the input list is empty")]
    EmptyCandidates,

    #[error("the target list is empty")]
    EmptyTargets,

    #[error("sum of input ({input}) and sum of target ({target}) differ by more than {slack}")]
    SumMismatch {
        input: Decimal,
        target: Decimal,
        slack: Decimal,
    },

    #[error("the {0} overflows the decimal range")]
    Overflow(&'static str),

    #[error("the cover receiver hung up")]
    ChannelClosed,

    #[error("{stage} gave up after visiting {nodes} nodes")]
    BudgetExhausted { stage: Stage, nodes: u64 },

    #[error("{stage} ran past the time limit after visiting {nodes} nodes")]
    DeadlineExceeded { stage: Stage, nodes: u64 },

    #[error("cannot read {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, row {row}: {text:?} is not a number")]
    Parse {
        path: String,
        row: usize,
        text: String,
    },

    #[error("cannot export {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Setup(String),
}

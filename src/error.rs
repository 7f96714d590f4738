//! Error taxonomy for search, planning, and execution.
//!
//! Errors fall into three families, exposed via [`Error::kind`]:
//!
//! - **Configuration**: a malformed search or sweep configuration.  Checked
//!   up front (before any sampling, before any dispatch) so a bad
//!   configuration never reaches a worker.
//! - **Data**: the reward tensor cannot answer a query it should be able to
//!   answer.  Fails the affected search only; sibling searches are untouched
//!   because arm statistics are never shared.
//! - **Worker**: the execution pool itself failed (construction error, lost
//!   result).  Surfaced to the batch driver, never hung.
//!
//! Search-local numeric edge cases (an arm that was never visited) are *not*
//! errors: they are resolved inside the sampling loop via the infinity
//! substitution and never surface here.

use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Invalid search/sweep configuration, rejected before dispatch.
    Configuration,
    /// Reward data missing or malformed for a valid query.
    Data,
    /// Worker-pool failure.
    Worker,
}

/// Errors produced by searches, sweep planning, and execution.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Sampling-budget mode string is not one of the known modes.
    #[error("`{0}` is not a valid sampling-budget mode (expected `fix` or `linear`)")]
    UnknownBudgetMode(String),

    /// Exploration constant must be finite and non-negative.
    #[error("exploration constant must be finite and >= 0, got {0}")]
    InvalidExplorationConstant(f64),

    /// Prior-weight blends must lie in `[0, 1]`.
    #[error("prior weight must be in [0, 1], got {0}")]
    InvalidPriorWeight(f64),

    /// A supplied prior vector has the wrong length for the document.
    #[error("prior has length {got}, expected n_sents = {expected}")]
    PriorLengthMismatch { expected: usize, got: usize },

    /// A supplied prior vector contains a negative or non-finite entry.
    #[error("prior entry at index {index} is invalid: {value}")]
    InvalidPriorEntry { index: usize, value: f64 },

    /// Triple selection needs at least 3 candidate sentences.
    #[error("document has {0} valid sentences; at least 3 are required")]
    TooFewSentences(usize),

    /// `n_sents` exceeds what the reward tensor actually stores.
    #[error("n_sents = {n_sents} exceeds reward tensor dimension {dim}")]
    SentenceCountExceedsTensor { n_sents: usize, dim: usize },

    /// A reward lookup used an index outside the tensor.
    #[error("triple ({0}, {1}, {2}) is out of bounds for tensor dimension {3}")]
    TripleOutOfBounds(usize, usize, usize, usize),

    /// A tensor cell holds a NaN or negative sub-metric.
    #[error("reward cell ({0}, {1}, {2}) holds an invalid value {3}")]
    InvalidRewardCell(usize, usize, usize, f64),

    /// A tensor was built from the wrong number of cells for its dimension.
    #[error("reward tensor for dim {dim} needs {expected} cells, got {got}")]
    TensorSizeMismatch {
        dim: usize,
        expected: usize,
        got: usize,
    },

    /// The worst-prior derivation found no strictly positive mean reward.
    #[error("no strictly positive mean reward among the first {n_sents} sentences")]
    NoPositiveReward { n_sents: usize },

    /// The executor could not build its thread pool.
    #[error("worker pool construction failed: {0}")]
    PoolBuild(String),

    /// A worker finished without delivering a result for its configuration.
    #[error("worker result lost for configuration `{0}`")]
    WorkerLost(String),
}

impl Error {
    /// Which family this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownBudgetMode(_)
            | Error::InvalidExplorationConstant(_)
            | Error::InvalidPriorWeight(_)
            | Error::PriorLengthMismatch { .. }
            | Error::InvalidPriorEntry { .. }
            | Error::TooFewSentences(_)
            | Error::SentenceCountExceedsTensor { .. } => ErrorKind::Configuration,
            Error::TripleOutOfBounds(..)
            | Error::InvalidRewardCell(..)
            | Error::TensorSizeMismatch { .. }
            | Error::NoPositiveReward { .. } => ErrorKind::Data,
            Error::PoolBuild(_) | Error::WorkerLost(_) => ErrorKind::Worker,
        }
    }
}

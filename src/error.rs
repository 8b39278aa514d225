//! Engine error type.

use thiserror::Error;

/// Errors that abort an optimization run.
///
/// Recoverable conditions (undersized populations, out-of-range genes,
/// infeasible solutions, CMA-ES numerical degeneracy) are normalized inside
/// the engine and never surface here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("fitness of population member {index} is NaN (genes: {genes:?})")]
    NanFitness { index: usize, genes: Vec<f64> },

    #[error("fitness array has {actual} values but the population has {expected} members")]
    FitnessSizeMismatch { expected: usize, actual: usize },

    #[error("population is empty")]
    EmptyPopulation,

    #[error("some population members have not been evaluated")]
    NotEvaluated,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("population size mismatch: expected {expected}, got {actual}")]
    PopulationSizeMismatch { expected: usize, actual: usize },

    #[error("member index {index} is out of range for a population of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot {operation} while the search distribution is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("at least one sampler must be given to a relay execution")]
    EmptyRelay,

    #[error("stagnation threshold must be greater than zero")]
    InvalidThreshold,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "serde")]
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Shorthand for results returned by the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

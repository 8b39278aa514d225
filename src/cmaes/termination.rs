//! Reasons a CMA-ES search distribution stops making progress.

use std::fmt;

/// Why a search distribution is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// The best fitness reached the configured target.
    TargetFitness,
    /// The evaluation budget is spent.
    MaxEvaluations,
    /// The iteration budget is spent.
    MaxIterations,
    /// Recent and current fitness values are (nearly) identical.
    TolFun,
    /// The best-fitness history has stalled.
    TolFunHist,
    /// Step size and covariance path have vanished.
    TolX,
    /// Step size has exploded relative to its initial value.
    TolUpX,
    /// A principal-axis step no longer moves the mean.
    NoEffectAxis,
    /// A coordinate step no longer moves the mean.
    NoEffectCoordinate,
    /// The covariance matrix is degenerate or too ill-conditioned.
    ConditionNumber,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Termination::TargetFitness => "target fitness reached",
            Termination::MaxEvaluations => "evaluation budget exhausted",
            Termination::MaxIterations => "iteration budget exhausted",
            Termination::TolFun => "fitness range below tolerance",
            Termination::TolFunHist => "fitness history range below tolerance",
            Termination::TolX => "step size below tolerance",
            Termination::TolUpX => "step size diverged",
            Termination::NoEffectAxis => "principal axis step has no effect",
            Termination::NoEffectCoordinate => "coordinate step has no effect",
            Termination::ConditionNumber => "covariance condition number too large",
        };
        f.write_str(msg)
    }
}

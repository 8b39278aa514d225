//! The optimization problem contract.

use crate::execution::Progress;
use crate::genotype::{Individual, Population};
use rayon::prelude::*;

/// Fitness assigned to genotypes outside the unit hypercube and to
/// infeasible solutions.
///
/// An execution whose best fitness is still `INFEASIBLE` when it stops has
/// found no feasible solution.
pub const INFEASIBLE: f64 = f64::MAX;

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Goal {
    /// Larger objective values are better.
    Maximize,
    /// Smaller objective values are better.
    #[default]
    Minimize,
}

impl Goal {
    /// Converts an objective value into a fitness (always minimized).
    pub fn fitness(self, objective: f64) -> f64 {
        match self {
            Goal::Maximize => -objective,
            Goal::Minimize => objective,
        }
    }
}

/// A black-box optimization problem over the unit hypercube.
///
/// The engine only ever sees genotypes in `[0, 1]^n`. The problem decodes
/// them into its own solution type, rejects infeasible ones and scores the
/// rest. Everything else (sampling, recombination, migration) is handled
/// by samplers and executions.
///
/// # Examples
///
/// ```
/// use u_metaopt::execution::Progress;
/// use u_metaopt::genotype::{value_in, Individual};
/// use u_metaopt::problem::Problem;
///
/// struct Sphere;
///
/// impl Problem for Sphere {
///     type Solution = Vec<f64>;
///
///     fn dimensions(&self) -> usize { 3 }
///
///     fn decode(&self, individual: &Individual) -> Vec<f64> {
///         individual.keys().iter().map(|&k| value_in(k, -5.0, 5.0)).collect()
///     }
///
///     fn objective(&self, x: &Vec<f64>) -> f64 {
///         x.iter().map(|v| v * v).sum()
///     }
///
///     fn should_stop(&self, progress: &Progress) -> bool {
///         progress.evaluations >= 1_000
///     }
/// }
/// ```
pub trait Problem: Send + Sync {
    /// Decoded (phenotype) representation of a genotype.
    type Solution;

    /// Number of genes per genotype.
    fn dimensions(&self) -> usize;

    /// Maps a genotype to a domain solution.
    fn decode(&self, individual: &Individual) -> Self::Solution;

    /// Objective value of a solution, interpreted according to [`goal`](Self::goal).
    fn objective(&self, solution: &Self::Solution) -> f64;

    /// Whether a decoded solution is feasible. Defaults to `true`.
    fn is_feasible(&self, _solution: &Self::Solution) -> bool {
        true
    }

    /// Optimization direction. Defaults to [`Goal::Minimize`].
    fn goal(&self) -> Goal {
        Goal::Minimize
    }

    /// Cooperative stop condition, polled once per outer iteration.
    fn should_stop(&self, progress: &Progress) -> bool;

    /// Whether [`evaluate`](Self::evaluate) fans out over rayon.
    fn parallel(&self) -> bool {
        false
    }

    /// Fitness of a single genotype.
    ///
    /// Genes outside `[0, 1]` and infeasible solutions score [`INFEASIBLE`].
    fn fitness(&self, individual: &Individual) -> f64 {
        if !individual.is_in_unit_cube() {
            return INFEASIBLE;
        }
        let solution = self.decode(individual);
        if !self.is_feasible(&solution) {
            return INFEASIBLE;
        }
        self.goal().fitness(self.objective(&solution))
    }

    /// Fitness of every population member, aligned by index.
    fn evaluate(&self, population: &Population) -> Vec<f64> {
        if self.parallel() {
            population
                .members()
                .par_iter()
                .map(|m| self.fitness(m.individual()))
                .collect()
        } else {
            population
                .iter()
                .map(|m| self.fitness(m.individual()))
                .collect()
        }
    }
}

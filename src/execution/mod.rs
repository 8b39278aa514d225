//! Optimization drivers.
//!
//! An [`Execution`] owns one or more samplers and drives them against a
//! [`Problem`]: evaluate the population, step the sampler, repeat until
//! [`Problem::should_stop`] holds. Composite executions drive child
//! executions the same way.
//!
//! | Execution | Strategy |
//! |-----------|----------|
//! | [`DefaultExecution`] | One sampler, no intervention |
//! | [`RestartExecution`] | Reinitializes around the best member on stagnation (IPOP preset grows the population) |
//! | [`RelayExecution`] | Hands the population to the next sampler on stagnation |
//! | [`IslandExecution`] | Independent islands with periodic migration (uniform or charity) |
//! | [`CompetitiveIslandExecution`] | Islands plus periodic population reallocation to the most improved island |

mod competitive;
mod default;
mod island;
mod relay;
mod restart;

pub use competitive::{CompetitiveConfig, CompetitiveIslandExecution};
pub use default::DefaultExecution;
pub use island::{IslandConfig, IslandExecution, Migration};
pub use relay::RelayExecution;
pub use restart::{RestartConfig, RestartExecution};

use crate::entry::EntryPolicy;
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Population};
use crate::monitor::{LogLevel, Monitor};
use crate::problem::{Problem, INFEASIBLE};
use crate::sampler::Sampler;

/// Counters and best-so-far of a run, as seen by stop conditions and
/// monitors.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progress {
    /// Completed outer iterations.
    pub iterations: u64,
    /// Fitness evaluations performed.
    pub evaluations: u64,
    /// Best individual evaluated so far.
    pub best: Option<EvaluatedIndividual>,
}

impl Progress {
    /// Fitness of the best individual, if any.
    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().map(EvaluatedIndividual::fitness)
    }

    /// Replaces the best individual when `candidate` is at least as fit.
    /// Returns whether it was replaced.
    pub(crate) fn offer(&mut self, candidate: &EvaluatedIndividual) -> bool {
        let better = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.fitness() <= best.fitness());
        if better {
            self.best = Some(candidate.clone());
        }
        better
    }
}

/// A driver of one or more samplers.
///
/// The driver loop is [`optimize`](Self::optimize); the individual steps
/// are public so that callers can interleave their own logic, and so that
/// composite executions can drive their children.
pub trait Execution {
    /// Name used in logs and monitor messages.
    fn name(&self) -> &str;

    /// Counters and best-so-far.
    fn progress(&self) -> &Progress;

    /// Genes per individual.
    fn dimensions(&self) -> usize;

    /// Configured population size (summed over children for composites).
    fn population_size(&self) -> usize;

    /// Evaluates the current population, initializing it first if empty.
    fn update_fitness<P: Problem>(&mut self, problem: &P) -> Result<()>;

    /// Advances one iteration: applies the execution's policies, then asks
    /// the sampler(s) for the next population.
    fn next_iteration<P: Problem>(&mut self, problem: &P) -> Result<()>;

    /// Forwards an immigrant to the sampler(s).
    fn arrival(&mut self, immigrant: EvaluatedIndividual);

    /// Replaces the population with one of `size` anchored on `seed`.
    fn reinitialize_with(&mut self, seed: &Population, size: usize) -> Result<()>;

    /// Replaces the population with one of `size` anchored on the current
    /// population.
    fn reinitialize(&mut self, size: usize) -> Result<()>;

    /// Completed iterations.
    fn iterations(&self) -> u64 {
        self.progress().iterations
    }

    /// Fitness evaluations performed.
    fn evaluations(&self) -> u64 {
        self.progress().evaluations
    }

    /// Best individual evaluated so far.
    fn best(&self) -> Option<&EvaluatedIndividual> {
        self.progress().best.as_ref()
    }

    /// Runs until `problem` asks to stop and decodes the best individual.
    ///
    /// Returns `Ok(None)` when no feasible solution was found.
    fn optimize<P: Problem, M: Monitor>(
        &mut self,
        problem: &P,
        monitor: &mut M,
    ) -> Result<Option<P::Solution>> {
        monitor.on_start(self.name(), self.progress());
        loop {
            self.update_fitness(problem)?;
            self.next_iteration(problem)?;
            monitor.on_iteration(self.name(), self.progress());
            if problem.should_stop(self.progress()) {
                break;
            }
        }
        monitor.on_terminate(self.name(), self.progress());
        match self.best() {
            Some(best) if best.fitness() != INFEASIBLE => Ok(Some(problem.decode(best.individual()))),
            _ => {
                monitor.log(LogLevel::Warn, self.name(), "No feasible solution found");
                Ok(None)
            }
        }
    }
}

/// State shared by the single-sampler executions.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct Core {
    pub(crate) name: String,
    pub(crate) population: Population,
    pub(crate) population_size: usize,
    pub(crate) entry_policy: EntryPolicy,
    pub(crate) progress: Progress,
}

impl Core {
    pub(crate) fn new(name: String, population_size: usize) -> Self {
        Self {
            name,
            population: Population::default(),
            population_size,
            entry_policy: EntryPolicy::ClosedBorder,
            progress: Progress::default(),
        }
    }

    /// Initializes the population if needed, then evaluates it.
    pub(crate) fn update_fitness<P: Problem, S: Sampler>(
        &mut self,
        sampler: &mut S,
        problem: &P,
    ) -> Result<()> {
        if self.population.is_empty() {
            if problem.dimensions() != sampler.dimensions() {
                return Err(EngineError::DimensionMismatch {
                    expected: sampler.dimensions(),
                    actual: problem.dimensions(),
                });
            }
            self.population = sampler.initialize(self.population_size)?;
        }
        self.population = evaluate(problem, &self.population, &mut self.progress)?;
        Ok(())
    }

    pub(crate) fn next_iteration<S: Sampler>(&mut self, sampler: &mut S) -> Result<()> {
        self.progress.iterations += 1;
        self.population = sampler.iterate(&self.population, self.entry_policy)?;
        Ok(())
    }

    pub(crate) fn reinitialize_with<S: Sampler>(
        &mut self,
        sampler: &mut S,
        seed: &Population,
        size: usize,
    ) -> Result<()> {
        self.population_size = size;
        self.population = sampler.initialize_with(seed, size)?;
        Ok(())
    }

    /// The current population, best first when evaluated.
    pub(crate) fn anchor(&self) -> Result<Population> {
        if self.population.is_evaluated() {
            Population::from_evaluated(self.population.sorted_by_fitness()?)
        } else {
            Ok(self.population.clone())
        }
    }
}

/// Evaluates `population`, counts the evaluations and offers its best
/// member to `progress`.
///
/// Fails on the first NaN fitness.
pub(crate) fn evaluate<P: Problem>(
    problem: &P,
    population: &Population,
    progress: &mut Progress,
) -> Result<Population> {
    progress.evaluations += population.len() as u64;
    let fitness = problem.evaluate(population);
    if let Some(index) = fitness.iter().position(|f| f.is_nan()) {
        let genes = population
            .get(index)
            .map(|m| m.keys().to_vec())
            .unwrap_or_default();
        return Err(EngineError::NanFitness { index, genes });
    }
    let evaluated = population.with_fitness(&fitness)?;
    progress.offer(evaluated.best()?);
    Ok(evaluated)
}

/// Sums the evaluations of `children` and offers their first minimum to
/// `progress`.
pub(crate) fn aggregate<E: Execution>(children: &[E], progress: &mut Progress) {
    progress.evaluations = children.iter().map(Execution::evaluations).sum();
    let mut best: Option<&EvaluatedIndividual> = None;
    for candidate in children.iter().filter_map(Execution::best) {
        if best.map_or(true, |b| candidate.fitness() < b.fitness()) {
            best = Some(candidate);
        }
    }
    if let Some(best) = best {
        progress.offer(best);
    }
}

/// Default population size and stagnation threshold for `dimensions` genes.
pub(crate) fn default_size(dimensions: usize) -> usize {
    10 * dimensions
}


#[cfg(test)]
mod tests {
    use super::testing::Sphere;
    use super::*;
    use crate::genotype::Individual;

    struct Broken;

    impl Problem for Broken {
        type Solution = f64;

        fn dimensions(&self) -> usize {
            2
        }

        fn decode(&self, individual: &Individual) -> f64 {
            individual.keys()[0]
        }

        fn objective(&self, x: &f64) -> f64 {
            if *x > 0.5 {
                f64::NAN
            } else {
                *x
            }
        }

        fn should_stop(&self, _progress: &Progress) -> bool {
            true
        }
    }

    fn population(keys: &[f64]) -> Population {
        Population::from_individuals(keys.iter().map(|&k| Individual::new(vec![k, k])).collect())
            .unwrap()
    }

    #[test]
    fn test_evaluate_counts_and_tracks_best() {
        let problem = Sphere {
            dimensions: 2,
            center: 0.0,
            max_evaluations: 0,
        };
        let mut progress = Progress::default();
        let evaluated = evaluate(&problem, &population(&[0.4, 0.1, 0.3]), &mut progress).unwrap();
        assert!(evaluated.is_evaluated());
        assert_eq!(progress.evaluations, 3);
        assert_eq!(progress.best.as_ref().unwrap().keys(), &[0.1, 0.1]);

        evaluate(&problem, &population(&[0.2]), &mut progress).unwrap();
        assert_eq!(progress.evaluations, 4);
        assert_eq!(progress.best.as_ref().unwrap().keys(), &[0.1, 0.1]);
    }

    #[test]
    fn test_offer_prefers_newest_on_ties() {
        let mut progress = Progress::default();
        assert!(progress.offer(&EvaluatedIndividual::new(vec![0.1], 1.0)));
        assert!(progress.offer(&EvaluatedIndividual::new(vec![0.2], 1.0)));
        assert!(!progress.offer(&EvaluatedIndividual::new(vec![0.3], 2.0)));
        assert_eq!(progress.best.unwrap().keys(), &[0.2]);
    }

    #[test]
    fn test_nan_fitness_is_fatal() {
        let mut progress = Progress::default();
        let err = evaluate(&Broken, &population(&[0.1, 0.9, 0.2]), &mut progress).unwrap_err();
        match err {
            EngineError::NanFitness { index, genes } => {
                assert_eq!(index, 1);
                assert_eq!(genes, vec![0.9, 0.9]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Stagnation-triggered restarts.

use super::{default_size, Core, Execution, Progress};
use crate::entry::EntryPolicy;
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Population};
use crate::problem::Problem;
use crate::sampler::{Sampler, SamplerKind};
use tracing::info;

/// Restart policy parameters.
///
/// # Examples
///
/// ```
/// use u_metaopt::execution::RestartConfig;
///
/// let config = RestartConfig::new(5);
/// assert_eq!(config.threshold, 50);
/// assert_eq!(config.growth_factor, 1.0);
///
/// let ipop = RestartConfig::ipop(5);
/// assert_eq!(ipop.population_size, 15);
/// assert_eq!(ipop.growth_factor, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestartConfig {
    /// Iterations without strict improvement tolerated before restarting.
    pub threshold: usize,

    /// Population size used for the first run and for restarts.
    pub population_size: usize,

    /// Factor applied to the population size at every restart.
    pub growth_factor: f64,
}

impl RestartConfig {
    /// Threshold and population of `10 * dimensions`, fixed population.
    pub fn new(dimensions: usize) -> Self {
        Self {
            threshold: default_size(dimensions),
            population_size: default_size(dimensions),
            growth_factor: 1.0,
        }
    }

    /// Increasing-population restarts: starts at `3 * dimensions` and
    /// grows by half at every restart.
    pub fn ipop(dimensions: usize) -> Self {
        Self {
            threshold: default_size(dimensions),
            population_size: 3 * dimensions,
            growth_factor: 1.5,
        }
    }

    /// Sets the stagnation threshold.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the initial population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(1);
        self
    }

    /// Sets the population growth factor applied at each restart.
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(EngineError::InvalidThreshold);
        }
        if self.growth_factor.is_nan() || self.growth_factor < 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "growth_factor must be at least 1.0, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }
}

/// Counts iterations without strict improvement of the best fitness.
///
/// A first evaluation always counts as an improvement.
pub(crate) fn track_stagnation(stagnation: &mut usize, before: Option<f64>, after: Option<f64>) {
    match (before, after) {
        (Some(before), Some(after)) if before <= after => *stagnation += 1,
        _ => *stagnation = 0,
    }
}

/// Reinitializes one sampler around the best member whenever the search
/// stagnates.
///
/// The stagnation check runs at the start of every iteration, so with a
/// threshold `T` on a flat landscape the first restart happens when the
/// iteration counter reads `T + 1`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestartExecution<S: Sampler = SamplerKind> {
    core: Core,
    sampler: S,
    config: RestartConfig,
    stagnation: usize,
    restarts: u64,
}

impl<S: Sampler> RestartExecution<S> {
    /// Creates a restart execution.
    pub fn new(name: impl Into<String>, sampler: S, config: RestartConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            core: Core::new(name.into(), config.population_size),
            sampler,
            config,
            stagnation: 0,
            restarts: 0,
        })
    }

    /// Sets how immigrants enter the population.
    pub fn with_entry_policy(mut self, policy: EntryPolicy) -> Self {
        self.core.entry_policy = policy;
        self
    }

    /// The current population.
    pub fn population(&self) -> &Population {
        &self.core.population
    }

    /// The driven sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// The restart configuration.
    pub fn config(&self) -> &RestartConfig {
        &self.config
    }

    /// Current stagnation counter.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    /// Restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    fn restart_policy<P: Problem>(&mut self, problem: &P) -> Result<()> {
        if self.stagnation <= self.config.threshold {
            return Ok(());
        }
        let size = if self.config.growth_factor > 1.0 {
            (self.core.population_size as f64 * self.config.growth_factor).round() as usize
        } else {
            self.core.population_size
        };
        let anchor = Population::from_evaluated(vec![self.core.population.best()?.clone()])?;
        self.core.reinitialize_with(&mut self.sampler, &anchor, size)?;
        self.restarts += 1;
        info!(
            execution = %self.core.name,
            iteration = self.core.progress.iterations,
            population = size,
            restarts = self.restarts,
            "restarting"
        );
        self.stagnation = 0;
        self.update_fitness(problem)
    }
}

impl<S: Sampler> Execution for RestartExecution<S> {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn progress(&self) -> &Progress {
        &self.core.progress
    }

    fn dimensions(&self) -> usize {
        self.sampler.dimensions()
    }

    fn population_size(&self) -> usize {
        self.core.population_size
    }

    fn update_fitness<P: Problem>(&mut self, problem: &P) -> Result<()> {
        let before = self.core.progress.best_fitness();
        self.core.update_fitness(&mut self.sampler, problem)?;
        track_stagnation(
            &mut self.stagnation,
            before,
            self.core.progress.best_fitness(),
        );
        Ok(())
    }

    fn next_iteration<P: Problem>(&mut self, problem: &P) -> Result<()> {
        self.restart_policy(problem)?;
        self.core.next_iteration(&mut self.sampler)
    }

    fn arrival(&mut self, immigrant: EvaluatedIndividual) {
        self.sampler.arrival(immigrant);
    }

    fn reinitialize_with(&mut self, seed: &Population, size: usize) -> Result<()> {
        self.core.reinitialize_with(&mut self.sampler, seed, size)
    }

    fn reinitialize(&mut self, size: usize) -> Result<()> {
        let seed = self.core.anchor()?;
        self.core.reinitialize_with(&mut self.sampler, &seed, size)
    }
}

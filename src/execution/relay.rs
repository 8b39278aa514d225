//! Sampler relay on stagnation.

use super::restart::track_stagnation;
use super::{default_size, Core, Execution, Progress};
use crate::entry::EntryPolicy;
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Population};
use crate::problem::Problem;
use crate::sampler::{Sampler, SamplerKind};
use tracing::info;

/// Cycles through a fixed list of samplers, handing the population to the
/// next one whenever the search stagnates.
///
/// The incoming sampler is initialized with the whole current population,
/// best member first, at the current population size.
///
/// # Examples
///
/// ```
/// use u_metaopt::cmaes::{CmaConfig, CmaSampler};
/// use u_metaopt::de::{DeConfig, DeSampler};
/// use u_metaopt::execution::{Execution, RelayExecution};
/// use u_metaopt::sampler::{Sampler, SamplerKind};
///
/// let samplers: Vec<SamplerKind> = vec![
///     DeSampler::new(3, DeConfig::default()).unwrap().into(),
///     CmaSampler::new(3, CmaConfig::default()).unwrap().into(),
/// ];
/// let relay = RelayExecution::new("relay", samplers, 30).unwrap();
/// assert_eq!(relay.active_sampler().name(), "de");
/// assert_eq!(relay.population_size(), 30);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelayExecution<S: Sampler = SamplerKind> {
    core: Core,
    samplers: Vec<S>,
    active: usize,
    threshold: usize,
    stagnation: usize,
    relays: u64,
}

impl<S: Sampler> RelayExecution<S> {
    /// Creates a relay over `samplers`, switching after `threshold`
    /// iterations without strict improvement.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyRelay`] without samplers,
    /// [`EngineError::InvalidThreshold`] for a zero threshold and
    /// [`EngineError::DimensionMismatch`] when the samplers disagree on
    /// dimensions.
    pub fn new(name: impl Into<String>, samplers: Vec<S>, threshold: usize) -> Result<Self> {
        let first = samplers.first().ok_or(EngineError::EmptyRelay)?;
        if threshold == 0 {
            return Err(EngineError::InvalidThreshold);
        }
        let dimensions = first.dimensions();
        if let Some(other) = samplers.iter().find(|s| s.dimensions() != dimensions) {
            return Err(EngineError::DimensionMismatch {
                expected: dimensions,
                actual: other.dimensions(),
            });
        }
        Ok(Self {
            core: Core::new(name.into(), default_size(dimensions)),
            samplers,
            active: 0,
            threshold,
            stagnation: 0,
            relays: 0,
        })
    }

    /// Sets the requested population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.core.population_size = size.max(1);
        self
    }

    /// Sets how immigrants enter the population.
    pub fn with_entry_policy(mut self, policy: EntryPolicy) -> Self {
        self.core.entry_policy = policy;
        self
    }

    /// The sampler currently driving the search.
    pub fn active_sampler(&self) -> &S {
        &self.samplers[self.active]
    }

    /// Index of the active sampler.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The current population.
    pub fn population(&self) -> &Population {
        &self.core.population
    }

    /// Sampler switches performed so far.
    pub fn relays(&self) -> u64 {
        self.relays
    }

    fn relay_policy<P: Problem>(&mut self, problem: &P) -> Result<()> {
        if self.stagnation <= self.threshold {
            return Ok(());
        }
        let seed = self.core.anchor()?;
        self.active = (self.active + 1) % self.samplers.len();
        let size = self.core.population_size;
        self.core
            .reinitialize_with(&mut self.samplers[self.active], &seed, size)?;
        self.relays += 1;
        info!(
            execution = %self.core.name,
            iteration = self.core.progress.iterations,
            sampler = self.samplers[self.active].name(),
            population = self.core.population.len(),
            "relayed"
        );
        self.stagnation = 0;
        self.update_fitness(problem)
    }
}

impl<S: Sampler> Execution for RelayExecution<S> {
    fn name(&self) -> &str {
        &self.core.name
    }

    fn progress(&self) -> &Progress {
        &self.core.progress
    }

    fn dimensions(&self) -> usize {
        self.samplers[self.active].dimensions()
    }

    fn population_size(&self) -> usize {
        self.core.population_size
    }

    fn update_fitness<P: Problem>(&mut self, problem: &P) -> Result<()> {
        let before = self.core.progress.best_fitness();
        self.core
            .update_fitness(&mut self.samplers[self.active], problem)?;
        track_stagnation(
            &mut self.stagnation,
            before,
            self.core.progress.best_fitness(),
        );
        Ok(())
    }

    fn next_iteration<P: Problem>(&mut self, problem: &P) -> Result<()> {
        self.relay_policy(problem)?;
        self.core.next_iteration(&mut self.samplers[self.active])
    }

    fn arrival(&mut self, immigrant: EvaluatedIndividual) {
        self.samplers[self.active].arrival(immigrant);
    }

    fn reinitialize_with(&mut self, seed: &Population, size: usize) -> Result<()> {
        self.core
            .reinitialize_with(&mut self.samplers[self.active], seed, size)
    }

    fn reinitialize(&mut self, size: usize) -> Result<()> {
        let seed = self.core.anchor()?;
        self.core
            .reinitialize_with(&mut self.samplers[self.active], &seed, size)
    }
}

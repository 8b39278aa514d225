//! Island model with periodic migration.

use super::{aggregate, Execution, Progress};
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Population};
use crate::problem::{Problem, INFEASIBLE};
use crate::random::{create_rng, EngineRng};
use rand::Rng;
use tracing::debug;

/// How the destination of a migration is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Migration {
    /// Origin and destination are drawn independently and uniformly.
    #[default]
    Uniform,
    /// The destination is the island with the best current fitness; the
    /// origin is drawn uniformly.
    Charity,
}

/// Island model parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IslandConfig {
    /// Migrate every this many iterations.
    pub migration_frequency: u64,

    /// Destination rule.
    pub migration: Migration,

    /// Seed of the migration random generator.
    pub seed: u64,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            migration_frequency: 1,
            migration: Migration::Uniform,
            seed: 0,
        }
    }
}

impl IslandConfig {
    /// Sets how many iterations pass between migrations.
    pub fn with_migration_frequency(mut self, frequency: u64) -> Self {
        self.migration_frequency = frequency;
        self
    }

    /// Sets the migration policy.
    pub fn with_migration(mut self, migration: Migration) -> Self {
        self.migration = migration;
        self
    }

    /// Sets the seed of the migration generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.migration_frequency == 0 {
            return Err("migration_frequency must be at least 1".into());
        }
        Ok(())
    }
}

/// Independent child executions exchanging their best individuals.
///
/// Every `migration_frequency` iterations one origin island sends its best
/// individual to one destination island, which receives it through
/// [`Execution::arrival`]. Drawing the same island twice is a no-op that
/// still counts as an attempt. Islands are stepped sequentially, in order.
///
/// The global best is the first island minimum; evaluations are summed
/// over the islands.
///
/// # Examples
///
/// ```
/// use u_metaopt::execution::{DefaultExecution, Execution, IslandConfig, IslandExecution};
/// use u_metaopt::ga::{GaConfig, GaSampler};
/// use u_metaopt::pso::{PsoConfig, PsoSampler};
/// use u_metaopt::sampler::SamplerKind;
///
/// let islands: Vec<DefaultExecution<SamplerKind>> = vec![
///     DefaultExecution::new("ga", GaSampler::new(2, GaConfig::default()).unwrap().into()),
///     DefaultExecution::new("pso", PsoSampler::new(2, PsoConfig::default()).unwrap().into()),
/// ];
/// let model = IslandExecution::new("islands", islands, IslandConfig::default()).unwrap();
/// assert_eq!(model.population_size(), 40);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IslandExecution<E> {
    name: String,
    islands: Vec<E>,
    config: IslandConfig,
    rng: EngineRng,
    progress: Progress,
    migration_attempts: u64,
    migrations: u64,
}

impl<E: Execution> IslandExecution<E> {
    /// Creates an island model.
    ///
    /// Fails without islands, with an invalid configuration or when the
    /// islands disagree on dimensions.
    pub fn new(name: impl Into<String>, islands: Vec<E>, config: IslandConfig) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let first = islands
            .first()
            .ok_or_else(|| EngineError::InvalidConfig("at least one island is required".into()))?;
        let dimensions = first.dimensions();
        if let Some(other) = islands.iter().find(|i| i.dimensions() != dimensions) {
            return Err(EngineError::DimensionMismatch {
                expected: dimensions,
                actual: other.dimensions(),
            });
        }
        Ok(Self {
            name: name.into(),
            islands,
            rng: create_rng(config.seed),
            config,
            progress: Progress::default(),
            migration_attempts: 0,
            migrations: 0,
        })
    }

    /// The child executions.
    pub fn islands(&self) -> &[E] {
        &self.islands
    }

    /// The migration configuration.
    pub fn config(&self) -> &IslandConfig {
        &self.config
    }

    /// Migration draws so far, including same-island draws.
    pub fn migration_attempts(&self) -> u64 {
        self.migration_attempts
    }

    /// Migrations that actually moved an individual.
    pub fn migrations(&self) -> u64 {
        self.migrations
    }

    pub(crate) fn islands_mut(&mut self) -> &mut [E] {
        &mut self.islands
    }

    /// Increments the iteration counter and returns the new value.
    pub(crate) fn tick(&mut self) -> u64 {
        self.progress.iterations += 1;
        self.progress.iterations
    }

    /// Runs the migration policy for the current iteration.
    pub(crate) fn migrate(&mut self) {
        let frequency = self.config.migration_frequency;
        let iteration = self.progress.iterations;
        if iteration < frequency || iteration % frequency != 0 {
            return;
        }
        self.migration_attempts += 1;
        let count = self.islands.len();
        let destination = match self.config.migration {
            Migration::Uniform => self.rng.random_range(0..count),
            Migration::Charity => best_island(&self.islands),
        };
        let origin = self.rng.random_range(0..count);
        if origin == destination {
            return;
        }
        let Some(immigrant) = self.islands[origin].best().cloned() else {
            return;
        };
        debug!(
            execution = %self.name,
            iteration,
            from = self.islands[origin].name(),
            to = self.islands[destination].name(),
            fitness = immigrant.fitness(),
            "migration"
        );
        self.islands[destination].arrival(immigrant);
        self.migrations += 1;
    }

    /// Advances every island by one iteration.
    pub(crate) fn step<P: Problem>(&mut self, problem: &P) -> Result<()> {
        for island in &mut self.islands {
            island.next_iteration(problem)?;
        }
        Ok(())
    }
}

/// Index of the first island with the lowest best fitness. Islands without
/// a best count as infeasible.
pub(crate) fn best_island<E: Execution>(islands: &[E]) -> usize {
    let mut index = 0;
    let mut value = f64::INFINITY;
    for (i, island) in islands.iter().enumerate() {
        let fitness = island.progress().best_fitness().unwrap_or(INFEASIBLE);
        if fitness < value {
            index = i;
            value = fitness;
        }
    }
    index
}

impl<E: Execution> Execution for IslandExecution<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn dimensions(&self) -> usize {
        self.islands.first().map_or(0, Execution::dimensions)
    }

    fn population_size(&self) -> usize {
        self.islands.iter().map(Execution::population_size).sum()
    }

    fn update_fitness<P: Problem>(&mut self, problem: &P) -> Result<()> {
        for island in &mut self.islands {
            island.update_fitness(problem)?;
        }
        aggregate(&self.islands, &mut self.progress);
        Ok(())
    }

    fn next_iteration<P: Problem>(&mut self, problem: &P) -> Result<()> {
        self.tick();
        self.migrate();
        self.step(problem)
    }

    fn arrival(&mut self, immigrant: EvaluatedIndividual) {
        for island in &mut self.islands {
            island.arrival(immigrant.clone());
        }
    }

    fn reinitialize_with(&mut self, seed: &Population, size: usize) -> Result<()> {
        for island in &mut self.islands {
            island.reinitialize_with(seed, size)?;
        }
        Ok(())
    }

    fn reinitialize(&mut self, size: usize) -> Result<()> {
        for island in &mut self.islands {
            island.reinitialize(size)?;
        }
        Ok(())
    }
}

//! DE generation step.

use super::config::DeConfig;
use crate::error::{EngineError, Result};
use crate::genotype::{Individual, Member, Population};
use crate::random::{create_rng, EngineRng};
use crate::sampler::{check_dimensions, check_seed, Immigration, Sampler};
use rand::Rng;

const MINIMUM_POPULATION: usize = 8;

/// Differential Evolution sampler.
///
/// The population is laid out as two equal halves: the current vectors
/// followed by the trial vectors built from them. Each call to
/// [`sample`](Sampler::sample) first keeps the fitter of every
/// current/trial pair (ties keep the current vector), then builds new
/// trials from the survivors. The comparison of a trial against its parent
/// therefore happens one generation after the trial is created.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeSampler {
    dimensions: usize,
    config: DeConfig,
    rng: EngineRng,
    immigration: Option<Immigration>,
}

impl DeSampler {
    /// Creates a sampler for `dimensions` genes.
    pub fn new(dimensions: usize, config: DeConfig) -> Result<Self> {
        check_dimensions(dimensions)?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            dimensions,
            rng: create_rng(config.seed),
            config,
            immigration: None,
        })
    }

    /// The sampler configuration.
    pub fn config(&self) -> &DeConfig {
        &self.config
    }
}

impl Sampler for DeSampler {
    fn name(&self) -> &'static str {
        "de"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn honor_entry_policy(&self) -> bool {
        true
    }

    fn minimum_population(&self) -> usize {
        MINIMUM_POPULATION.max(2 * self.config.mutation.members())
    }

    fn initialize(&mut self, size: usize) -> Result<Population> {
        let size = 2 * (size.max(self.minimum_population()) / 2);
        let members = (0..size)
            .map(|_| Member::Raw(Individual::random(self.dimensions, &mut self.rng)))
            .collect();
        Ok(Population::from_members(members))
    }

    fn initialize_with(&mut self, seed: &Population, size: usize) -> Result<Population> {
        check_seed(self.dimensions, seed)?;
        let mut population = self.initialize(size)?;
        population.overlay(seed);
        Ok(population)
    }

    fn sample(&mut self, population: &Population) -> Result<Population> {
        let half = population.len() / 2;
        if half < self.config.mutation.members() {
            return Err(EngineError::PopulationSizeMismatch {
                expected: self.minimum_population(),
                actual: population.len(),
            });
        }
        let evaluated = population.evaluated()?;

        // Pairwise selection between the current and trial halves
        let (active, fitness): (Vec<Individual>, Vec<f64>) = (0..half)
            .map(|i| {
                let (current, trial) = (evaluated[i], evaluated[half + i]);
                let winner = if current.fitness() <= trial.fitness() {
                    current
                } else {
                    trial
                };
                (winner.individual().clone(), winner.fitness())
            })
            .unzip();

        let mutants = self
            .config
            .mutation
            .mutants(&active, &fitness, &mut self.rng);
        let trials: Vec<Individual> = active
            .iter()
            .zip(&mutants)
            .map(|(current, mutant)| {
                binomial_crossover(current, mutant, self.config.crossover_rate, &mut self.rng)
            })
            .collect();

        let members = active
            .into_iter()
            .chain(trials)
            .map(Member::Raw)
            .collect();
        Ok(Population::from_members(members))
    }

    fn immigration(&self) -> Option<&Immigration> {
        self.immigration.as_ref()
    }

    fn immigration_mut(&mut self) -> &mut Option<Immigration> {
        &mut self.immigration
    }

    fn rng_mut(&mut self) -> &mut EngineRng {
        &mut self.rng
    }
}

/// Mixes `mutant` into `current` gene by gene.
///
/// Each gene comes from the mutant with probability `rate`; one randomly
/// chosen gene always does.
pub(crate) fn binomial_crossover<R: Rng>(
    current: &Individual,
    mutant: &Individual,
    rate: f64,
    rng: &mut R,
) -> Individual {
    let j_rand = rng.random_range(0..current.dimensions());
    Individual::from_fn(current.dimensions(), |j| {
        if rng.random::<f64>() < rate || j == j_rand {
            mutant[j]
        } else {
            current[j]
        }
    })
}

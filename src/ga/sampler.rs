//! GA generation step.

use super::config::GaConfig;
use crate::error::{EngineError, Result};
use crate::genotype::{Individual, Member, Population};
use crate::random::{create_rng, EngineRng};
use crate::sampler::{check_dimensions, check_seed, Immigration, Sampler};
use rand::Rng;

const MINIMUM_POPULATION: usize = 10;

/// Random-key Genetic Algorithm sampler.
///
/// # Examples
///
/// ```
/// use u_metaopt::ga::{GaConfig, GaSampler};
/// use u_metaopt::sampler::Sampler;
///
/// let mut ga = GaSampler::new(4, GaConfig::default().with_seed(7)).unwrap();
/// // Raised to the minimum population of 10
/// let pop = ga.initialize(3).unwrap();
/// assert_eq!(pop.len(), 10);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaSampler {
    dimensions: usize,
    config: GaConfig,
    rng: EngineRng,
    immigration: Option<Immigration>,
}

impl GaSampler {
    /// Creates a sampler for `dimensions` genes.
    pub fn new(dimensions: usize, config: GaConfig) -> Result<Self> {
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
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Elite and mutant counts for a population of `size`.
    fn partition(&self, size: usize) -> (usize, usize) {
        let elites = ((size as f64 * self.config.elite_ratio).round() as usize).clamp(1, size - 1);
        let mutants =
            ((size as f64 * self.config.mutant_ratio).round() as usize).min(size - elites);
        (elites, mutants)
    }
}

impl Sampler for GaSampler {
    fn name(&self) -> &'static str {
        "ga"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn honor_entry_policy(&self) -> bool {
        true
    }

    fn minimum_population(&self) -> usize {
        MINIMUM_POPULATION
    }

    fn initialize(&mut self, size: usize) -> Result<Population> {
        let size = size.max(MINIMUM_POPULATION);
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
        let size = population.len();
        if size < 2 {
            return Err(EngineError::PopulationSizeMismatch {
                expected: MINIMUM_POPULATION,
                actual: size,
            });
        }
        let sorted = population.sorted_by_fitness()?;
        let (n_elites, n_mutants) = self.partition(size);
        let mut next = Vec::with_capacity(size);

        // Phase 1: elite copy
        for elite in sorted.iter().take(n_elites) {
            next.push(Member::Raw(elite.individual().clone()));
        }

        // Phase 2: mutant injection
        for _ in 0..n_mutants {
            next.push(Member::Raw(Individual::random(self.dimensions, &mut self.rng)));
        }

        // Phase 3: biased uniform crossover
        for _ in 0..(size - n_elites - n_mutants) {
            let elite = sorted[self.rng.random_range(0..n_elites)].keys();
            let other = sorted[self.rng.random_range(n_elites..size)].keys();
            let bias = self.config.bias;
            let rng = &mut self.rng;
            let child = Individual::from_fn(self.dimensions, |i| {
                if rng.random::<f64>() < bias {
                    elite[i]
                } else {
                    other[i]
                }
            });
            next.push(Member::Raw(child));
        }

        Ok(Population::from_members(next))
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

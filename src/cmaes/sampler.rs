//! CMA-ES as a population sampler.

use super::config::CmaConfig;
use super::distribution::SearchDistribution;
use super::termination::Termination;
use crate::error::{EngineError, Result};
use crate::genotype::Population;
use crate::random::{create_rng, EngineRng};
use crate::sampler::{check_dimensions, check_seed, Immigration, Sampler};
use tracing::{debug, info};

const MINIMUM_POPULATION: usize = 6;

/// Covariance Matrix Adaptation Evolution Strategy sampler.
///
/// The population size is the CMA-ES `lambda`. Entry policies are not
/// honored: substituting genotypes would desynchronize the population
/// from the points the distribution sampled. Once a stop condition holds
/// the sampler either returns its input unchanged or, with
/// [`CmaConfig::auto_restart`], starts a fresh distribution around the
/// latest immigrant (or the best member when none arrived).
///
/// ```
/// use u_metaopt::cmaes::{CmaConfig, CmaSampler};
/// use u_metaopt::genotype::{Individual, Population};
/// use u_metaopt::sampler::Sampler;
///
/// let mut cma = CmaSampler::new(2, CmaConfig::default()).unwrap();
/// let seed = Population::from_individuals(vec![Individual::new(vec![0.2, 0.9])]).unwrap();
/// let pop = cma.initialize_with(&seed, 12).unwrap();
/// assert_eq!(pop.len(), 12);
/// assert_eq!(cma.distribution().mean(), &[0.2, 0.9]);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CmaSampler {
    dimensions: usize,
    config: CmaConfig,
    rng: EngineRng,
    immigration: Option<Immigration>,
    distribution: SearchDistribution,
    restarts: u64,
}

impl CmaSampler {
    /// Creates a sampler for `dimensions` genes.
    pub fn new(dimensions: usize, config: CmaConfig) -> Result<Self> {
        check_dimensions(dimensions)?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            dimensions,
            rng: create_rng(config.seed),
            distribution: SearchDistribution::new(dimensions, config.clone()),
            config,
            immigration: None,
            restarts: 0,
        })
    }

    /// The sampler configuration.
    pub fn config(&self) -> &CmaConfig {
        &self.config
    }

    /// The current search distribution.
    pub fn distribution(&self) -> &SearchDistribution {
        &self.distribution
    }

    /// Stop condition currently holding, if any.
    pub fn termination(&self) -> Option<Termination> {
        self.distribution.termination()
    }

    /// Automatic restarts performed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    fn start(&mut self, mean: &[f64], size: usize) -> Result<Population> {
        self.distribution
            .initialize(mean, size.max(MINIMUM_POPULATION))?;
        self.distribution.sample(&mut self.rng)
    }
}

impl Sampler for CmaSampler {
    fn name(&self) -> &'static str {
        "cma-es"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn honor_entry_policy(&self) -> bool {
        false
    }

    fn minimum_population(&self) -> usize {
        MINIMUM_POPULATION
    }

    fn initialize(&mut self, size: usize) -> Result<Population> {
        let mean = vec![self.config.initial_mean; self.dimensions];
        self.start(&mean, size)
    }

    fn initialize_with(&mut self, seed: &Population, size: usize) -> Result<Population> {
        check_seed(self.dimensions, seed)?;
        match seed.get(0) {
            Some(anchor) => {
                let mean = anchor.keys().to_vec();
                self.start(&mean, size)
            }
            None => self.initialize(size),
        }
    }

    fn sample(&mut self, population: &Population) -> Result<Population> {
        if let Some(reason) = self.distribution.termination() {
            if !self.config.auto_restart {
                debug!(%reason, "search distribution exhausted, holding population");
                return Ok(population.clone());
            }
            let anchor = match &self.immigration {
                Some(immigration) => immigration.last.individual().clone(),
                None => population.best()?.individual().clone(),
            };
            self.restarts += 1;
            info!(%reason, restarts = self.restarts, "restarting search distribution");
            let seed = Population::from_individuals(vec![anchor])?;
            return self.initialize_with(&seed, population.len());
        }
        let fitness = population.fitness()?;
        self.distribution.update(&fitness)?;
        self.distribution.sample(&mut self.rng)
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

    fn is_exhausted(&self) -> bool {
        self.distribution.termination().is_some()
    }
}

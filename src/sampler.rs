//! The sampler contract shared by all search algorithms.
//!
//! A [`Sampler`] turns an evaluated population into the next population to
//! evaluate. It owns all algorithm state (velocities, search distribution,
//! immigration record, random generator) and is driven by exactly one
//! [`Execution`](crate::execution::Execution).

use crate::cmaes::CmaSampler;
use crate::de::DeSampler;
use crate::entry::EntryPolicy;
use crate::error::{EngineError, Result};
use crate::ga::GaSampler;
use crate::genotype::{EvaluatedIndividual, Population};
use crate::pso::PsoSampler;
use crate::random::EngineRng;

/// Best-ever and most recent immigrant received by a sampler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Immigration {
    /// Fittest immigrant so far; later arrivals win ties.
    pub best: EvaluatedIndividual,
    /// Latest immigrant.
    pub last: EvaluatedIndividual,
}

impl Immigration {
    /// Starts a record from the first immigrant.
    pub fn new(first: EvaluatedIndividual) -> Self {
        Self {
            best: first.clone(),
            last: first,
        }
    }

    /// Records a new arrival.
    pub fn record(&mut self, individual: EvaluatedIndividual) {
        if individual.fitness() <= self.best.fitness() {
            self.best = individual.clone();
        }
        self.last = individual;
    }
}

/// A population-based search algorithm.
///
/// Populations passed in are never mutated; every step returns a new
/// population. Requested sizes below [`minimum_population`](Self::minimum_population)
/// are raised silently.
pub trait Sampler {
    /// Short algorithm name used in logs.
    fn name(&self) -> &'static str;

    /// Number of genes per individual.
    fn dimensions(&self) -> usize;

    /// Whether immigrants may be injected before sampling.
    fn honor_entry_policy(&self) -> bool;

    /// Smallest population this sampler works with.
    fn minimum_population(&self) -> usize;

    /// Builds a fresh population of (at least) `size` members and resets
    /// the algorithm state.
    fn initialize(&mut self, size: usize) -> Result<Population>;

    /// Like [`initialize`](Self::initialize), then anchors the new
    /// population on `seed`.
    fn initialize_with(&mut self, seed: &Population, size: usize) -> Result<Population>;

    /// One generation step: evaluated population in, raw population out.
    fn sample(&mut self, population: &Population) -> Result<Population>;

    /// Immigration record, if any immigrant has arrived.
    fn immigration(&self) -> Option<&Immigration>;

    /// Mutable access to the immigration record.
    fn immigration_mut(&mut self) -> &mut Option<Immigration>;

    /// The sampler's random generator.
    fn rng_mut(&mut self) -> &mut EngineRng;

    /// Whether the sampler can make no further progress on its own.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Records an incoming immigrant.
    fn arrival(&mut self, individual: EvaluatedIndividual) {
        let slot = self.immigration_mut();
        match slot.as_mut() {
            Some(record) => record.record(individual),
            None => *slot = Some(Immigration::new(individual)),
        }
    }

    /// Applies `policy` (when honored and an immigrant exists), then samples.
    fn iterate(&mut self, population: &Population, policy: EntryPolicy) -> Result<Population> {
        if self.honor_entry_policy() {
            if let Some(immigration) = self.immigration().cloned() {
                let mut population = population.clone();
                policy.apply(&mut population, &immigration, self.rng_mut())?;
                return self.sample(&population);
            }
        }
        self.sample(population)
    }
}

/// Rejects zero-dimensional samplers.
pub(crate) fn check_dimensions(dimensions: usize) -> Result<()> {
    if dimensions == 0 {
        return Err(EngineError::InvalidConfig(
            "dimensions must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Rejects seeds whose dimension differs from the sampler's.
pub(crate) fn check_seed(dimensions: usize, seed: &Population) -> Result<()> {
    match seed.dimensions() {
        Some(actual) if actual != dimensions => Err(EngineError::DimensionMismatch {
            expected: dimensions,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Any of the built-in samplers.
///
/// Lets heterogeneous samplers share one execution type (relay rotations,
/// islands running different algorithms) and serialize as one value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplerKind {
    Ga(GaSampler),
    De(DeSampler),
    Pso(PsoSampler),
    Cma(Box<CmaSampler>),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            SamplerKind::Ga($s) => $body,
            SamplerKind::De($s) => $body,
            SamplerKind::Pso($s) => $body,
            SamplerKind::Cma($s) => $body,
        }
    };
}

impl Sampler for SamplerKind {
    fn name(&self) -> &'static str {
        dispatch!(self, s => s.name())
    }

    fn dimensions(&self) -> usize {
        dispatch!(self, s => s.dimensions())
    }

    fn honor_entry_policy(&self) -> bool {
        dispatch!(self, s => s.honor_entry_policy())
    }

    fn minimum_population(&self) -> usize {
        dispatch!(self, s => s.minimum_population())
    }

    fn initialize(&mut self, size: usize) -> Result<Population> {
        dispatch!(self, s => s.initialize(size))
    }

    fn initialize_with(&mut self, seed: &Population, size: usize) -> Result<Population> {
        dispatch!(self, s => s.initialize_with(seed, size))
    }

    fn sample(&mut self, population: &Population) -> Result<Population> {
        dispatch!(self, s => s.sample(population))
    }

    fn immigration(&self) -> Option<&Immigration> {
        dispatch!(self, s => s.immigration())
    }

    fn immigration_mut(&mut self) -> &mut Option<Immigration> {
        dispatch!(self, s => s.immigration_mut())
    }

    fn rng_mut(&mut self) -> &mut EngineRng {
        dispatch!(self, s => s.rng_mut())
    }

    fn is_exhausted(&self) -> bool {
        dispatch!(self, s => s.is_exhausted())
    }

    fn arrival(&mut self, individual: EvaluatedIndividual) {
        dispatch!(self, s => s.arrival(individual))
    }

    fn iterate(&mut self, population: &Population, policy: EntryPolicy) -> Result<Population> {
        dispatch!(self, s => s.iterate(population, policy))
    }
}

impl From<GaSampler> for SamplerKind {
    fn from(s: GaSampler) -> Self {
        SamplerKind::Ga(s)
    }
}

impl From<DeSampler> for SamplerKind {
    fn from(s: DeSampler) -> Self {
        SamplerKind::De(s)
    }
}

impl From<PsoSampler> for SamplerKind {
    fn from(s: PsoSampler) -> Self {
        SamplerKind::Pso(s)
    }
}

impl From<CmaSampler> for SamplerKind {
    fn from(s: CmaSampler) -> Self {
        SamplerKind::Cma(Box::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::GaConfig;
    use crate::genotype::Individual;

    #[test]
    fn test_immigration_tracks_best_and_last() {
        let mut record = Immigration::new(EvaluatedIndividual::new(vec![0.1], 3.0));
        record.record(EvaluatedIndividual::new(vec![0.2], 1.0));
        record.record(EvaluatedIndividual::new(vec![0.3], 2.0));
        assert_eq!(record.best.keys(), &[0.2]);
        assert_eq!(record.last.keys(), &[0.3]);

        // Ties go to the newcomer
        record.record(EvaluatedIndividual::new(vec![0.4], 1.0));
        assert_eq!(record.best.keys(), &[0.4]);
    }

    #[test]
    fn test_arrival_creates_record() {
        let mut sampler: SamplerKind = GaSampler::new(2, GaConfig::default()).unwrap().into();
        assert!(sampler.immigration().is_none());
        sampler.arrival(EvaluatedIndividual::new(vec![0.5, 0.5], 1.0));
        let record = sampler.immigration().unwrap();
        assert_eq!(record.best, record.last);
    }

    #[test]
    fn test_iterate_applies_entry_policy() {
        let mut sampler: SamplerKind = GaSampler::new(1, GaConfig::default())
            .unwrap()
            .into();
        let pop = sampler.initialize(10).unwrap();
        let fitness: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let evaluated = pop.with_fitness(&fitness).unwrap();

        // The immigrant is the new best, so the GA keeps it as an elite
        sampler.arrival(EvaluatedIndividual::new(vec![0.123], -1.0));
        let next = sampler
            .iterate(&evaluated, EntryPolicy::BestToWorst)
            .unwrap();
        assert_eq!(next.get(0).unwrap().keys(), &[0.123]);
        // Input untouched
        assert_eq!(evaluated.get(9).unwrap().fitness(), Some(9.0));
    }

    #[test]
    fn test_check_seed() {
        let seed = Population::from_individuals(vec![Individual::new(vec![0.1, 0.2])]).unwrap();
        assert!(check_seed(2, &seed).is_ok());
        assert!(matches!(
            check_seed(3, &seed),
            Err(EngineError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(check_seed(3, &Population::default()).is_ok());
    }
}

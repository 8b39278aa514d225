//! PSO generation step.

use super::config::PsoConfig;
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Individual, Member, Population};
use crate::random::{create_rng, EngineRng};
use crate::sampler::{check_dimensions, check_seed, Immigration, Sampler};
use rand::Rng;

const MINIMUM_POPULATION: usize = 5;

/// Particle Swarm Optimization sampler.
///
/// Particle `i` of the swarm is population member `i`. Velocities start
/// uniform in `[0, 1)` per dimension. Positions are not clamped: particles
/// that leave the unit hypercube score as infeasible.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsoSampler {
    dimensions: usize,
    config: PsoConfig,
    rng: EngineRng,
    immigration: Option<Immigration>,
    personal_best: Vec<Option<EvaluatedIndividual>>,
    global_best: Option<EvaluatedIndividual>,
    velocities: Vec<Vec<f64>>,
}

impl PsoSampler {
    /// Creates a sampler for `dimensions` genes.
    pub fn new(dimensions: usize, config: PsoConfig) -> Result<Self> {
        check_dimensions(dimensions)?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            dimensions,
            rng: create_rng(config.seed),
            config,
            immigration: None,
            personal_best: Vec::new(),
            global_best: None,
            velocities: Vec::new(),
        })
    }

    /// The sampler configuration.
    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    /// Best position seen by the whole swarm.
    pub fn global_best(&self) -> Option<&EvaluatedIndividual> {
        self.global_best.as_ref()
    }

    /// Best position seen by each particle.
    pub fn personal_best(&self) -> &[Option<EvaluatedIndividual>] {
        &self.personal_best
    }

    /// Current particle velocities.
    pub fn velocities(&self) -> &[Vec<f64>] {
        &self.velocities
    }

    fn update_bests(&mut self, evaluated: &[&EvaluatedIndividual]) {
        for (slot, &x) in self.personal_best.iter_mut().zip(evaluated) {
            if slot.as_ref().map_or(true, |pb| x.fitness() <= pb.fitness()) {
                *slot = Some(x.clone());
            }
            if self
                .global_best
                .as_ref()
                .map_or(true, |gb| x.fitness() <= gb.fitness())
            {
                self.global_best = Some(x.clone());
            }
        }
    }
}

impl Sampler for PsoSampler {
    fn name(&self) -> &'static str {
        "pso"
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
        let dimensions = self.dimensions;
        self.personal_best = vec![None; size];
        self.global_best = None;
        self.velocities = (0..size)
            .map(|_| (0..dimensions).map(|_| self.rng.random::<f64>()).collect())
            .collect();
        let members = (0..size)
            .map(|_| Member::Raw(Individual::random(dimensions, &mut self.rng)))
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
        if population.len() != self.velocities.len() {
            return Err(EngineError::PopulationSizeMismatch {
                expected: self.velocities.len(),
                actual: population.len(),
            });
        }
        let evaluated = population.evaluated()?;
        self.update_bests(&evaluated);

        let PsoConfig {
            inertia: w,
            cognitive: c1,
            social: c2,
            ..
        } = self.config;
        let mut members = Vec::with_capacity(population.len());
        for (i, x) in evaluated.iter().enumerate() {
            let x = x.keys();
            let (Some(pb), Some(gb)) = (&self.personal_best[i], &self.global_best) else {
                return Err(EngineError::NotEvaluated);
            };
            let velocity = &mut self.velocities[i];
            for j in 0..self.dimensions {
                let r1: f64 = self.rng.random();
                let r2: f64 = self.rng.random();
                velocity[j] = w * velocity[j]
                    + c1 * r1 * (pb.keys()[j] - x[j])
                    + c2 * r2 * (gb.keys()[j] - x[j]);
            }
            members.push(Member::Raw(Individual::from_fn(self.dimensions, |j| {
                x[j] + velocity[j]
            })));
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(pop: &Population) -> Vec<f64> {
        pop.iter()
            .map(|m| {
                if m.individual().is_in_unit_cube() {
                    m.keys().iter().map(|k| (k - 0.5) * (k - 0.5)).sum()
                } else {
                    f64::MAX
                }
            })
            .collect()
    }

    #[test]
    fn test_initialize_state() {
        let mut pso = PsoSampler::new(3, PsoConfig::default()).unwrap();
        let pop = pso.initialize(2).unwrap();
        assert_eq!(pop.len(), 5);
        assert_eq!(pso.velocities().len(), 5);
        assert!(pso
            .velocities()
            .iter()
            .flatten()
            .all(|v| (0.0..1.0).contains(v)));
        assert!(pso.global_best().is_none());
        assert!(pso.personal_best().iter().all(Option::is_none));
    }

    #[test]
    fn test_pure_inertia_moves_by_velocity() {
        let config = PsoConfig::default()
            .with_inertia(1.0)
            .with_cognitive(0.0)
            .with_social(0.0);
        let mut pso = PsoSampler::new(2, config).unwrap();
        let pop = pso.initialize(5).unwrap();
        let v0 = pso.velocities().to_vec();
        let evaluated = pop.with_fitness(&[1.0; 5]).unwrap();
        let next = pso.sample(&evaluated).unwrap();
        for i in 0..5 {
            for j in 0..2 {
                let expected = pop.get(i).unwrap().keys()[j] + v0[i][j];
                assert!((next.get(i).unwrap().keys()[j] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_bests_prefer_newest_on_ties() {
        let mut pso = PsoSampler::new(1, PsoConfig::default()).unwrap();
        let pop = pso.initialize(5).unwrap();
        let evaluated = pop.with_fitness(&[3.0, 1.0, 2.0, 1.0, 4.0]).unwrap();
        pso.sample(&evaluated).unwrap();
        assert_eq!(
            pso.global_best().unwrap().keys(),
            pop.get(3).unwrap().keys()
        );
        assert_eq!(pso.personal_best()[0].as_ref().unwrap().fitness(), 3.0);
    }

    #[test]
    fn test_sample_before_initialize() {
        let mut pso = PsoSampler::new(1, PsoConfig::default()).unwrap();
        let pop = Population::from_individuals(vec![Individual::new(vec![0.5]); 5])
            .unwrap()
            .with_fitness(&[0.0; 5])
            .unwrap();
        assert!(matches!(
            pso.sample(&pop),
            Err(EngineError::PopulationSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_sphere_converges() {
        let mut pso = PsoSampler::new(5, PsoConfig::default().with_seed(3)).unwrap();
        let mut pop = pso.initialize(30).unwrap();
        let mut best = f64::MAX;
        for _ in 0..100 {
            let evaluated = pop.with_fitness(&sphere(&pop)).unwrap();
            best = best.min(evaluated.best().unwrap().fitness());
            pop = pso.sample(&evaluated).unwrap();
        }
        assert!(best < 1e-3, "best = {best}");
        assert_eq!(pso.global_best().unwrap().fitness(), best);
    }
}

//! Island model with adaptive population reallocation.

use super::island::{IslandConfig, IslandExecution};
use super::{Execution, Progress};
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Population};
use crate::problem::{Problem, INFEASIBLE};
use tracing::info;

/// Reallocation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompetitiveConfig {
    /// Reallocate every this many iterations.
    pub adjustment_frequency: u64,

    /// Share of the combined population given to the winning island.
    pub winner_share: f64,
}

impl CompetitiveConfig {
    /// Reallocates every `200 * dimensions` iterations, 80% to the winner.
    pub fn new(dimensions: usize) -> Self {
        Self {
            adjustment_frequency: 200 * dimensions as u64,
            winner_share: 0.8,
        }
    }

    /// Sets how many iterations pass between reallocations.
    pub fn with_adjustment_frequency(mut self, frequency: u64) -> Self {
        self.adjustment_frequency = frequency;
        self
    }

    /// Sets the winner share, clamped to `[0, 1]`.
    pub fn with_winner_share(mut self, share: f64) -> Self {
        self.winner_share = share.clamp(0.0, 1.0);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.adjustment_frequency == 0 {
            return Err("adjustment_frequency must be at least 1".into());
        }
        if !(self.winner_share > 0.0 && self.winner_share <= 1.0) {
            return Err(format!(
                "winner_share must be in (0, 1], got {}",
                self.winner_share
            ));
        }
        Ok(())
    }
}

/// Index of the island with the largest `current - baseline` best-fitness
/// difference. Ties go to the first island.
fn winning_island(baseline: &[f64], current: &[f64]) -> usize {
    let mut winner = 0;
    let mut largest = f64::NEG_INFINITY;
    for (i, (before, now)) in baseline.iter().zip(current).enumerate() {
        let difference = now - before;
        if difference > largest {
            winner = i;
            largest = difference;
        }
    }
    winner
}

/// Island model that periodically moves most of the combined population to
/// a single winning island.
///
/// Every `adjustment_frequency` iterations, the island with the largest
/// `current - baseline` best-fitness difference since the previous check is
/// reinitialized with `winner_share` of the combined population; the others
/// split the rest evenly. All islands are then re-evaluated and their best fitness becomes
/// the new baseline. Migration works as in [`IslandExecution`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompetitiveIslandExecution<E> {
    model: IslandExecution<E>,
    config: CompetitiveConfig,
    baseline: Vec<f64>,
    total_population: usize,
    adjustments: u64,
}

impl<E: Execution> CompetitiveIslandExecution<E> {
    /// Creates a competitive island model. The combined population is
    /// fixed to the islands' initial sizes.
    pub fn new(
        name: impl Into<String>,
        islands: Vec<E>,
        island_config: IslandConfig,
        config: CompetitiveConfig,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let model = IslandExecution::new(name, islands, island_config)?;
        let total_population = model.population_size();
        let baseline = vec![INFEASIBLE; model.islands().len()];
        Ok(Self {
            model,
            config,
            baseline,
            total_population,
            adjustments: 0,
        })
    }

    /// The child executions.
    pub fn islands(&self) -> &[E] {
        self.model.islands()
    }

    /// The underlying island model.
    pub fn model(&self) -> &IslandExecution<E> {
        &self.model
    }

    /// The reallocation configuration.
    pub fn config(&self) -> &CompetitiveConfig {
        &self.config
    }

    /// Reallocations performed so far.
    pub fn adjustments(&self) -> u64 {
        self.adjustments
    }

    fn current_fitness(&self) -> Vec<f64> {
        self.model
            .islands()
            .iter()
            .map(|i| i.progress().best_fitness().unwrap_or(INFEASIBLE))
            .collect()
    }

    fn record_baseline(&mut self) {
        self.baseline = self.current_fitness();
    }

    fn adjustment_policy<P: Problem>(&mut self, problem: &P) -> Result<()> {
        if self.model.iterations() % self.config.adjustment_frequency != 0 {
            return Ok(());
        }
        let winner = winning_island(&self.baseline, &self.current_fitness());
        let total = self.total_population;
        let winner_size =
            ((total as f64 * self.config.winner_share).round() as usize).min(total);
        let islands = self.model.islands_mut();
        if islands[winner].population_size() == winner_size {
            return Ok(());
        }
        let others = islands.len() - 1;
        let other_size = if others > 0 {
            ((total as f64 * (1.0 - self.config.winner_share) / others as f64).round() as usize)
                .max(1)
        } else {
            0
        };
        for (i, island) in islands.iter_mut().enumerate() {
            let size = if i == winner { winner_size } else { other_size };
            island.reinitialize(size)?;
        }
        for island in islands.iter_mut() {
            island.update_fitness(problem)?;
        }
        info!(
            execution = %self.model.name(),
            iteration = self.model.iterations(),
            winner = self.model.islands()[winner].name(),
            winner_size,
            other_size,
            "population reallocated"
        );
        self.adjustments += 1;
        self.record_baseline();
        Ok(())
    }
}

impl<E: Execution> Execution for CompetitiveIslandExecution<E> {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn progress(&self) -> &Progress {
        self.model.progress()
    }

    fn dimensions(&self) -> usize {
        self.model.dimensions()
    }

    fn population_size(&self) -> usize {
        self.model.population_size()
    }

    fn update_fitness<P: Problem>(&mut self, problem: &P) -> Result<()> {
        self.model.update_fitness(problem)
    }

    fn next_iteration<P: Problem>(&mut self, problem: &P) -> Result<()> {
        if self.model.tick() == 1 {
            self.record_baseline();
        }
        self.model.migrate();
        self.adjustment_policy(problem)?;
        self.model.step(problem)
    }

    fn arrival(&mut self, immigrant: EvaluatedIndividual) {
        self.model.arrival(immigrant);
    }

    fn reinitialize_with(&mut self, seed: &Population, size: usize) -> Result<()> {
        self.model.reinitialize_with(seed, size)
    }

    fn reinitialize(&mut self, size: usize) -> Result<()> {
        self.model.reinitialize(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::Sphere;
    use crate::execution::DefaultExecution;
    use crate::pso::{PsoConfig, PsoSampler};

    fn islands(count: usize) -> Vec<DefaultExecution<PsoSampler>> {
        (0..count)
            .map(|i| {
                let pso = PsoSampler::new(2, PsoConfig::default().with_seed(i as u64)).unwrap();
                DefaultExecution::new(format!("pso-{i}"), pso)
            })
            .collect()
    }

    fn sphere() -> Sphere {
        Sphere {
            dimensions: 2,
            center: 0.5,
            max_evaluations: 0,
        }
    }

    #[test]
    fn test_winning_island() {
        // -1 beats -3 and -2
        assert_eq!(winning_island(&[5.0, 5.0, 5.0], &[4.0, 2.0, 3.0]), 0);
        assert_eq!(winning_island(&[5.0, 5.0], &[4.0, 2.0]), 0);
        assert_eq!(winning_island(&[1.0, 1.0], &[0.5, 0.9]), 1);
        // Ties go to the first island
        assert_eq!(winning_island(&[5.0, 5.0], &[5.0, 5.0]), 0);
        assert_eq!(winning_island(&[INFEASIBLE, 1.0], &[1.0, 0.0]), 1);
    }

    #[test]
    fn test_invalid_config() {
        let config = CompetitiveConfig::new(2).with_adjustment_frequency(0);
        assert!(
            CompetitiveIslandExecution::new("c", islands(2), IslandConfig::default(), config)
                .is_err()
        );
        let config = CompetitiveConfig::new(2).with_winner_share(0.0);
        assert!(config.validate().is_err());
        assert_eq!(CompetitiveConfig::new(3).adjustment_frequency, 600);
    }

    #[test]
    fn test_reallocates_to_winner() {
        let config = CompetitiveConfig::new(2).with_adjustment_frequency(3);
        let mut model =
            CompetitiveIslandExecution::new("c", islands(3), IslandConfig::default(), config)
                .unwrap();
        let problem = sphere();
        assert_eq!(model.population_size(), 60);

        for _ in 0..3 {
            model.update_fitness(&problem).unwrap();
            model.next_iteration(&problem).unwrap();
        }
        assert_eq!(model.adjustments(), 1);

        let mut sizes: Vec<usize> = model.islands().iter().map(|i| i.population_size()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![6, 6, 48]);
        for island in model.islands() {
            assert_eq!(island.population().len(), island.population_size());
        }
        // Reallocation re-evaluated every island
        assert!(model.islands().iter().all(|i| i.evaluations() > 60));
    }

    #[test]
    fn test_winner_already_sized_is_skipped() {
        let config = CompetitiveConfig::new(2)
            .with_adjustment_frequency(1)
            .with_winner_share(1.0 / 3.0);
        let mut model =
            CompetitiveIslandExecution::new("c", islands(3), IslandConfig::default(), config)
                .unwrap();
        let problem = sphere();
        model.update_fitness(&problem).unwrap();
        // Every island already holds a third of the combined population
        model.next_iteration(&problem).unwrap();
        assert_eq!(model.adjustments(), 0);
    }

    #[test]
    fn test_optimizes() {
        let config = CompetitiveConfig::new(2).with_adjustment_frequency(10);
        let mut model =
            CompetitiveIslandExecution::new("c", islands(2), IslandConfig::default(), config)
                .unwrap();
        let problem = Sphere {
            dimensions: 2,
            center: 0.5,
            max_evaluations: 4_000,
        };
        model.optimize(&problem, &mut ()).unwrap();
        assert!(model.best().unwrap().fitness() < 1e-2);
    }
}

//! Single-sampler execution.

use super::{default_size, Core, Execution, Progress};
use crate::entry::EntryPolicy;
use crate::error::Result;
use crate::genotype::{EvaluatedIndividual, Population};
use crate::problem::Problem;
use crate::sampler::{Sampler, SamplerKind};

/// Drives one sampler with no intervention.
///
/// # Examples
///
/// ```
/// use u_metaopt::de::{DeConfig, DeSampler};
/// use u_metaopt::execution::{DefaultExecution, Execution, Progress};
/// use u_metaopt::genotype::Individual;
/// use u_metaopt::problem::Problem;
///
/// struct Sphere;
///
/// impl Problem for Sphere {
///     type Solution = Vec<f64>;
///     fn dimensions(&self) -> usize { 2 }
///     fn decode(&self, x: &Individual) -> Vec<f64> { x.keys().to_vec() }
///     fn objective(&self, x: &Vec<f64>) -> f64 {
///         x.iter().map(|v| (v - 0.5) * (v - 0.5)).sum()
///     }
///     fn should_stop(&self, p: &Progress) -> bool { p.evaluations >= 2_000 }
/// }
///
/// let sampler = DeSampler::new(2, DeConfig::default().with_seed(1)).unwrap();
/// let mut execution = DefaultExecution::new("de", sampler);
/// let best = execution.optimize(&Sphere, &mut ()).unwrap().unwrap();
/// assert!((best[0] - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultExecution<S: Sampler = SamplerKind> {
    core: Core,
    sampler: S,
}

impl<S: Sampler> DefaultExecution<S> {
    /// Creates an execution with a population of `10 * dimensions` and
    /// closed borders.
    pub fn new(name: impl Into<String>, sampler: S) -> Self {
        let size = default_size(sampler.dimensions());
        Self {
            core: Core::new(name.into(), size),
            sampler,
        }
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

    /// The current population.
    pub fn population(&self) -> &Population {
        &self.core.population
    }

    /// The driven sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// The entry policy.
    pub fn entry_policy(&self) -> EntryPolicy {
        self.core.entry_policy
    }
}

impl<S: Sampler> Execution for DefaultExecution<S> {
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
        self.core.update_fitness(&mut self.sampler, problem)
    }

    fn next_iteration<P: Problem>(&mut self, _problem: &P) -> Result<()> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmaes::{CmaConfig, CmaSampler};
    use crate::de::{DeConfig, DeSampler};
    use crate::error::EngineError;
    use crate::execution::testing::Sphere;
    use crate::ga::{GaConfig, GaSampler};
    use crate::genotype::Individual;
    use crate::monitor::{LogLevel, Monitor};
    use crate::problem::INFEASIBLE;
    use crate::pso::{PsoConfig, PsoSampler};

    struct Walled;

    impl Problem for Walled {
        type Solution = f64;

        fn dimensions(&self) -> usize {
            2
        }

        fn decode(&self, individual: &Individual) -> f64 {
            individual.keys()[0]
        }

        fn objective(&self, x: &f64) -> f64 {
            *x
        }

        fn is_feasible(&self, _x: &f64) -> bool {
            false
        }

        fn should_stop(&self, progress: &Progress) -> bool {
            progress.iterations >= 3
        }
    }

    #[derive(Default)]
    struct Counter {
        started: usize,
        iterations: usize,
        terminated: usize,
        warnings: usize,
    }

    impl Monitor for Counter {
        fn log(&mut self, level: LogLevel, _execution: &str, _message: &str) {
            if level == LogLevel::Warn {
                self.warnings += 1;
            }
        }

        fn on_start(&mut self, _execution: &str, _progress: &Progress) {
            self.started += 1;
        }

        fn on_iteration(&mut self, _execution: &str, _progress: &Progress) {
            self.iterations += 1;
        }

        fn on_terminate(&mut self, _execution: &str, _progress: &Progress) {
            self.terminated += 1;
        }
    }

    fn sphere(dimensions: usize, max_evaluations: u64) -> Sphere {
        Sphere {
            dimensions,
            center: 0.5,
            max_evaluations,
        }
    }

    // ---- Lifecycle ----

    #[test]
    fn test_first_update_initializes() {
        let ga = GaSampler::new(3, GaConfig::default()).unwrap();
        let mut execution = DefaultExecution::new("ga", ga).with_population_size(12);
        assert_eq!(execution.population_size(), 12);
        assert!(execution.population().is_empty());

        execution.update_fitness(&sphere(3, 0)).unwrap();
        assert_eq!(execution.population().len(), 12);
        assert!(execution.population().is_evaluated());
        assert_eq!(execution.evaluations(), 12);
        assert_eq!(execution.iterations(), 0);
        assert!(execution.best().is_some());

        execution.next_iteration(&sphere(3, 0)).unwrap();
        assert_eq!(execution.iterations(), 1);
        assert!(!execution.population().is_evaluated());
    }

    #[test]
    fn test_default_population_is_ten_per_dimension() {
        let ga = GaSampler::new(4, GaConfig::default()).unwrap();
        let execution = DefaultExecution::new("ga", ga);
        assert_eq!(execution.population_size(), 40);
        assert_eq!(execution.entry_policy(), EntryPolicy::ClosedBorder);
    }

    #[test]
    fn test_dimension_mismatch_with_problem() {
        let ga = GaSampler::new(3, GaConfig::default()).unwrap();
        let mut execution = DefaultExecution::new("ga", ga);
        assert!(matches!(
            execution.update_fitness(&sphere(2, 0)),
            Err(EngineError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_monitor_hooks_fire() {
        let pso = PsoSampler::new(2, PsoConfig::default()).unwrap();
        let mut execution = DefaultExecution::new("pso", pso).with_population_size(10);
        let mut monitor = Counter::default();
        execution.optimize(&sphere(2, 100), &mut monitor).unwrap();
        assert_eq!(monitor.started, 1);
        assert_eq!(monitor.iterations, 10);
        assert_eq!(monitor.terminated, 1);
        assert_eq!(monitor.warnings, 0);
        assert_eq!(execution.iterations(), 10);
        assert_eq!(execution.evaluations(), 100);
    }

    #[test]
    fn test_no_feasible_solution() {
        let ga = GaSampler::new(2, GaConfig::default()).unwrap();
        let mut execution = DefaultExecution::new("ga", ga);
        let mut monitor = Counter::default();
        let result = execution.optimize(&Walled, &mut monitor).unwrap();
        assert!(result.is_none());
        assert_eq!(execution.best().unwrap().fitness(), INFEASIBLE);
        assert_eq!(monitor.warnings, 1);
    }

    #[test]
    fn test_reinitialize_keeps_best_first() {
        let ga = GaSampler::new(2, GaConfig::default().with_seed(3)).unwrap();
        let mut execution = DefaultExecution::new("ga", ga).with_population_size(10);
        execution.update_fitness(&sphere(2, 0)).unwrap();
        let best = execution.population().best().unwrap().keys().to_vec();

        execution.reinitialize(15).unwrap();
        assert_eq!(execution.population_size(), 15);
        assert_eq!(execution.population().len(), 15);
        assert_eq!(execution.population().get(0).unwrap().keys(), best.as_slice());
    }

    #[test]
    fn test_arrival_reaches_sampler() {
        let ga = GaSampler::new(2, GaConfig::default()).unwrap();
        let mut execution = DefaultExecution::new("ga", ga);
        execution.arrival(EvaluatedIndividual::new(vec![0.1, 0.2], 0.5));
        assert!(execution.sampler().immigration().is_some());
    }

    // ---- End to end ----

    #[test]
    fn test_de_sphere_within_budget() {
        let de = DeSampler::new(5, DeConfig::default().with_seed(42)).unwrap();
        let mut execution: DefaultExecution = DefaultExecution::new("de", de.into())
            .with_population_size(40);
        let solution = execution
            .optimize(&sphere(5, 2_000), &mut ())
            .unwrap()
            .unwrap();
        assert!(execution.evaluations() <= 2_000);
        let best = execution.best().unwrap().fitness();
        assert!(best < 1e-6, "best = {best}");
        assert!(solution.iter().all(|x| (x - 0.5).abs() < 1e-3));
    }

    #[test]
    fn test_cma_sphere() {
        let cma = CmaSampler::new(4, CmaConfig::default().with_seed(5)).unwrap();
        let problem = Sphere {
            dimensions: 4,
            center: 0.3,
            max_evaluations: 3_000,
        };
        let mut execution = DefaultExecution::new("cma-es", cma).with_population_size(10);
        execution.optimize(&problem, &mut ()).unwrap();
        let best = execution.best().unwrap().fitness();
        assert!(best < 1e-6, "best = {best}");
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let pso = PsoSampler::new(3, PsoConfig::default().with_seed(8)).unwrap();
            let mut execution = DefaultExecution::new("pso", pso);
            execution.optimize(&sphere(3, 600), &mut ()).unwrap();
            execution.progress().clone()
        };
        assert_eq!(run(), run());
    }
}

//! Suspending and resuming executions.
//!
//! A snapshot captures an execution completely: population, counters,
//! sampler state (CMA-ES distribution included) and random generator
//! positions. Resuming continues exactly where the run was suspended.
//!
//! Snapshots are bincode-encoded, so every floating-point value keeps its
//! exact bit pattern, infinities included.
//!
//! ```
//! use u_metaopt::execution::{DefaultExecution, Execution};
//! use u_metaopt::ga::{GaConfig, GaSampler};
//! use u_metaopt::snapshot::{resume, suspend};
//!
//! let execution = DefaultExecution::new("ga", GaSampler::new(3, GaConfig::default()).unwrap());
//! let bytes = suspend(&execution).unwrap();
//! let restored: DefaultExecution<GaSampler> = resume(&bytes).unwrap();
//! assert_eq!(restored.population_size(), 30);
//! ```

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes `execution` into an opaque byte snapshot.
pub fn suspend<E: Serialize>(execution: &E) -> Result<Vec<u8>> {
    Ok(bincode::serialize(execution)?)
}

/// Restores an execution from a snapshot produced by [`suspend`].
pub fn resume<E: DeserializeOwned>(bytes: &[u8]) -> Result<E> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmaes::{CmaConfig, CmaSampler};
    use crate::de::{DeConfig, DeSampler};
    use crate::error::EngineError;
    use crate::execution::testing::Sphere;
    use crate::execution::{DefaultExecution, Execution, IslandConfig, IslandExecution, Progress};
    use crate::ga::{GaConfig, GaSampler};
    use crate::genotype::Individual;
    use crate::problem::Problem;
    use crate::pso::{PsoConfig, PsoSampler};

    /// Unbounded in both directions near the edges of the cube.
    struct Cliff;

    impl Problem for Cliff {
        type Solution = f64;

        fn dimensions(&self) -> usize {
            3
        }

        fn decode(&self, individual: &Individual) -> f64 {
            individual.keys()[0]
        }

        fn objective(&self, x: &f64) -> f64 {
            if *x > 0.5 {
                f64::INFINITY
            } else if *x < 0.1 {
                f64::NEG_INFINITY
            } else {
                *x
            }
        }

        fn should_stop(&self, _progress: &Progress) -> bool {
            false
        }
    }

    fn sphere() -> Sphere {
        Sphere {
            dimensions: 3,
            center: 0.4,
            max_evaluations: 0,
        }
    }

    fn advance<E: Execution>(execution: &mut E, iterations: usize) {
        let problem = sphere();
        for _ in 0..iterations {
            execution.update_fitness(&problem).unwrap();
            execution.next_iteration(&problem).unwrap();
        }
    }

    #[test]
    fn test_resumed_execution_continues_identically() {
        let de = DeSampler::new(3, DeConfig::default().with_seed(3)).unwrap();
        let mut running: DefaultExecution = DefaultExecution::new("de", de.into());
        advance(&mut running, 5);

        let mut resumed: DefaultExecution = resume(&suspend(&running).unwrap()).unwrap();
        assert_eq!(resumed.progress(), running.progress());

        advance(&mut running, 5);
        advance(&mut resumed, 5);
        assert_eq!(resumed.progress(), running.progress());
        assert_eq!(resumed.population(), running.population());
    }

    #[test]
    fn test_cma_state_survives() {
        let cma = CmaSampler::new(3, CmaConfig::default().with_seed(9)).unwrap();
        let mut running = DefaultExecution::new("cma", cma);
        advance(&mut running, 4);

        let mut resumed: DefaultExecution<CmaSampler> =
            resume(&suspend(&running).unwrap()).unwrap();
        assert_eq!(
            resumed.sampler().distribution().state(),
            running.sampler().distribution().state()
        );
        advance(&mut running, 3);
        advance(&mut resumed, 3);
        assert_eq!(resumed.progress(), running.progress());
        assert_eq!(
            resumed.sampler().distribution().mean(),
            running.sampler().distribution().mean()
        );
    }

    #[test]
    fn test_island_model_round_trip() {
        let islands: Vec<DefaultExecution<PsoSampler>> = (0..2)
            .map(|i| {
                let pso = PsoSampler::new(3, PsoConfig::default().with_seed(i)).unwrap();
                DefaultExecution::new(format!("pso-{i}"), pso)
            })
            .collect();
        let mut running = IslandExecution::new("i", islands, IslandConfig::default()).unwrap();
        advance(&mut running, 3);

        let mut resumed: IslandExecution<DefaultExecution<PsoSampler>> =
            resume(&suspend(&running).unwrap()).unwrap();
        advance(&mut running, 3);
        advance(&mut resumed, 3);
        assert_eq!(resumed.progress(), running.progress());
        assert_eq!(resumed.migrations(), running.migrations());
    }

    #[test]
    fn test_infinite_fitness_survives() {
        let ga = GaSampler::new(3, GaConfig::default().with_seed(11)).unwrap();
        let mut running = DefaultExecution::new("ga", ga);
        running.update_fitness(&Cliff).unwrap();
        let fitness = running.population().fitness().unwrap();
        assert!(fitness.contains(&f64::INFINITY));
        assert!(fitness.contains(&f64::NEG_INFINITY));

        let mut resumed: DefaultExecution<GaSampler> =
            resume(&suspend(&running).unwrap()).unwrap();
        assert_eq!(resumed.population(), running.population());
        assert_eq!(resumed.best().unwrap().fitness(), f64::NEG_INFINITY);

        for _ in 0..3 {
            running.next_iteration(&Cliff).unwrap();
            running.update_fitness(&Cliff).unwrap();
            resumed.next_iteration(&Cliff).unwrap();
            resumed.update_fitness(&Cliff).unwrap();
        }
        assert_eq!(resumed.progress(), running.progress());
        assert_eq!(resumed.population(), running.population());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result: Result<DefaultExecution> = resume(b"not a snapshot");
        assert!(matches!(result, Err(EngineError::Snapshot(_))));
    }
}

//! Population-based black-box optimization engine.
//!
//! Candidate solutions are real-valued genotypes in the unit hypercube. A
//! [`Problem`](problem::Problem) decodes them into domain solutions and
//! scores them; everything else is generic:
//!
//! - **Samplers** turn an evaluated population into the next one:
//!   Genetic Algorithm ([`ga`]), Differential Evolution ([`de`]),
//!   Particle Swarm ([`pso`]) and CMA-ES ([`cmaes`]).
//! - **Entry policies** ([`entry`]) decide how immigrants from other
//!   searches enter a population.
//! - **Executions** ([`execution`]) drive samplers until the problem asks
//!   to stop: plain, restart (including IPOP), relay, island and
//!   competitive island models.
//! - **Monitors** ([`monitor`]) observe runs; [`TracingMonitor`](monitor::TracingMonitor)
//!   forwards to `tracing`.
//!
//! With the `serde` feature, executions can be suspended and resumed
//! ([`snapshot`]).
//!
//! # Example
//!
//! ```
//! use u_metaopt::cmaes::{CmaConfig, CmaSampler};
//! use u_metaopt::execution::{Execution, Progress, RestartConfig, RestartExecution};
//! use u_metaopt::genotype::{value_in, Individual};
//! use u_metaopt::problem::Problem;
//!
//! struct Shifted;
//!
//! impl Problem for Shifted {
//!     type Solution = (f64, f64);
//!
//!     fn dimensions(&self) -> usize { 2 }
//!
//!     fn decode(&self, g: &Individual) -> (f64, f64) {
//!         (value_in(g.keys()[0], -2.0, 2.0), value_in(g.keys()[1], -2.0, 2.0))
//!     }
//!
//!     fn objective(&self, &(x, y): &(f64, f64)) -> f64 {
//!         (x - 1.0).powi(2) + (y + 0.5).powi(2)
//!     }
//!
//!     fn should_stop(&self, progress: &Progress) -> bool {
//!         progress.evaluations >= 5_000
//!     }
//! }
//!
//! let cma = CmaSampler::new(2, CmaConfig::default().with_seed(1)).unwrap();
//! let mut execution = RestartExecution::new("cma", cma, RestartConfig::new(2)).unwrap();
//! let (x, y) = execution.optimize(&Shifted, &mut ()).unwrap().unwrap();
//! assert!((x - 1.0).abs() < 0.01 && (y + 0.5).abs() < 0.01);
//! ```

pub mod cmaes;
pub mod de;
pub mod entry;
pub mod error;
pub mod execution;
pub mod ga;
pub mod genotype;
pub mod monitor;
pub mod problem;
pub mod pso;
pub mod random;
pub mod sampler;
#[cfg(feature = "serde")]
pub mod snapshot;

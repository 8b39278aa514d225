//! Particle Swarm Optimization.
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), *Particle Swarm Optimization*
//! - Clerc & Kennedy (2002), *The particle swarm: explosion, stability, and
//!   convergence in a multidimensional complex space*

mod config;
mod sampler;

pub use config::PsoConfig;
pub use sampler::PsoSampler;

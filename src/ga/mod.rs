//! Random-key Genetic Algorithm.
//!
//! A BRKGA-style sampler: genotypes are random-key vectors in `[0, 1]^n`,
//! sorted by fitness each generation. The next generation is assembled from
//! elites, random mutants and biased-crossover offspring.
//!
//! # Key Types
//!
//! - [`GaConfig`]: elite/mutant fractions and crossover bias
//! - [`GaSampler`]: the [`Sampler`](crate::sampler::Sampler) implementation
//!
//! # References
//!
//! - Bean (1994), *Genetic Algorithms and Random Keys for Sequencing and Optimization*
//! - Goncalves & Resende (2011), *Biased random-key genetic algorithms for combinatorial optimization*

mod config;
mod sampler;

pub use config::GaConfig;
pub use sampler::GaSampler;

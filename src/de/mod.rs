//! Differential Evolution.
//!
//! Vectors are perturbed by scaled differences of other population members
//! ([`Mutation`]) and mixed back into their parents by binomial crossover.
//!
//! # References
//!
//! - Storn & Price (1997), *Differential Evolution: A Simple and Efficient
//!   Heuristic for Global Optimization over Continuous Spaces*
//! - Das & Suganthan (2011), *Differential Evolution: A Survey of the
//!   State-of-the-Art*

mod config;
mod mutation;
mod sampler;

pub use config::DeConfig;
pub use mutation::Mutation;
pub use sampler::DeSampler;

//! Covariance Matrix Adaptation Evolution Strategy.
//!
//! The sampler keeps a multivariate normal search distribution, samples
//! each generation from it and adapts mean, step size and covariance to
//! the ranked fitness values. Numerical safeguards and stop conditions are
//! handled inside [`SearchDistribution`]; the engine only sees
//! [`Sampler::is_exhausted`](crate::sampler::Sampler::is_exhausted).
//!
//! # Key Types
//!
//! - [`CmaConfig`]: initial distribution and stop tolerances
//! - [`CmaSampler`]: the [`Sampler`](crate::sampler::Sampler) implementation
//! - [`SearchDistribution`]: distribution state with a checked [`State`] machine
//! - [`Termination`]: reasons the distribution is exhausted
//!
//! # References
//!
//! - Hansen & Ostermeier (2001), *Completely Derandomized Self-Adaptation
//!   in Evolution Strategies*
//! - Hansen (2016), *The CMA Evolution Strategy: A Tutorial*

mod config;
mod distribution;
mod sampler;
mod termination;

pub use config::CmaConfig;
pub use distribution::{SearchDistribution, State, Strategy};
pub use sampler::CmaSampler;
pub use termination::Termination;

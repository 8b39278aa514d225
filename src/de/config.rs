//! DE configuration.

use super::mutation::Mutation;

/// Configuration for Differential Evolution.
///
/// # Defaults
///
/// ```
/// use u_metaopt::de::{DeConfig, Mutation};
///
/// let config = DeConfig::default();
/// assert_eq!(config.crossover_rate, 0.8);
/// assert_eq!(config.mutation, Mutation::Best1 { f: 0.7 });
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeConfig {
    /// Probability that a trial gene is taken from the mutant (binomial
    /// crossover). One gene per trial always is.
    pub crossover_rate: f64,

    /// Mutation strategy.
    pub mutation: Mutation,

    /// Random seed.
    pub seed: u64,
}

impl Default for DeConfig {
    fn default() -> Self {
        Self {
            crossover_rate: 0.8,
            mutation: Mutation::Best1 { f: 0.7 },
            seed: 0,
        }
    }
}

impl DeConfig {
    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation strategy.
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err("crossover_rate must be in [0, 1]".into());
        }
        if self.mutation.factors().iter().any(|f| !f.is_finite()) {
            return Err("mutation scale factors must be finite".into());
        }
        Ok(())
    }
}

//! GA configuration.
//!
//! [`GaConfig`] holds the population fractions and crossover bias of the
//! random-key genetic algorithm.

/// Configuration for the random-key Genetic Algorithm.
///
/// Each generation is made of three parts: elites copied from the best
/// members, uniformly random mutants, and offspring of biased crossover
/// between an elite and a non-elite parent.
///
/// # Defaults
///
/// ```
/// use u_metaopt::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.elite_ratio, 0.25);
/// assert_eq!(config.mutant_ratio, 0.20);
/// assert_eq!(config.bias, 0.7);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_metaopt::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_elite_ratio(0.1)
///     .with_mutant_ratio(0.15)
///     .with_bias(0.8)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Fraction of the population copied unchanged into the next
    /// generation (rounded to the nearest count, at least one).
    pub elite_ratio: f64,

    /// Fraction of the population replaced by uniformly random genotypes.
    pub mutant_ratio: f64,

    /// Probability that a crossover gene is inherited from the elite parent.
    pub bias: f64,

    /// Random seed.
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            elite_ratio: 0.25,
            mutant_ratio: 0.20,
            bias: 0.7,
            seed: 0,
        }
    }
}

impl GaConfig {
    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutant ratio.
    pub fn with_mutant_ratio(mut self, ratio: f64) -> Self {
        self.mutant_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite inheritance bias.
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias.clamp(0.0, 1.0);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.elite_ratio > 0.0 && self.elite_ratio < 1.0) {
            return Err("elite_ratio must be in (0, 1)".into());
        }
        if !(0.0..1.0).contains(&self.mutant_ratio) {
            return Err("mutant_ratio must be in [0, 1)".into());
        }
        if self.elite_ratio + self.mutant_ratio >= 1.0 {
            return Err(format!(
                "elite_ratio ({}) + mutant_ratio ({}) must be < 1.0",
                self.elite_ratio, self.mutant_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.bias) {
            return Err("bias must be in [0, 1]".into());
        }
        Ok(())
    }
}

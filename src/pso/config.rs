//! PSO configuration.

/// Configuration for Particle Swarm Optimization.
///
/// The defaults are the constriction-equivalent coefficients of Clerc and
/// Kennedy (`w = 0.792`, `c1 = c2 = 1.49`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsoConfig {
    /// Inertia weight `w` applied to the previous velocity.
    pub inertia: f64,

    /// Cognitive coefficient `c1` (pull toward the personal best).
    pub cognitive: f64,

    /// Social coefficient `c2` (pull toward the global best).
    pub social: f64,

    /// Random seed.
    pub seed: u64,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            inertia: 0.792,
            cognitive: 1.49,
            social: 1.49,
            seed: 0,
        }
    }
}

impl PsoConfig {
    /// Sets the inertia weight.
    pub fn with_inertia(mut self, w: f64) -> Self {
        self.inertia = w;
        self
    }

    /// Sets the cognitive (personal best) coefficient.
    pub fn with_cognitive(mut self, c1: f64) -> Self {
        self.cognitive = c1;
        self
    }

    /// Sets the social (global best) coefficient.
    pub fn with_social(mut self, c2: f64) -> Self {
        self.social = c2;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("inertia", self.inertia),
            ("cognitive", self.cognitive),
            ("social", self.social),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be finite"));
            }
            if value < 0.0 {
                return Err(format!("{name} must be non-negative"));
            }
        }
        Ok(())
    }
}

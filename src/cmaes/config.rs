//! CMA-ES configuration.

/// Configuration for the CMA-ES sampler.
///
/// The `stop_*` and `max_*` fields define when the search distribution is
/// considered exhausted; see [`Termination`](super::Termination).
///
/// # Defaults
///
/// ```
/// use u_metaopt::cmaes::CmaConfig;
///
/// let config = CmaConfig::default();
/// assert_eq!(config.initial_mean, 0.5);
/// assert_eq!(config.initial_sigma, 0.2);
/// assert!(!config.auto_restart);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CmaConfig {
    /// Initial mean for every coordinate when no seed is given.
    pub initial_mean: f64,

    /// Initial step size.
    pub initial_sigma: f64,

    /// Reinitialize around the best individual (or the latest immigrant)
    /// when the distribution is exhausted, instead of holding the
    /// population constant.
    pub auto_restart: bool,

    /// Target fitness; reaching it exhausts the distribution.
    pub stop_fitness: f64,

    /// Range of recent and current fitness values below which the search
    /// has converged.
    pub stop_tol_fun: f64,

    /// Range of the best-fitness history below which the search has
    /// stalled.
    pub stop_tol_fun_hist: f64,

    /// Absolute step-size tolerance.
    pub stop_tol_x: f64,

    /// Step-size tolerance relative to the initial sigma. The effective
    /// tolerance is the larger of the two.
    pub stop_tol_x_factor: f64,

    /// Growth of the step size, relative to the initial sigma, that
    /// signals divergence.
    pub stop_tol_up_x_factor: f64,

    /// Evaluation budget of one distribution.
    pub max_evaluations: u64,

    /// Iteration budget of one distribution.
    pub max_iterations: u64,

    /// Random seed.
    pub seed: u64,
}

impl Default for CmaConfig {
    fn default() -> Self {
        Self {
            initial_mean: 0.5,
            initial_sigma: 0.2,
            auto_restart: false,
            stop_fitness: -f64::MAX,
            stop_tol_fun: 1e-12,
            stop_tol_fun_hist: 1e-13,
            stop_tol_x: 0.0,
            stop_tol_x_factor: 1e-11,
            stop_tol_up_x_factor: 1e3,
            max_evaluations: u64::MAX,
            max_iterations: u64::MAX,
            seed: 0,
        }
    }
}

impl CmaConfig {
    /// Sets the initial mean of every coordinate, clamped to `[0, 1]`.
    pub fn with_initial_mean(mut self, mean: f64) -> Self {
        self.initial_mean = mean.clamp(0.0, 1.0);
        self
    }

    /// Sets the initial step size.
    pub fn with_initial_sigma(mut self, sigma: f64) -> Self {
        self.initial_sigma = sigma;
        self
    }

    /// Sets whether an exhausted distribution restarts on its own.
    pub fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    /// Sets the target fitness.
    pub fn with_stop_fitness(mut self, fitness: f64) -> Self {
        self.stop_fitness = fitness;
        self
    }

    /// Sets the fitness range tolerance.
    pub fn with_stop_tol_fun(mut self, tol: f64) -> Self {
        self.stop_tol_fun = tol.max(0.0);
        self
    }

    /// Sets the fitness history tolerance.
    pub fn with_stop_tol_fun_hist(mut self, tol: f64) -> Self {
        self.stop_tol_fun_hist = tol.max(0.0);
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = n;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Effective step-size tolerance for an initial sigma.
    pub fn tol_x(&self) -> f64 {
        self.stop_tol_x.max(self.stop_tol_x_factor * self.initial_sigma)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_sigma.is_finite() && self.initial_sigma > 0.0) {
            return Err("initial_sigma must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.initial_mean) {
            return Err("initial_mean must be in [0, 1]".into());
        }
        if self.stop_tol_x < 0.0 || self.stop_tol_x_factor < 0.0 {
            return Err("step-size tolerances must be non-negative".into());
        }
        if self.stop_tol_up_x_factor <= 0.0 {
            return Err("stop_tol_up_x_factor must be positive".into());
        }
        if self.max_evaluations == 0 || self.max_iterations == 0 {
            return Err("budgets must be at least 1".into());
        }
        Ok(())
    }
}

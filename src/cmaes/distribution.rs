//! The CMA-ES search distribution and its adaptation.

use super::config::CmaConfig;
use super::termination::Termination;
use crate::error::{EngineError, Result};
use crate::genotype::{EvaluatedIndividual, Individual, Member, Population};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lifecycle of a [`SearchDistribution`].
///
/// ```text
/// Uninitialized ──initialize──▶ Initialized ──sample──▶ Sampled
///                                                 ▲          │
///                                                 └─sample── Updated ◀──update──┘
/// ```
///
/// `initialize` is accepted in every state and starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    Uninitialized,
    Initialized,
    Sampled,
    Updated,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::Initialized => "initialized",
            State::Sampled => "sampled",
            State::Updated => "updated",
        }
    }
}

/// Strategy parameters derived from the dimension and the population size.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strategy {
    /// Population size.
    pub lambda: usize,
    /// Number of parents recombined into the new mean.
    pub mu: usize,
    /// Log-decreasing recombination weights, summing to one.
    pub weights: DVector<f64>,
    /// Variance-effective selection mass.
    pub mueff: f64,
    /// Learning rate of the step-size path.
    pub cs: f64,
    /// Step-size damping.
    pub damps: f64,
    /// Learning rate of the covariance path.
    pub cc: f64,
    /// Rank-one versus rank-mu mixing of the covariance update.
    pub mucov: f64,
    /// Covariance learning rate.
    pub ccov: f64,
    /// Expected norm of a standard normal vector.
    pub chi_n: f64,
    /// Length of the best-fitness history.
    pub history_len: usize,
}

impl Strategy {
    /// Computes the default parameters.
    pub fn new(dimensions: usize, lambda: usize, max_iterations: u64, max_evaluations: u64) -> Self {
        let n = dimensions as f64;
        let mu = lambda / 2;

        let raw: Vec<f64> = (0..mu)
            .map(|i| ((mu + 1) as f64).ln() - ((i + 1) as f64).ln())
            .collect();
        let sum: f64 = raw.iter().sum();
        let weights = DVector::from_iterator(mu, raw.iter().map(|w| w / sum));
        let mueff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let cs = (mueff + 2.0) / (n + mueff + 3.0);
        let horizon = (max_iterations as f64).min(max_evaluations as f64 / lambda as f64);
        let damps = (1.0 + 2.0 * (((mueff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0))
            * (1.0 - n / (1e-6 + horizon)).max(0.3)
            + cs;
        let cc = 4.0 / (n + 4.0);
        let mucov = mueff;
        let ccov = 2.0 / (n + 1.41).powi(2) / mucov
            + (1.0 - 1.0 / mucov) * ((2.0 * mueff - 1.0) / (mueff + (n + 2.0).powi(2))).min(1.0);
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));
        let history_len = 10 + (30.0 * n / lambda as f64) as usize;

        Self {
            lambda,
            mu,
            weights,
            mueff,
            cs,
            damps,
            cc,
            mucov,
            ccov,
            chi_n,
            history_len,
        }
    }
}

/// Multivariate normal search distribution `N(mean, sigma² C)`.
///
/// Owns the mean, step size, covariance with its lazily refreshed
/// eigendecomposition `C = B D² Bᵀ`, both evolution paths and the sampled
/// points of the current generation.
///
/// # References
///
/// Hansen & Ostermeier (2001), *Completely Derandomized Self-Adaptation in
/// Evolution Strategies*
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchDistribution {
    dimensions: usize,
    config: CmaConfig,
    strategy: Strategy,
    state: State,
    xmean: DVector<f64>,
    sigma: f64,
    c: DMatrix<f64>,
    b: DMatrix<f64>,
    diag_d: DVector<f64>,
    ps: DVector<f64>,
    pc: DVector<f64>,
    arx: Vec<DVector<f64>>,
    /// Fitness of the last update, ascending.
    fitness: Vec<f64>,
    /// Best fitness of recent updates, newest first.
    history: VecDeque<f64>,
    best_ever: Option<EvaluatedIndividual>,
    count_iter: u64,
    count_eval: u64,
    count_c_updates: u64,
    updates_since_eigen: u64,
}

impl SearchDistribution {
    /// Smallest population the strategy parameters are defined for.
    pub const MINIMUM_LAMBDA: usize = 2;

    /// Creates an uninitialized distribution.
    pub fn new(dimensions: usize, config: CmaConfig) -> Self {
        let mean = vec![config.initial_mean; dimensions];
        let mut distribution = Self {
            dimensions,
            strategy: Strategy::new(
                dimensions,
                Self::MINIMUM_LAMBDA,
                config.max_iterations,
                config.max_evaluations,
            ),
            config,
            state: State::Uninitialized,
            xmean: DVector::from_vec(mean),
            sigma: 0.0,
            c: DMatrix::identity(dimensions, dimensions),
            b: DMatrix::identity(dimensions, dimensions),
            diag_d: DVector::from_element(dimensions, 1.0),
            ps: DVector::zeros(dimensions),
            pc: DVector::zeros(dimensions),
            arx: Vec::new(),
            fitness: Vec::new(),
            history: VecDeque::new(),
            best_ever: None,
            count_iter: 0,
            count_eval: 0,
            count_c_updates: 0,
            updates_since_eigen: 0,
        };
        distribution.sigma = distribution.config.initial_sigma;
        distribution
    }

    /// Resets the distribution around `mean` for populations of `lambda`.
    pub fn initialize(&mut self, mean: &[f64], lambda: usize) -> Result<()> {
        if mean.len() != self.dimensions {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimensions,
                actual: mean.len(),
            });
        }
        if lambda < Self::MINIMUM_LAMBDA {
            return Err(EngineError::InvalidConfig(format!(
                "CMA-ES population must hold at least {} members",
                Self::MINIMUM_LAMBDA
            )));
        }
        let n = self.dimensions;
        self.strategy = Strategy::new(
            n,
            lambda,
            self.config.max_iterations,
            self.config.max_evaluations,
        );
        self.xmean = DVector::from_column_slice(mean);
        self.sigma = self.config.initial_sigma;
        self.c = DMatrix::identity(n, n);
        self.b = DMatrix::identity(n, n);
        self.diag_d = DVector::from_element(n, 1.0);
        self.ps = DVector::zeros(n);
        self.pc = DVector::zeros(n);
        self.arx.clear();
        self.fitness.clear();
        self.history.clear();
        self.best_ever = None;
        self.count_iter = 0;
        self.count_eval = 0;
        self.count_c_updates = 0;
        self.updates_since_eigen = 0;
        self.state = State::Initialized;
        Ok(())
    }

    /// Draws `lambda` points as `mean + sigma · B · (D ∘ z)`.
    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> Result<Population> {
        match self.state {
            State::Initialized => {}
            State::Updated => self.correct_numerics(),
            state => {
                return Err(EngineError::InvalidState {
                    operation: "sample",
                    state: state.name(),
                })
            }
        }
        self.update_eigensystem();
        self.count_iter += 1;

        let n = self.dimensions;
        self.arx = (0..self.strategy.lambda)
            .map(|_| {
                let z = DVector::<f64>::from_fn(n, |_, _| rng.sample(StandardNormal));
                &self.xmean + self.sigma * (&self.b * self.diag_d.component_mul(&z))
            })
            .collect();
        self.state = State::Sampled;

        let members = self
            .arx
            .iter()
            .map(|x| Member::Raw(Individual::new(x.as_slice().to_vec())))
            .collect();
        Ok(Population::from_members(members))
    }

    /// Adapts mean, paths, covariance and step size to the fitness of the
    /// last sampled generation (aligned by index).
    pub fn update(&mut self, fitness: &[f64]) -> Result<()> {
        if self.state != State::Sampled {
            return Err(EngineError::InvalidState {
                operation: "update the distribution",
                state: self.state.name(),
            });
        }
        let lambda = self.strategy.lambda;
        if fitness.len() != lambda {
            return Err(EngineError::FitnessSizeMismatch {
                expected: lambda,
                actual: fitness.len(),
            });
        }

        let mut order: Vec<usize> = (0..lambda).collect();
        order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
        self.fitness = order.iter().map(|&i| fitness[i]).collect();
        self.history.push_front(self.fitness[0]);
        self.history.truncate(self.strategy.history_len);
        if self
            .best_ever
            .as_ref()
            .map_or(true, |best| self.fitness[0] < best.fitness())
        {
            let x = self.arx[order[0]].as_slice().to_vec();
            self.best_ever = Some(EvaluatedIndividual::new(x, self.fitness[0]));
        }
        self.count_eval += lambda as u64;

        let s = &self.strategy;
        let n = self.dimensions as f64;

        // Mean
        let xold = self.xmean.clone();
        let mut xmean = DVector::zeros(self.dimensions);
        for (k, &i) in order.iter().take(s.mu).enumerate() {
            xmean += s.weights[k] * &self.arx[i];
        }
        let bdz = (&xmean - &xold) * (s.mueff.sqrt() / self.sigma);

        // Evolution paths
        let zmean = (self.b.transpose() * &bdz).component_div(&self.diag_d);
        self.ps = (1.0 - s.cs) * &self.ps + (s.cs * (2.0 - s.cs)).sqrt() * (&self.b * zmean);
        let ps_norm = self.ps.norm();
        let hsig = ps_norm / (1.0 - (1.0 - s.cs).powf(2.0 * self.count_iter as f64)).sqrt() / s.chi_n
            < 1.4 + 2.0 / (n + 1.0);
        let h = if hsig { 1.0 } else { 0.0 };
        self.pc = (1.0 - s.cc) * &self.pc + h * (s.cc * (2.0 - s.cc)).sqrt() * &bdz;

        // Covariance: rank-one from pc, rank-mu from the selected steps
        let mut rank_mu = DMatrix::zeros(self.dimensions, self.dimensions);
        for (k, &i) in order.iter().take(s.mu).enumerate() {
            let y = (&self.arx[i] - &xold) / self.sigma;
            rank_mu += s.weights[k] * &y * y.transpose();
        }
        let delta = (1.0 - h) * s.cc * (2.0 - s.cc);
        self.c = (1.0 - s.ccov) * &self.c
            + (s.ccov / s.mucov) * (&self.pc * self.pc.transpose() + delta * &self.c)
            + (s.ccov * (1.0 - 1.0 / s.mucov)) * rank_mu;
        self.count_c_updates += 1;
        self.updates_since_eigen += 1;

        // Step size
        self.sigma *= ((ps_norm / s.chi_n - 1.0) * s.cs / s.damps).exp();
        self.xmean = xmean;
        self.state = State::Updated;
        Ok(())
    }

    /// First stop condition that holds, if any.
    ///
    /// Always `None` until the distribution has been updated at least once.
    pub fn termination(&self) -> Option<Termination> {
        if self.fitness.is_empty() || self.state == State::Uninitialized {
            return None;
        }
        let cfg = &self.config;
        let n = self.dimensions;
        let best = self.fitness[0];
        let worst = self.fitness[self.fitness.len() - 1];

        if best <= cfg.stop_fitness {
            return Some(Termination::TargetFitness);
        }
        if self.count_eval >= cfg.max_evaluations {
            return Some(Termination::MaxEvaluations);
        }
        if self.count_iter >= cfg.max_iterations {
            return Some(Termination::MaxIterations);
        }

        let hist_max = self.history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let hist_min = self.history.iter().cloned().fold(f64::INFINITY, f64::min);
        if self.count_iter > 1 && hist_max.max(worst) - hist_min.min(best) <= cfg.stop_tol_fun {
            return Some(Termination::TolFun);
        }
        let history_len = self.strategy.history_len;
        if self.count_iter as usize > history_len
            && self.history.len() >= history_len
            && hist_max - hist_min <= cfg.stop_tol_fun_hist
        {
            return Some(Termination::TolFunHist);
        }

        let sqrt_diag_c: Vec<f64> = (0..n).map(|i| self.c[(i, i)].sqrt()).collect();
        let tol_x = cfg.tol_x();
        if (0..n).all(|i| self.sigma * sqrt_diag_c[i] < tol_x && (self.sigma * self.pc[i]).abs() < tol_x) {
            return Some(Termination::TolX);
        }
        let max_sqrt_diag_c = sqrt_diag_c.iter().cloned().fold(0.0, f64::max);
        if self.sigma * max_sqrt_diag_c > cfg.stop_tol_up_x_factor * cfg.initial_sigma {
            return Some(Termination::TolUpX);
        }

        let axis = (self.count_iter % n as u64) as usize;
        let step = 0.1 * self.sigma * self.diag_d[axis];
        if (0..n).all(|j| self.xmean[j] == self.xmean[j] + step * self.b[(j, axis)]) {
            return Some(Termination::NoEffectAxis);
        }
        if (0..n).any(|i| self.xmean[i] == self.xmean[i] + 0.2 * self.sigma * sqrt_diag_c[i]) {
            return Some(Termination::NoEffectCoordinate);
        }

        let (min_d, max_d) = (self.diag_d.min(), self.diag_d.max());
        if min_d <= 0.0 || max_d > 1e7 * min_d {
            return Some(Termination::ConditionNumber);
        }
        None
    }

    /// Lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Distribution mean.
    pub fn mean(&self) -> &[f64] {
        self.xmean.as_slice()
    }

    /// Step size.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Covariance matrix (without the `sigma²` factor).
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.c
    }

    /// Strategy parameters in effect.
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Generations sampled since the last initialization.
    pub fn iterations(&self) -> u64 {
        self.count_iter
    }

    /// Fitness values consumed since the last initialization.
    pub fn evaluations(&self) -> u64 {
        self.count_eval
    }

    /// Covariance updates since the last initialization.
    pub fn covariance_updates(&self) -> u64 {
        self.count_c_updates
    }

    /// Best point seen since the last initialization.
    pub fn best_ever(&self) -> Option<&EvaluatedIndividual> {
        self.best_ever.as_ref()
    }

    /// Flat-fitness step-size inflation and covariance rescaling.
    fn correct_numerics(&mut self) {
        let lambda = self.strategy.lambda;
        let median = (lambda - 1).min(lambda / 2 + 1) - 1;
        if !self.fitness.is_empty() && self.fitness[0] == self.fitness[median] {
            self.sigma *= (0.2 + self.strategy.cs / self.strategy.damps).exp();
            warn!(sigma = self.sigma, "flat fitness landscape, step size increased");
        }

        let (min_d, max_d) = (self.diag_d.min(), self.diag_d.max());
        let fac = if max_d > 0.0 && max_d < 1e-6 {
            1.0 / max_d
        } else if min_d > 1e4 {
            1.0 / min_d
        } else {
            1.0
        };
        if fac != 1.0 {
            self.sigma /= fac;
            self.pc *= fac;
            self.diag_d *= fac;
            self.c *= fac * fac;
            debug!(factor = fac, sigma = self.sigma, "covariance scale renormalized");
        }
    }

    /// Refreshes `B` and `D` once enough covariance updates accumulated.
    fn update_eigensystem(&mut self) {
        let threshold = 1.0 / self.strategy.ccov / self.dimensions as f64 / 5.0;
        if (self.updates_since_eigen as f64) < threshold {
            return;
        }
        let eigen = SymmetricEigen::new(self.c.clone());
        self.b = eigen.eigenvectors;
        self.diag_d = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
        self.updates_since_eigen = 0;
    }
}

//! Genotypes: plain and evaluated real-valued key vectors.

use rand::Rng;
use std::cmp::Ordering;
use std::ops::{Add, Index, Mul, Sub};

/// A candidate solution in normalized form.
///
/// An individual is a fixed-length vector of keys. By convention every key
/// lies in `[0, 1]`; a [`Problem`](crate::problem::Problem) maps the unit
/// hypercube to its actual domain. Keys are never modified after
/// construction, arithmetic produces new individuals.
///
/// ```
/// use u_metaopt::genotype::Individual;
///
/// let a = Individual::new(vec![0.2, 0.4]);
/// let b = Individual::new(vec![0.1, 0.1]);
/// let c = &a + &(&b * 2.0);
/// assert_eq!(c.keys(), &[0.4, 0.6]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Individual {
    keys: Vec<f64>,
}

impl Individual {
    /// Wraps a key vector.
    pub fn new(keys: Vec<f64>) -> Self {
        Self { keys }
    }

    /// Builds an individual by evaluating `f` at every index.
    pub fn from_fn(dimensions: usize, f: impl FnMut(usize) -> f64) -> Self {
        Self {
            keys: (0..dimensions).map(f).collect(),
        }
    }

    /// Draws every key uniformly from `[0, 1)`.
    pub fn random<R: Rng>(dimensions: usize, rng: &mut R) -> Self {
        Self::from_fn(dimensions, |_| rng.random_range(0.0..1.0))
    }

    /// Number of keys.
    pub fn dimensions(&self) -> usize {
        self.keys.len()
    }

    /// The key vector.
    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Consumes the individual and returns its keys.
    pub fn into_keys(self) -> Vec<f64> {
        self.keys
    }

    /// Whether every key lies in the closed unit interval.
    ///
    /// NaN keys are outside the interval.
    pub fn is_in_unit_cube(&self) -> bool {
        self.keys.iter().all(|k| (0.0..=1.0).contains(k))
    }

    /// Attaches a fitness value.
    pub fn evaluated(self, fitness: f64) -> EvaluatedIndividual {
        EvaluatedIndividual {
            individual: self,
            fitness,
        }
    }

    fn zip_with(&self, other: &Individual, f: impl Fn(f64, f64) -> f64) -> Individual {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "component-wise operation on individuals of different dimensions"
        );
        Individual {
            keys: self
                .keys
                .iter()
                .zip(other.keys.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

impl From<Vec<f64>> for Individual {
    fn from(keys: Vec<f64>) -> Self {
        Self::new(keys)
    }
}

impl Index<usize> for Individual {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.keys[index]
    }
}

impl Add<&Individual> for &Individual {
    type Output = Individual;

    fn add(self, rhs: &Individual) -> Individual {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub<&Individual> for &Individual {
    type Output = Individual;

    fn sub(self, rhs: &Individual) -> Individual {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<f64> for &Individual {
    type Output = Individual;

    fn mul(self, scalar: f64) -> Individual {
        Individual {
            keys: self.keys.iter().map(|k| k * scalar).collect(),
        }
    }
}

/// An individual with an attached fitness.
///
/// Fitness is always minimized: the [`Problem`](crate::problem::Problem)
/// boundary flips the sign for maximization goals. When two evaluated
/// individuals have equal fitness, every algorithm in this crate keeps the
/// one it encountered first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluatedIndividual {
    individual: Individual,
    fitness: f64,
}

impl EvaluatedIndividual {
    /// Creates an evaluated individual from raw keys.
    pub fn new(keys: Vec<f64>, fitness: f64) -> Self {
        Individual::new(keys).evaluated(fitness)
    }

    /// The fitness value (lower is better).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// The underlying genotype.
    pub fn individual(&self) -> &Individual {
        &self.individual
    }

    /// Drops the fitness and returns the genotype.
    pub fn into_individual(self) -> Individual {
        self.individual
    }

    /// The key vector.
    pub fn keys(&self) -> &[f64] {
        self.individual.keys()
    }

    /// Number of keys.
    pub fn dimensions(&self) -> usize {
        self.individual.dimensions()
    }

    /// Orders two individuals by fitness.
    ///
    /// NaN sorts after every number, so it never wins a comparison.
    pub fn cmp_fitness(&self, other: &EvaluatedIndividual) -> Ordering {
        self.fitness.total_cmp(&other.fitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_arithmetic() {
        let a = Individual::new(vec![1.0, 2.0, 3.0]);
        let b = Individual::new(vec![0.5, 0.5, 0.5]);

        assert_eq!((&a + &b).keys(), &[1.5, 2.5, 3.5]);
        assert_eq!((&a - &b).keys(), &[0.5, 1.5, 2.5]);
        assert_eq!((&a * 2.0).keys(), &[2.0, 4.0, 6.0]);
        // Operands are untouched
        assert_eq!(a.keys(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "different dimensions")]
    fn test_arithmetic_dimension_mismatch() {
        let a = Individual::new(vec![1.0, 2.0]);
        let b = Individual::new(vec![1.0]);
        let _ = &a + &b;
    }

    #[test]
    fn test_random_in_unit_cube() {
        let mut rng = create_rng(3);
        for _ in 0..100 {
            let ind = Individual::random(8, &mut rng);
            assert_eq!(ind.dimensions(), 8);
            assert!(ind.is_in_unit_cube());
        }
    }

    #[test]
    fn test_unit_cube_bounds() {
        assert!(Individual::new(vec![0.0, 1.0]).is_in_unit_cube());
        assert!(!Individual::new(vec![-1e-12, 0.5]).is_in_unit_cube());
        assert!(!Individual::new(vec![0.5, 1.0 + 1e-12]).is_in_unit_cube());
        assert!(!Individual::new(vec![f64::NAN]).is_in_unit_cube());
    }

    #[test]
    fn test_cmp_fitness() {
        let a = EvaluatedIndividual::new(vec![0.1], 1.0);
        let b = EvaluatedIndividual::new(vec![0.2], 2.0);
        assert_eq!(a.cmp_fitness(&b), Ordering::Less);
        assert_eq!(b.cmp_fitness(&a), Ordering::Greater);

        let nan = EvaluatedIndividual::new(vec![0.3], f64::NAN);
        assert_eq!(a.cmp_fitness(&nan), Ordering::Less);
    }
}

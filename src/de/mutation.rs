//! Mutation strategies.

use crate::genotype::Individual;
use rand::seq::index;
use rand::Rng;

/// DE mutation strategy.
///
/// Each strategy builds one mutant vector per active member from the best
/// member, the current member and a handful of distinct random members
/// combined through scaled differences.
///
/// | Strategy | Mutant for member `i` |
/// |---|---|
/// | `Rand1` | `r0 + f·(r1 − r2)` |
/// | `Best1` | `best + f·(r0 − r1)` |
/// | `Best2` | `best + f1·(r0 − r1) + f2·(r2 − r3)` |
/// | `CurrentToRand1` | `x_i + f1·(r0 − r1) + f2·(r2 − r3)` |
/// | `CurrentToBest1` | `x_i + f1·(best − x_i) + f2·(r0 − r1)` |
///
/// # References
///
/// Storn & Price (1997), *Differential Evolution: A Simple and Efficient
/// Heuristic for Global Optimization over Continuous Spaces*
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutation {
    /// DE/rand/1.
    Rand1 { f: f64 },
    /// DE/best/1.
    Best1 { f: f64 },
    /// DE/best/2.
    Best2 { f1: f64, f2: f64 },
    /// DE/current-to-rand/1.
    CurrentToRand1 { f1: f64, f2: f64 },
    /// DE/current-to-best/1.
    CurrentToBest1 { f1: f64, f2: f64 },
}

impl Mutation {
    /// Number of distinct random members drawn per mutant.
    pub fn members(&self) -> usize {
        match self {
            Mutation::Rand1 { .. } => 3,
            Mutation::Best1 { .. } | Mutation::CurrentToBest1 { .. } => 2,
            Mutation::Best2 { .. } | Mutation::CurrentToRand1 { .. } => 4,
        }
    }

    pub(crate) fn factors(&self) -> Vec<f64> {
        match *self {
            Mutation::Rand1 { f } | Mutation::Best1 { f } => vec![f],
            Mutation::Best2 { f1, f2 }
            | Mutation::CurrentToRand1 { f1, f2 }
            | Mutation::CurrentToBest1 { f1, f2 } => vec![f1, f2],
        }
    }

    /// One mutant per member of `active`.
    ///
    /// `active` must hold at least [`members`](Self::members) individuals
    /// and `fitness` must align with it.
    pub(crate) fn mutants<R: Rng>(
        &self,
        active: &[Individual],
        fitness: &[f64],
        rng: &mut R,
    ) -> Vec<Individual> {
        let best = &active[first_minimum(fitness)];
        (0..active.len())
            .map(|i| {
                let picks = index::sample(rng, active.len(), self.members());
                let r = |k: usize| &active[picks.index(k)];
                let x = &active[i];
                match *self {
                    Mutation::Rand1 { f } => r(0) + &(&(r(1) - r(2)) * f),
                    Mutation::Best1 { f } => best + &(&(r(0) - r(1)) * f),
                    Mutation::Best2 { f1, f2 } => {
                        &(best + &(&(r(0) - r(1)) * f1)) + &(&(r(2) - r(3)) * f2)
                    }
                    Mutation::CurrentToRand1 { f1, f2 } => {
                        &(x + &(&(r(0) - r(1)) * f1)) + &(&(r(2) - r(3)) * f2)
                    }
                    Mutation::CurrentToBest1 { f1, f2 } => {
                        &(x + &(&(best - x) * f1)) + &(&(r(0) - r(1)) * f2)
                    }
                }
            })
            .collect()
    }
}

fn first_minimum(values: &[f64]) -> usize {
    let mut index = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[index] {
            index = i;
        }
    }
    index
}

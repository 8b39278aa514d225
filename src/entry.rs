//! Entry policies: how a sampler absorbs immigrants.

use crate::error::Result;
use crate::genotype::Population;
use crate::sampler::Immigration;
use rand::Rng;

/// Rule for injecting an immigrant into an evaluated population.
///
/// Policies are applied by [`Sampler::iterate`](crate::sampler::Sampler::iterate)
/// right before sampling, and only when the sampler honors entry policies
/// and has received at least one immigrant. "Worst" always means the first
/// member with the maximum fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryPolicy {
    /// Immigrants are ignored.
    #[default]
    ClosedBorder,
    /// The latest immigrant replaces a uniformly random member.
    LastToRandom,
    /// The best immigrant replaces the worst member.
    BestToWorst,
    /// The latest immigrant replaces the worst member.
    LastToWorst,
    /// The best immigrant replaces the worst member only if its fitness
    /// is strictly better.
    BestToWorstConditional,
}

impl EntryPolicy {
    /// Applies the policy to `population` in place.
    pub fn apply<R: Rng>(
        &self,
        population: &mut Population,
        immigration: &Immigration,
        rng: &mut R,
    ) -> Result<()> {
        if population.is_empty() {
            return Ok(());
        }
        match self {
            EntryPolicy::ClosedBorder => Ok(()),
            EntryPolicy::LastToRandom => {
                let index = rng.random_range(0..population.len());
                population.set(index, immigration.last.clone())
            }
            EntryPolicy::BestToWorst => {
                let index = population.worst_index()?;
                population.set(index, immigration.best.clone())
            }
            EntryPolicy::LastToWorst => {
                let index = population.worst_index()?;
                population.set(index, immigration.last.clone())
            }
            EntryPolicy::BestToWorstConditional => {
                let index = population.worst_index()?;
                let worst = population.worst()?.fitness();
                if immigration.best.fitness() < worst {
                    population.set(index, immigration.best.clone())?;
                }
                Ok(())
            }
        }
    }
}

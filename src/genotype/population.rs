//! Populations of (possibly evaluated) individuals.

use super::individual::{EvaluatedIndividual, Individual};
use crate::error::{EngineError, Result};

/// One slot of a population: a raw genotype or an evaluated one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Member {
    /// Not yet evaluated.
    Raw(Individual),
    /// Carries a fitness value.
    Evaluated(EvaluatedIndividual),
}

impl Member {
    /// The genotype of this member.
    pub fn individual(&self) -> &Individual {
        match self {
            Member::Raw(ind) => ind,
            Member::Evaluated(ev) => ev.individual(),
        }
    }

    /// The key vector of this member.
    pub fn keys(&self) -> &[f64] {
        self.individual().keys()
    }

    /// Fitness, if evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.as_evaluated().map(EvaluatedIndividual::fitness)
    }

    /// The evaluated individual, if evaluated.
    pub fn as_evaluated(&self) -> Option<&EvaluatedIndividual> {
        match self {
            Member::Raw(_) => None,
            Member::Evaluated(ev) => Some(ev),
        }
    }

    /// Drops any fitness and returns the genotype.
    pub fn into_individual(self) -> Individual {
        match self {
            Member::Raw(ind) => ind,
            Member::Evaluated(ev) => ev.into_individual(),
        }
    }
}

impl From<Individual> for Member {
    fn from(ind: Individual) -> Self {
        Member::Raw(ind)
    }
}

impl From<EvaluatedIndividual> for Member {
    fn from(ev: EvaluatedIndividual) -> Self {
        Member::Evaluated(ev)
    }
}

/// An ordered sequence of individuals sharing one dimension.
///
/// Insertion order is preserved and meaningful: samplers such as
/// differential evolution rely on positional layout. A population is
/// *evaluated* when every member carries a fitness.
///
/// ```
/// use u_metaopt::genotype::{Individual, Population};
///
/// let pop = Population::from_individuals(vec![
///     Individual::new(vec![0.1, 0.2]),
///     Individual::new(vec![0.3, 0.4]),
/// ]).unwrap();
///
/// let evaluated = pop.with_fitness(&[5.0, 3.0]).unwrap();
/// assert_eq!(evaluated.best().unwrap().fitness(), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Population {
    members: Vec<Member>,
}

impl Population {
    /// Builds a population, checking that all members share one dimension.
    pub fn new(members: Vec<Member>) -> Result<Self> {
        if let Some(first) = members.first() {
            let expected = first.keys().len();
            if let Some(bad) = members.iter().find(|m| m.keys().len() != expected) {
                return Err(EngineError::DimensionMismatch {
                    expected,
                    actual: bad.keys().len(),
                });
            }
        }
        Ok(Self { members })
    }

    /// Builds a population of raw individuals.
    pub fn from_individuals(individuals: Vec<Individual>) -> Result<Self> {
        Self::new(individuals.into_iter().map(Member::from).collect())
    }

    /// Builds a population of evaluated individuals.
    pub fn from_evaluated(individuals: Vec<EvaluatedIndividual>) -> Result<Self> {
        Self::new(individuals.into_iter().map(Member::from).collect())
    }

    /// Builds a population whose dimensional consistency is guaranteed by
    /// the caller (samplers generating from a fixed dimension).
    pub(crate) fn from_members(members: Vec<Member>) -> Self {
        debug_assert!(members
            .windows(2)
            .all(|w| w[0].keys().len() == w[1].keys().len()));
        Self { members }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the population has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Shared dimension of the members, `None` when empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.members.first().map(|m| m.keys().len())
    }

    /// All members in order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Member at `index`.
    pub fn get(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// Iterates members in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Replaces the member at `index`.
    pub fn set(&mut self, index: usize, member: impl Into<Member>) -> Result<()> {
        let len = self.len();
        let member = member.into();
        if let Some(expected) = self.dimensions() {
            if member.keys().len() != expected {
                return Err(EngineError::DimensionMismatch {
                    expected,
                    actual: member.keys().len(),
                });
            }
        }
        let slot = self
            .members
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        *slot = member;
        Ok(())
    }

    /// Whether every member carries a fitness.
    pub fn is_evaluated(&self) -> bool {
        self.members.iter().all(|m| m.as_evaluated().is_some())
    }

    /// Attaches one fitness value per member, index for index.
    ///
    /// Any previous fitness is replaced.
    pub fn with_fitness(&self, fitness: &[f64]) -> Result<Population> {
        if self.is_empty() {
            return Err(EngineError::EmptyPopulation);
        }
        if fitness.len() != self.len() {
            return Err(EngineError::FitnessSizeMismatch {
                expected: self.len(),
                actual: fitness.len(),
            });
        }
        let members = self
            .members
            .iter()
            .zip(fitness)
            .map(|(m, &f)| Member::Evaluated(m.individual().clone().evaluated(f)))
            .collect();
        Ok(Population { members })
    }

    /// All members as evaluated individuals, in order.
    pub fn evaluated(&self) -> Result<Vec<&EvaluatedIndividual>> {
        self.members
            .iter()
            .map(|m| m.as_evaluated().ok_or(EngineError::NotEvaluated))
            .collect()
    }

    /// Fitness of every member, in order.
    pub fn fitness(&self) -> Result<Vec<f64>> {
        Ok(self.evaluated()?.iter().map(|e| e.fitness()).collect())
    }

    /// Index of the minimum-fitness member; the first one wins ties.
    pub fn best_index(&self) -> Result<usize> {
        self.extreme_index(|candidate, current| candidate < current)
    }

    /// Index of the maximum-fitness member; the first one wins ties.
    pub fn worst_index(&self) -> Result<usize> {
        self.extreme_index(|candidate, current| candidate > current)
    }

    /// The minimum-fitness member; the first one wins ties.
    pub fn best(&self) -> Result<&EvaluatedIndividual> {
        let index = self.best_index()?;
        self.members[index].as_evaluated().ok_or(EngineError::NotEvaluated)
    }

    /// The maximum-fitness member; the first one wins ties.
    pub fn worst(&self) -> Result<&EvaluatedIndividual> {
        let index = self.worst_index()?;
        self.members[index].as_evaluated().ok_or(EngineError::NotEvaluated)
    }

    /// Evaluated members sorted by ascending fitness.
    ///
    /// The sort is stable, so equal-fitness members keep their order.
    pub fn sorted_by_fitness(&self) -> Result<Vec<EvaluatedIndividual>> {
        let mut sorted: Vec<EvaluatedIndividual> =
            self.evaluated()?.into_iter().cloned().collect();
        sorted.sort_by(|a, b| a.cmp_fitness(b));
        Ok(sorted)
    }

    /// Overwrites the leading members with the genotypes of `seed`, as many
    /// as fit. Overlaid members lose their fitness.
    pub(crate) fn overlay(&mut self, seed: &Population) {
        for (slot, member) in self.members.iter_mut().zip(seed.iter()) {
            *slot = Member::Raw(member.individual().clone());
        }
    }

    fn extreme_index(&self, better: impl Fn(f64, f64) -> bool) -> Result<usize> {
        let evaluated = self.evaluated()?;
        let mut iter = evaluated.iter().enumerate();
        let (mut index, first) = iter.next().ok_or(EngineError::EmptyPopulation)?;
        let mut value = first.fitness();
        for (i, ev) in iter {
            if better(ev.fitness(), value) {
                index = i;
                value = ev.fitness();
            }
        }
        Ok(index)
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl IntoIterator for Population {
    type Item = Member;
    type IntoIter = std::vec::IntoIter<Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(rows: &[&[f64]]) -> Population {
        Population::from_individuals(rows.iter().map(|r| Individual::new(r.to_vec())).collect())
            .unwrap()
    }

    #[test]
    fn test_dimension_invariant() {
        let result = Population::from_individuals(vec![
            Individual::new(vec![0.1, 0.2]),
            Individual::new(vec![0.1]),
        ]);
        assert!(matches!(
            result,
            Err(EngineError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_with_fitness_size_mismatch() {
        let pop = raw(&[&[0.1], &[0.2], &[0.3]]);
        assert!(matches!(
            pop.with_fitness(&[1.0, 2.0]),
            Err(EngineError::FitnessSizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            Population::default().with_fitness(&[]),
            Err(EngineError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_best_requires_evaluation() {
        let pop = raw(&[&[0.1], &[0.2]]);
        assert!(!pop.is_evaluated());
        assert!(matches!(pop.best(), Err(EngineError::NotEvaluated)));
        assert!(matches!(
            Population::default().best(),
            Err(EngineError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_best_and_worst_first_wins_ties() {
        let pop = raw(&[&[0.0], &[0.1], &[0.2], &[0.3]])
            .with_fitness(&[2.0, 1.0, 1.0, 2.0])
            .unwrap();
        assert_eq!(pop.best_index().unwrap(), 1);
        assert_eq!(pop.worst_index().unwrap(), 0);
        assert_eq!(pop.best().unwrap().keys(), &[0.1]);
        assert_eq!(pop.worst().unwrap().keys(), &[0.0]);
    }

    #[test]
    fn test_set_checks_dimension() {
        let mut pop = raw(&[&[0.1, 0.1], &[0.2, 0.2]]);
        assert!(pop.set(0, Individual::new(vec![0.5])).is_err());
        pop.set(1, EvaluatedIndividual::new(vec![0.5, 0.5], 1.0))
            .unwrap();
        assert_eq!(pop.get(1).unwrap().fitness(), Some(1.0));
    }

    #[test]
    fn test_set_out_of_range() {
        let mut pop = raw(&[&[0.1, 0.1], &[0.2, 0.2]]);
        assert!(matches!(
            pop.set(2, Individual::new(vec![0.5, 0.5])),
            Err(EngineError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn test_sorted_is_stable() {
        let pop = raw(&[&[0.0], &[0.1], &[0.2]])
            .with_fitness(&[3.0, 1.0, 1.0])
            .unwrap();
        let sorted = pop.sorted_by_fitness().unwrap();
        let keys: Vec<f64> = sorted.iter().map(|e| e.keys()[0]).collect();
        assert_eq!(keys, vec![0.1, 0.2, 0.0]);
    }

    #[test]
    fn test_overlay() {
        let mut pop = raw(&[&[0.0], &[0.0], &[0.0]]);
        let seed = raw(&[&[0.7], &[0.8]]).with_fitness(&[1.0, 2.0]).unwrap();
        pop.overlay(&seed);
        let keys: Vec<f64> = pop.iter().map(|m| m.keys()[0]).collect();
        assert_eq!(keys, vec![0.7, 0.8, 0.0]);
        assert!(pop.iter().all(|m| m.fitness().is_none()));
    }

    fn population_with_fitness() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
        (1usize..6, 1usize..30).prop_flat_map(|(dim, n)| {
            (
                prop::collection::vec(prop::collection::vec(0.0f64..=1.0, dim), n),
                prop::collection::vec(-1e6f64..1e6, n),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_fitness_round_trip((rows, fitness) in population_with_fitness()) {
            let pop = Population::from_individuals(
                rows.into_iter().map(Individual::new).collect()
            ).unwrap();
            let evaluated = pop.with_fitness(&fitness).unwrap();
            prop_assert!(evaluated.is_evaluated());
            prop_assert_eq!(evaluated.fitness().unwrap(), fitness);
        }

        #[test]
        fn prop_best_is_first_minimum((rows, fitness) in population_with_fitness()) {
            let pop = Population::from_individuals(
                rows.into_iter().map(Individual::new).collect()
            ).unwrap()
            .with_fitness(&fitness)
            .unwrap();
            let min = fitness.iter().cloned().fold(f64::INFINITY, f64::min);
            let first = fitness.iter().position(|&f| f == min).unwrap();
            prop_assert_eq!(pop.best_index().unwrap(), first);
            prop_assert_eq!(pop.best().unwrap().fitness(), min);
        }
    }
}

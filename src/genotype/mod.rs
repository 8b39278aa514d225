//! Genotype and population data model.
//!
//! The search space is always the unit hypercube `[0, 1]^n`. An
//! [`Individual`] is one point in it, an [`EvaluatedIndividual`] carries a
//! fitness, and a [`Population`] is an ordered collection of either.

mod individual;
mod mapping;
mod population;

pub use individual::{EvaluatedIndividual, Individual};
pub use mapping::{int_in, pick, value_in};
pub use population::{Member, Population};

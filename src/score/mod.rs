//! Site-suitability scoring: per-criterion scorers over planar datasets,
//! aggregated into a composite out of a fixed maximum.

mod aggregate;
pub mod criteria;
mod engine;
mod inputs;
mod normalize;
mod result;

pub use aggregate::{aggregate, CompositeScore};
pub use criteria::Criterion;
pub use engine::ScoringEngine;
pub use inputs::{Datasets, Footprint};
pub use normalize::{normalize_all, normalize_collection, normalize_dataset, read_datasets};
pub use result::{ScoreResult, MAX_SCORE, NOT_ASSESSED};

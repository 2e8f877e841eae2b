//! One module per family of criteria. Each criterion is a small stateless
//! value; thresholds that are configurable are copied in at construction.

mod access;
mod classes;
mod coverage;
mod hazard;
mod servicing;
mod shape;
mod terrain;

pub use access::{Ptal, Roads, UdpPrecinct};
pub use classes::{AcidSulfate, Heritage};
pub use coverage::{estimate_coverage, Coverage};
pub use hazard::ProximityHazard;
pub use servicing::Servicing;
pub use shape::{DevelopableSize, SiteRegularity};
pub use terrain::Contour;

use crate::config::ScoringConfig;
use crate::types::Feature;

use super::inputs::{Datasets, Footprint};
use super::result::ScoreResult;

/// A single site-suitability criterion. Implementations are pure.
pub trait Criterion: Send + Sync {
    /// Stable key used in the composite output.
    fn key(&self) -> &'static str;

    /// Score against a footprint that is known to exist.
    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult;

    /// Human-readable explanation of an assessed result.
    fn score_description(&self, result: &ScoreResult) -> String;

    /// Score, then describe. Without a footprint the result is "not assessed".
    fn calculate_score(&self, datasets: &Datasets, footprint: Option<&Footprint>) -> ScoreResult {
        let Some(footprint) = footprint else { return ScoreResult::not_assessed() };
        let mut result = self.assess(datasets, footprint);
        result.description = self.score_description(&result);
        result
    }
}

/// The full criterion set, in output order.
pub fn all(config: &ScoringConfig) -> Vec<Box<dyn Criterion>> {
    vec![
        Box::new(ProximityHazard::flood()),
        Box::new(ProximityHazard::bushfire()),
        Box::new(ProximityHazard::contamination()),
        Box::new(Heritage),
        Box::new(AcidSulfate),
        Box::new(Roads::new(config.road_buffer_m)),
        Box::new(UdpPrecinct),
        Box::new(Ptal),
        Box::new(Coverage::tec(config.estimate_factor)),
        Box::new(Coverage::biodiversity(config.estimate_factor)),
        Box::new(Coverage::buildings(config.estimate_factor)),
        Box::new(Servicing::new(config.service_buffer_m)),
        Box::new(SiteRegularity),
        Box::new(DevelopableSize),
        Box::new(Contour),
    ]
}

/// Closest feature to the footprint and its distance.
fn nearest<'a>(footprint: &Footprint, features: &'a [Feature]) -> Option<(f64, &'a Feature)> {
    features.iter()
        .map(|feature| (footprint.distance(&feature.geometry), feature))
        .filter(|(distance, _)| distance.is_finite())
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

fn intersecting<'a>(footprint: &Footprint, features: &'a [Feature]) -> Vec<&'a Feature> {
    features.iter().filter(|feature| footprint.intersects(&feature.geometry)).collect()
}

/// `" (name)"` or nothing, for appending to descriptions.
fn named(name: Option<&str>) -> String {
    name.map(|n| format!(" ({n})")).unwrap_or_default()
}

use crate::common::feature_name;
use crate::types::Dataset;

use super::{nearest, Criterion, Datasets, Footprint, ScoreResult};

/// Hazards scored by distance: touching (or within `adjacent_m`) ⇒ 1,
/// within `near_m` ⇒ 2, otherwise 3. Missing data is treated as no hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityHazard {
    key: &'static str,
    dataset: Dataset,
    label: &'static str,
    adjacent_m: f64,
    near_m: f64,
}

impl ProximityHazard {
    pub fn flood() -> Self {
        Self { key: "flood", dataset: Dataset::Flood, label: "flooding", adjacent_m: 0.0, near_m: 500.0 }
    }

    pub fn bushfire() -> Self {
        Self { key: "bushfire", dataset: Dataset::Bushfire, label: "bushfire prone land", adjacent_m: 0.0, near_m: 100.0 }
    }

    pub fn contamination() -> Self {
        Self { key: "contamination", dataset: Dataset::Contamination, label: "contaminated land", adjacent_m: 20.0, near_m: 100.0 }
    }

    /// Score for a footprint-to-hazard distance in meters.
    pub fn score_for(&self, distance: f64) -> i64 {
        if distance <= self.adjacent_m { 1 }
        else if distance <= self.near_m { 2 }
        else { 3 }
    }
}

impl Criterion for ProximityHazard {
    fn key(&self) -> &'static str { self.key }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let features = datasets.features(self.dataset);
        let Some((distance, closest)) = nearest(footprint, features) else {
            return ScoreResult::new(3, f64::INFINITY);
        };

        let supporting = features.iter()
            .filter(|feature| footprint.distance(&feature.geometry) <= self.near_m)
            .cloned()
            .collect();

        ScoreResult::new(self.score_for(distance), distance)
            .with_nearest(feature_name(closest))
            .with_supporting(supporting)
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        let label = self.label;
        let distance = result.measure;
        if !distance.is_finite() {
            return format!("No {label} data found near the site.");
        }
        match result.score() {
            1 if distance == 0.0 => format!("Site is impacted by {label}."),
            1 => format!("Site is {distance:.0} m from {label}, inside the {:.0} m buffer.", self.adjacent_m),
            2 => format!("Site is {distance:.0} m from {label}, within {:.0} m.", self.near_m),
            _ => format!("No {label} within {:.0} m of the site.", self.near_m),
        }
    }
}

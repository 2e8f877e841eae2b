use geo::Area;
use tracing::debug;

use crate::geom::boolean::{intersection, union_all};
use crate::types::{Dataset, Feature};

use super::{intersecting, Criterion, Datasets, Footprint, ScoreResult};

/// Coverage in percent when exact intersection is unavailable:
/// `min(covered, footprint) × factor` relative to the footprint.
pub fn estimate_coverage(covered_area: f64, footprint_area: f64, factor: f64) -> f64 {
    if footprint_area <= 0.0 { return 0.0 }
    (covered_area.min(footprint_area) * factor / footprint_area * 100.0).clamp(0.0, 100.0)
}

/// Share of the footprint covered by a dataset: none ⇒ 3, below `partial_below` percent ⇒ 2, otherwise 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    key: &'static str,
    dataset: Dataset,
    label: &'static str,
    partial_below: f64,
    estimate_factor: f64,
}

impl Coverage {
    pub fn tec(estimate_factor: f64) -> Self {
        Self { key: "tec", dataset: Dataset::Tec, label: "threatened ecological communities", partial_below: 50.0, estimate_factor }
    }

    pub fn biodiversity(estimate_factor: f64) -> Self {
        Self { key: "biodiversity", dataset: Dataset::Biodiversity, label: "biodiversity values", partial_below: 50.0, estimate_factor }
    }

    pub fn buildings(estimate_factor: f64) -> Self {
        Self { key: "building_coverage", dataset: Dataset::Buildings, label: "existing buildings", partial_below: 20.0, estimate_factor }
    }

    pub fn score_for(&self, percent: f64) -> i64 {
        if percent <= 0.0 { 3 }
        else if percent < self.partial_below { 2 }
        else { 1 }
    }

    /// Covered percentage and whether it had to be estimated.
    fn covered(&self, footprint: &Footprint, features: &[&Feature]) -> (f64, bool) {
        let cover = union_all(features.iter().filter_map(|feature| feature.areal()).collect());
        if cover.0.is_empty() { return (0.0, false) }

        match intersection(footprint.shape(), &cover) {
            Some(overlap) => ((overlap.unsigned_area() / footprint.area() * 100.0).clamp(0.0, 100.0), false),
            None => {
                debug!(criterion = self.key, "[score] coverage intersection failed, estimating");
                (estimate_coverage(cover.unsigned_area(), footprint.area(), self.estimate_factor), true)
            }
        }
    }
}

impl Criterion for Coverage {
    fn key(&self) -> &'static str { self.key }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let hits = intersecting(footprint, datasets.features(self.dataset));
        let (percent, estimated) = self.covered(footprint, &hits);

        ScoreResult::new(self.score_for(percent), percent)
            .with_estimated(estimated)
            .with_supporting(hits.into_iter().cloned().collect())
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        if result.score() == 3 {
            return format!("No {} on the site.", self.label);
        }
        format!(
            "{:.1}% of the site is covered by {}{}.",
            result.measure,
            self.label,
            if result.estimated { " (estimated)" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::criteria::fixtures::{footprint, square};
    use approx::assert_relative_eq;
    use geo::polygon;

    fn covered_by(width: f64) -> Datasets {
        Datasets::new().with(Dataset::Tec, vec![Feature::new(square(0.0, 0.0, 100.0))])
            .with(Dataset::Biodiversity, vec![Feature::new(geo::polygon![
                (x: 0.0, y: 0.0), (x: width, y: 0.0), (x: width, y: 100.0), (x: 0.0, y: 100.0),
            ])])
    }

    #[test]
    fn coverage_breakpoints() {
        let fp = footprint();
        let biodiversity = Coverage::biodiversity(0.1);

        let partial = biodiversity.calculate_score(&covered_by(40.0), Some(&fp));
        assert_eq!(partial.score(), 2);
        assert_relative_eq!(partial.measure, 40.0, epsilon = 1e-6);
        assert!(!partial.estimated);
        assert!(partial.description.starts_with("40.0%"));

        assert_eq!(biodiversity.calculate_score(&covered_by(60.0), Some(&fp)).score(), 1);
        assert_eq!(Coverage::tec(0.1).calculate_score(&covered_by(60.0), Some(&fp)).score(), 1);
        assert_eq!(biodiversity.calculate_score(&Datasets::new(), Some(&fp)).score(), 3);
    }

    #[test]
    fn buildings_use_twenty_percent() {
        let buildings = Coverage::buildings(0.1);
        assert_eq!(buildings.score_for(0.0), 3);
        assert_eq!(buildings.score_for(15.0), 2);
        assert_eq!(buildings.score_for(20.0), 1);
    }

    #[test]
    fn overlapping_features_are_not_double_counted() {
        let datasets = Datasets::new().with(Dataset::Buildings, vec![
            Feature::new(square(0.0, 0.0, 10.0)),
            Feature::new(square(5.0, 0.0, 10.0)),
        ]);
        let result = Coverage::buildings(0.1).calculate_score(&datasets, Some(&footprint()));
        assert_relative_eq!(result.measure, 1.5, epsilon = 1e-6);
        assert_eq!(result.score(), 2);
    }

    #[test]
    fn estimate_uses_smaller_area_and_factor() {
        assert_relative_eq!(estimate_coverage(5_000.0, 10_000.0, 0.1), 5.0);
        assert_relative_eq!(estimate_coverage(50_000.0, 10_000.0, 0.1), 10.0);
        assert_eq!(estimate_coverage(1.0, 0.0, 0.1), 0.0);
    }

    #[test]
    fn score_never_increases_with_coverage() {
        for coverage in [Coverage::tec(0.1), Coverage::buildings(0.1)] {
            let scores: Vec<i64> = (0..=100).map(|p| coverage.score_for(p as f64)).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

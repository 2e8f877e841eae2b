use std::collections::BTreeMap;

use geo::Rect;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::geom::Projection;
use crate::types::{Dataset, FeatureCollection};

use super::aggregate::{aggregate, CompositeScore};
use super::criteria::{all, Criterion};
use super::inputs::{Datasets, Footprint};
use super::normalize::normalize_all;

/// The full criterion set plus the ceiling used for percentages.
pub struct ScoringEngine {
    criteria: Vec<Box<dyn Criterion>>,
    max_total: f64,
}

impl Default for ScoringEngine {
    fn default() -> Self { Self::new(&ScoringConfig::default()) }
}

impl ScoringEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self { criteria: all(config), max_total: config.max_total }
    }

    /// Engine over a custom criterion list.
    pub fn with_criteria(criteria: Vec<Box<dyn Criterion>>, max_total: f64) -> Self {
        Self { criteria, max_total }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.criteria.iter().map(|criterion| criterion.key())
    }

    /// Score planar inputs. Criteria run in parallel; output keeps criterion order.
    pub fn score(&self, datasets: &Datasets, footprint: Option<&Footprint>) -> CompositeScore {
        let results = self.criteria.par_iter()
            .map(|criterion| (criterion.key().to_string(), criterion.calculate_score(datasets, footprint)))
            .collect::<Vec<_>>();
        aggregate(results, self.max_total)
    }

    /// Score a lon/lat developable-area collection against raw lon/lat datasets.
    /// Everything is projected into one planar frame chosen from the area's extent.
    pub fn score_area(&self, area: &FeatureCollection, raw: &BTreeMap<Dataset, FeatureCollection>) -> CompositeScore {
        let bounds = area.bounds().or_else(|| raw.values().find_map(FeatureCollection::bounds));
        let projection = bounds.as_ref().map(planar_frame).unwrap_or_else(Projection::identity);

        let footprint = Footprint::from_parts(area, &projection);
        if footprint.is_none() {
            warn!("[score] no developable area; criteria will be reported as not assessed");
        }
        let datasets = normalize_all(raw, &projection);

        let composite = self.score(&datasets, footprint.as_ref());
        info!(
            total = composite.total,
            max = composite.max,
            percentage = composite.percentage,
            crs = %projection.label(),
            "[score] scored site",
        );
        composite
    }
}

fn planar_frame(bounds: &Rect<f64>) -> Projection {
    Projection::for_bounds(bounds).unwrap_or_else(|err| {
        warn!("[score] projection setup failed, scoring in input units: {err:#}");
        Projection::identity()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::result::NOT_ASSESSED;
    use crate::types::Feature;
    use geo::polygon;

    fn square(x: f64, y: f64, side: f64) -> Feature {
        Feature::new(polygon![(x: x, y: y), (x: x + side, y: y), (x: x + side, y: y + side), (x: x, y: y + side)])
    }

    #[test]
    fn scores_every_criterion_in_order() {
        let engine = ScoringEngine::default();
        let area = FeatureCollection::new(vec![square(300_000.0, 6_250_000.0, 100.0)]);
        let composite = engine.score_area(&area, &BTreeMap::new());

        let keys: Vec<&str> = composite.criteria.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, engine.keys().collect::<Vec<_>>());
        assert_eq!(composite.max, 48.0);
        assert!(composite.criteria.iter().all(|(_, r)| r.score() <= 3));
        assert_eq!(composite.get("developable_area").map(|r| r.score()), Some(3));
    }

    #[test]
    fn missing_area_is_not_assessed() {
        let composite = ScoringEngine::default().score_area(&FeatureCollection::default(), &BTreeMap::new());
        assert_eq!(composite.total, 0);
        assert!(composite.criteria.iter().all(|(_, r)| !r.assessed && r.description == NOT_ASSESSED));
    }

    #[test]
    fn datasets_share_the_area_projection() {
        // ~110 m square near Sydney with a flood polygon overlapping its east half.
        let area = FeatureCollection::new(vec![Feature::new(polygon![
            (x: 151.000, y: -33.900), (x: 151.001, y: -33.900), (x: 151.001, y: -33.899), (x: 151.000, y: -33.899),
        ])]);
        let flood = FeatureCollection::new(vec![Feature::new(polygon![
            (x: 151.0005, y: -33.901), (x: 151.003, y: -33.901), (x: 151.003, y: -33.898), (x: 151.0005, y: -33.898),
        ])]);
        let raw = BTreeMap::from([(Dataset::Flood, flood)]);

        let composite = ScoringEngine::default().score_area(&area, &raw);
        let flood = composite.get("flood").unwrap();
        assert_eq!(flood.score(), 1);
        assert_eq!(flood.measure, 0.0);
    }
}

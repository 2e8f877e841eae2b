use crate::common::prop_f64;
use crate::types::Dataset;

use super::{intersecting, Criterion, Datasets, Footprint, ScoreResult};

const ELEVATION_KEYS: [&str; 6] = ["elevation", "elev", "height", "contour", "value", "z"];

/// Slope from contours crossing the site: relief under 5 m ⇒ 3, up to 10 m ⇒ 2, steeper ⇒ 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contour;

impl Contour {
    pub fn score_for(relief: f64) -> i64 {
        if relief < 5.0 { 3 }
        else if relief <= 10.0 { 2 }
        else { 1 }
    }
}

impl Criterion for Contour {
    fn key(&self) -> &'static str { "contour" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let contours = intersecting(footprint, datasets.features(Dataset::Contours));
        let elevations: Vec<f64> = contours.iter().filter_map(|c| prop_f64(c, &ELEVATION_KEYS)).collect();
        if elevations.is_empty() {
            return ScoreResult::new(3, f64::INFINITY);
        }

        let min = elevations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = elevations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let relief = max - min;
        ScoreResult::new(Self::score_for(relief), relief)
            .with_supporting(contours.into_iter().cloned().collect())
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        if result.measure.is_finite() {
            format!("Elevation varies by {:.1} m across the site.", result.measure)
        } else {
            "No contour data over the site.".to_string()
        }
    }
}

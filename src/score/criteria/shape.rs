use geo::{Area, MinimumRotatedRect, Simplify};

use crate::geom::interior_angles;

use super::{Criterion, Datasets, Footprint, ScoreResult};

/// Angles further than this from 180° count as corners.
const CORNER_MIN_TURN_DEG: f64 = 15.0;
/// Corners within this many degrees of 90° count as square.
const RIGHT_ANGLE_TOLERANCE_DEG: f64 = 15.0;

/// Whether the largest polygon reduces to four near-right-angle corners.
pub fn is_near_rectangular(footprint: &Footprint) -> bool {
    let Some(largest) = footprint.shape().0.iter().max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area())) else {
        return false;
    };
    let tolerance = 0.02 * largest.unsigned_area().sqrt();
    let ring = largest.exterior().simplify(&tolerance);

    let corners: Vec<f64> = interior_angles(&ring).into_iter()
        .filter(|angle| (180.0 - angle).abs() > CORNER_MIN_TURN_DEG)
        .collect();
    corners.len() == 4 && corners.iter().all(|angle| (angle - 90.0).abs() <= RIGHT_ANGLE_TOLERANCE_DEG)
}

/// Compactness against the minimum rotated rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteRegularity;

impl SiteRegularity {
    pub fn score_for(ratio: f64, near_rectangular: bool) -> i64 {
        if ratio >= 0.75 || (near_rectangular && ratio > 0.4) { 3 }
        else if ratio >= 0.60 { 2 }
        else { 1 }
    }
}

impl Criterion for SiteRegularity {
    fn key(&self) -> &'static str { "site_regularity" }

    fn assess(&self, _datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let rect_area = footprint.shape().minimum_rotated_rect()
            .map(|rect| rect.unsigned_area())
            .filter(|area| *area > 0.0);
        let Some(rect_area) = rect_area else { return ScoreResult::new(1, 0.0) };

        let ratio = (footprint.area() / rect_area).min(1.0);
        let near_rectangular = is_near_rectangular(footprint);
        ScoreResult::new(Self::score_for(ratio, near_rectangular), ratio * 100.0)
            .with_class(near_rectangular.then(|| "near-rectangular".to_string()))
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        let shape = result.class.as_deref().map(|c| format!(", {c}")).unwrap_or_default();
        format!("Site fills {:.0}% of its bounding rectangle{shape}.", result.measure)
    }
}

/// Developable area: ≥4000 m² ⇒ 3, ≥2000 m² ⇒ 2, otherwise 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevelopableSize;

impl DevelopableSize {
    pub fn score_for(area: f64) -> i64 {
        if area >= 4000.0 { 3 }
        else if area >= 2000.0 { 2 }
        else { 1 }
    }
}

impl Criterion for DevelopableSize {
    fn key(&self) -> &'static str { "developable_area" }

    fn assess(&self, _datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        ScoreResult::new(Self::score_for(footprint.area()), footprint.area())
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        format!("Developable area of {:.0} m².", result.measure)
    }
}

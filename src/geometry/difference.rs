use std::f64::consts::PI;

use geo::{Area, BoundingRect, Centroid, Coord, CoordsIter, Intersects, MultiPolygon, Simplify};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DifferenceConfig;
use crate::geom::boolean::{self, guarded};
use crate::geom::{buffer_polygons, circle, rect_around, significant_vertices, Crs, CIRCLE_SEGMENTS};
use crate::types::Feature;

use super::validate::{is_valid, to_geometry, validate};

/// How a subtraction was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Operands do not overlap; base returned unchanged.
    NoOverlap,
    /// Degenerate cutout replaced by a box around its centroid.
    ExpandedBox,
    /// Exact boolean difference of the validated operands.
    Direct,
    /// Both operands buffered by a few millimeters first.
    EpsilonBuffer,
    /// Both operands simplified first.
    Simplified,
    /// Cutout approximated by a circle of equivalent area.
    Circle,
    /// Cutout approximated by circles around its most significant vertices.
    VertexCircles,
    /// Nothing succeeded; base unchanged with an estimated area reduction.
    AreaEstimate,
    /// Nothing succeeded and no estimate was possible.
    Failed,
}

impl Strategy {
    /// Fallback chain attempted once the operands are known to overlap.
    pub const CHAIN: [Strategy; 6] = [
        Strategy::ExpandedBox,
        Strategy::Direct,
        Strategy::EpsilonBuffer,
        Strategy::Simplified,
        Strategy::Circle,
        Strategy::VertexCircles,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Strategy::NoOverlap => "no_overlap",
            Strategy::ExpandedBox => "expanded_box",
            Strategy::Direct => "direct",
            Strategy::EpsilonBuffer => "epsilon_buffer",
            Strategy::Simplified => "simplified",
            Strategy::Circle => "circle",
            Strategy::VertexCircles => "vertex_circles",
            Strategy::AreaEstimate => "area_estimate",
            Strategy::Failed => "failed",
        }
    }

    /// Approximate results; downstream output carries `estimated: true`.
    #[inline]
    pub fn is_estimated(&self) -> bool {
        matches!(self, Strategy::Circle | Strategy::VertexCircles | Strategy::AreaEstimate)
    }
}

/// Outcome of `DifferenceEngine::subtract`.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtraction {
    pub result: MultiPolygon<f64>,
    pub strategy: Strategy,
    /// Area removed by an approximate strategy (m²); 0 for exact strategies.
    pub estimated_reduction: f64,
}

impl Subtraction {
    fn unchanged(base: &MultiPolygon<f64>, strategy: Strategy, estimated_reduction: f64) -> Self {
        Self { result: base.clone(), strategy, estimated_reduction }
    }

    #[inline] pub fn is_estimated(&self) -> bool { self.strategy.is_estimated() }

    #[inline] pub fn is_failed(&self) -> bool { self.strategy == Strategy::Failed }

    /// `true` if the geometry was actually cut.
    #[inline]
    pub fn changed(&self) -> bool {
        !matches!(self.strategy, Strategy::NoOverlap | Strategy::AreaEstimate | Strategy::Failed)
    }
}

fn perimeter(shape: &MultiPolygon<f64>) -> f64 {
    shape.0.iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.0.windows(2))
        .map(|w| (w[1] - w[0]).x.hypot((w[1] - w[0]).y))
        .sum()
}

fn coord_mean(shape: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let (sum, n) = shape.coords_iter().fold((Coord { x: 0.0, y: 0.0 }, 0usize), |(sum, n), c| (sum + c, n + 1));
    (n > 0).then(|| Coord { x: sum.x / n as f64, y: sum.y / n as f64 })
}

fn center(shape: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    guarded(|| shape.centroid()).flatten().map(|p| p.0)
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .or_else(|| coord_mean(shape))
}

fn has_degenerate_ring(shape: &MultiPolygon<f64>) -> bool {
    shape.0.iter().any(|polygon| polygon.exterior().0.len() < 4)
}

/// Accept a planar shape as-is when valid, repaired when possible, raw otherwise.
fn prepared(shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if is_valid(shape) { return shape.clone() }
    validate(shape.clone(), Crs::Projected).map(|v| v.shape).unwrap_or_else(|| shape.clone())
}

/// Polygon difference with a chain of increasingly approximate fallbacks.
/// Operates on planar (meter) geometry and never panics.
#[derive(Debug, Clone)]
pub struct DifferenceEngine {
    config: DifferenceConfig,
    chain: Vec<Strategy>,
}

impl Default for DifferenceEngine {
    fn default() -> Self { Self::new(DifferenceConfig::default()) }
}

impl DifferenceEngine {
    pub fn new(config: DifferenceConfig) -> Self {
        Self { config, chain: Strategy::CHAIN.to_vec() }
    }

    /// Restrict or reorder the fallback chain.
    pub fn with_chain(mut self, chain: impl IntoIterator<Item = Strategy>) -> Self {
        self.chain = chain.into_iter().collect();
        self
    }

    #[inline] pub fn config(&self) -> &DifferenceConfig { &self.config }

    /// Cheap overlap test: bounding boxes first, then an exact `intersects`.
    pub fn overlaps(&self, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> bool {
        let (Some(a), Some(b)) = (base.bounding_rect(), cutout.bounding_rect()) else { return false };
        if !a.intersects(&b) { return false }
        guarded(|| base.intersects(cutout)).unwrap_or(true)
    }

    /// Compute `base − cutout`. The worst case is `base` unchanged.
    pub fn subtract(&self, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Subtraction {
        if base.0.is_empty() || cutout.0.is_empty() || !self.overlaps(base, cutout) {
            return Subtraction::unchanged(base, Strategy::NoOverlap, 0.0);
        }

        let base_area = base.unsigned_area();
        for &strategy in &self.chain {
            let Some(result) = self.attempt(strategy, base, cutout) else {
                debug!("[difference] {} declined", strategy.to_str());
                continue;
            };
            let estimated_reduction = if strategy.is_estimated() {
                (base_area - result.unsigned_area()).max(0.0)
            } else {
                0.0
            };
            debug!("[difference] resolved with {} ({:.1} m² -> {:.1} m²)",
                strategy.to_str(), base_area, result.unsigned_area());
            return Subtraction { result, strategy, estimated_reduction };
        }

        let reduction = base_area.min(guarded(|| cutout.unsigned_area()).unwrap_or(0.0)) * self.config.estimate_factor;
        if reduction.is_finite() && reduction > 0.0 {
            debug!("[difference] all strategies failed, estimating {:.1} m² reduction", reduction);
            Subtraction::unchanged(base, Strategy::AreaEstimate, reduction)
        } else {
            warn!("[difference] all strategies failed, keeping base geometry");
            Subtraction::unchanged(base, Strategy::Failed, 0.0)
        }
    }

    /// Run one strategy. `None` if it does not apply, fails, or its result is rejected.
    pub fn attempt(&self, strategy: Strategy, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        let base_area = base.unsigned_area();
        let result = match strategy {
            Strategy::ExpandedBox => self.expanded_box(base, cutout)?,
            Strategy::Direct => boolean::difference(&prepared(base), &prepared(cutout))?,
            Strategy::EpsilonBuffer => {
                let epsilon = self.config.epsilon_m;
                boolean::difference(&buffer_polygons(base, epsilon), &buffer_polygons(cutout, epsilon))?
            }
            Strategy::Simplified => {
                let tolerance = self.config.simplify_tolerance_m;
                let base = guarded(|| base.simplify(&tolerance))?;
                let cutout = guarded(|| cutout.simplify(&tolerance))?;
                boolean::difference(&base, &cutout)?
            }
            Strategy::Circle => self.circle(base, cutout)?,
            Strategy::VertexCircles => {
                let result = self.vertex_circles(base, cutout)?;
                let reduction = base_area - result.unsigned_area();
                if reduction < self.config.min_area_reduction * base_area { return None }
                result
            }
            Strategy::NoOverlap | Strategy::AreaEstimate | Strategy::Failed => return None,
        };

        let slack = match strategy {
            Strategy::EpsilonBuffer => 2.0 * perimeter(base) * self.config.epsilon_m,
            Strategy::Simplified => perimeter(base) * self.config.simplify_tolerance_m,
            _ => 0.0,
        } + base_area * 1e-9 + 1e-6;

        let area = result.unsigned_area();
        (boolean::is_finite(&result) && area.is_finite() && area <= base_area + slack).then_some(result)
    }

    /// Degenerate cutouts (rings under four points) become a box at least `min_cutout_box_m` wide.
    fn expanded_box(&self, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        if !has_degenerate_ring(cutout) { return None }
        let center = coord_mean(cutout)?;
        let extent = cutout.bounding_rect()?;
        let half = self.config.min_cutout_box_m / 2.0;
        let cutter = rect_around(center, (extent.width() / 2.0).max(half), (extent.height() / 2.0).max(half));
        boolean::difference(base, &MultiPolygon::new(vec![cutter]))
    }

    /// Cut a disc of the cutout's equivalent radius (scaled) from `base`.
    /// The disc is not clipped first: the difference only removes what lies inside `base`.
    fn circle(&self, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        let center = center(cutout)?;
        let equivalent = (cutout.unsigned_area() / PI).sqrt();
        let radius = (equivalent * self.config.circle_scale).max(self.config.min_circle_radius_m);
        let disc = MultiPolygon::new(vec![circle(center, radius, CIRCLE_SEGMENTS)]);
        boolean::difference(base, &disc)
    }

    fn vertex_circles(&self, base: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        let largest = cutout.0.iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))?;
        let vertices = significant_vertices(largest.exterior(), self.config.max_buffer_vertices);
        if vertices.is_empty() { return None }

        let radius = ((cutout.unsigned_area() / PI).sqrt() * 0.5).max(self.config.min_cutout_box_m);
        let discs = boolean::union_all(vertices.iter()
            .map(|&v| MultiPolygon::new(vec![circle(v, radius, CIRCLE_SEGMENTS)]))
            .collect());
        boolean::difference(base, &discs)
    }

    /// Feature-level subtraction: the base feature's attributes are kept, and
    /// `estimated` is set when an approximate strategy was used.
    pub fn subtract_feature(&self, base: &Feature, cutout: &Feature) -> Feature {
        let (Some(base_shape), Some(cutout_shape)) = (base.areal(), cutout.areal()) else { return base.clone() };
        let subtraction = self.subtract(&base_shape, &cutout_shape);
        if !subtraction.changed() && !subtraction.is_estimated() { return base.clone() }

        let mut feature = Feature {
            id: base.id.clone(),
            geometry: to_geometry(subtraction.result),
            properties: base.properties.clone(),
        };
        if subtraction.strategy.is_estimated() {
            feature.properties.insert("estimated".into(), true.into());
        }
        feature
    }
}

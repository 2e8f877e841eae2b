use geo::{ConvexHull, Coord, LineString, MultiPolygon, Polygon, Simplify};
use serde::Serialize;

use crate::geom::boolean::{guarded, normalize};

use super::validate::is_valid;

/// Named geometry repairs, tried in `RepairStrategy::ORDER` until one yields a valid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Rebuild through the overlay engine (planar zero-width buffer).
    ZeroBuffer,
    /// Remove duplicate and collinear vertices and spikes.
    StripDegenerate,
    /// Douglas-Peucker with a small tolerance.
    Simplify,
    /// Replace the shape by its convex hull.
    ConvexHull,
}

impl RepairStrategy {
    pub const ORDER: [RepairStrategy; 4] = [
        RepairStrategy::ZeroBuffer,
        RepairStrategy::StripDegenerate,
        RepairStrategy::Simplify,
        RepairStrategy::ConvexHull,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            RepairStrategy::ZeroBuffer => "zero_buffer",
            RepairStrategy::StripDegenerate => "strip_degenerate",
            RepairStrategy::Simplify => "simplify",
            RepairStrategy::ConvexHull => "convex_hull",
        }
    }

    /// Apply this repair. The result is not checked for validity.
    pub fn apply(&self, shape: &MultiPolygon<f64>, tolerance: f64) -> Option<MultiPolygon<f64>> {
        match self {
            RepairStrategy::ZeroBuffer => normalize(shape),
            RepairStrategy::StripDegenerate => Some(strip_degenerate(shape)),
            RepairStrategy::Simplify => guarded(|| shape.simplify(&tolerance)),
            RepairStrategy::ConvexHull => guarded(|| shape.convex_hull())
                .map(|hull| MultiPolygon::new(vec![hull])),
        }
    }
}

/// First repair whose output passes the validity predicate, with the strategy that produced it.
pub fn repair(shape: &MultiPolygon<f64>, tolerance: f64) -> Option<(MultiPolygon<f64>, RepairStrategy)> {
    RepairStrategy::ORDER.iter().find_map(|&strategy| {
        let candidate = strategy.apply(shape, tolerance)?;
        is_valid(&candidate).then_some((candidate, strategy))
    })
}

/// A vertex is degenerate if it repeats its predecessor or lies on the line through its neighbors.
fn is_degenerate(prev: Coord<f64>, curr: Coord<f64>, next: Coord<f64>) -> bool {
    if prev == curr || curr == next { return true }
    let u = prev - curr;
    let v = next - curr;
    let cross = u.x * v.y - u.y * v.x;
    cross.abs() <= 1e-12 * u.x.hypot(u.y) * v.x.hypot(v.y)
}

fn strip_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut points = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points.dedup();

    loop {
        let n = points.len();
        if n < 3 { return None }
        let found = (0..n).find(|&i| is_degenerate(points[(i + n - 1) % n], points[i], points[(i + 1) % n]));
        match found {
            Some(i) => { points.remove(i); }
            None => break,
        }
    }

    points.push(points[0]);
    Some(LineString(points))
}

fn strip_degenerate(shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(shape.0.iter()
        .filter_map(|polygon| {
            let exterior = strip_ring(polygon.exterior())?;
            let holes = polygon.interiors().iter().filter_map(strip_ring).collect();
            Some(Polygon::new(exterior, holes))
        })
        .collect())
}

use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{BooleanOps, CoordsIter, MultiPolygon};

/// Run a geometry operation, turning a panic inside the overlay engine into `None`.
pub fn guarded<T>(op: impl FnOnce() -> T) -> Option<T> {
    catch_unwind(AssertUnwindSafe(op)).ok()
}

/// Returns `true` if every coordinate is finite.
pub fn is_finite(shape: &MultiPolygon<f64>) -> bool {
    shape.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// `a − b`, or `None` if the overlay panicked or produced non-finite output.
pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    guarded(|| a.difference(b)).filter(is_finite)
}

/// `a ∩ b`, or `None` on failure.
pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    guarded(|| a.intersection(b)).filter(is_finite)
}

/// `a ∪ b`, or `None` on failure.
pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    guarded(|| a.union(b)).filter(is_finite)
}

/// Union of many shapes by pairwise reduction. Pairs whose union fails keep their left operand.
pub fn union_all(mut shapes: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    shapes.retain(|shape| !shape.0.is_empty());
    while shapes.len() > 1 {
        let mut next = Vec::with_capacity(shapes.len().div_ceil(2));
        let mut iter = shapes.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(union(&a, &b).unwrap_or(a)),
                None => next.push(a),
            }
        }
        shapes = next;
    }
    shapes.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Rebuild a shape through the overlay engine, resolving self-intersections
/// and ring orientation (the planar equivalent of a zero-width buffer).
/// Members are rebuilt one at a time and then unioned, so overlapping or
/// duplicated members merge instead of cancelling out.
pub fn normalize(shape: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let empty = MultiPolygon::new(vec![]);
    let members = shape.0.iter()
        .map(|polygon| union(&MultiPolygon::new(vec![polygon.clone()]), &empty))
        .collect::<Option<Vec<_>>>()?;
    Some(union_all(members))
}

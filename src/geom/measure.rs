use geo::{Coord, Geometry, Intersects, LineString, MultiPolygon};

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

/// Returns `true` if `geometry` touches or overlaps `area`.
pub fn intersects(area: &MultiPolygon<f64>, geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(g) => area.intersects(g),
        Geometry::MultiPoint(g) => area.intersects(g),
        Geometry::Line(g) => area.intersects(g),
        Geometry::LineString(g) => area.intersects(g),
        Geometry::MultiLineString(g) => area.intersects(g),
        Geometry::Polygon(g) => area.intersects(g),
        Geometry::MultiPolygon(g) => area.intersects(g),
        Geometry::Rect(g) => area.intersects(&g.to_polygon()),
        Geometry::Triangle(g) => area.intersects(&g.to_polygon()),
        Geometry::GeometryCollection(gc) => gc.iter().any(|g| intersects(area, g)),
    }
}

/// Interior angle in degrees at each vertex of a closed ring (closing point excluded).
pub fn interior_angles(ring: &LineString<f64>) -> Vec<f64> {
    let mut points = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n < 3 { return Vec::new() }

    (0..n).map(|i| {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        let u = prev - curr;
        let v = next - curr;
        let denom = u.x.hypot(u.y) * v.x.hypot(v.y);
        if denom == 0.0 { return 0.0 }
        (dot(u, v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{line_string, polygon, Point};

    #[test]
    fn touching_and_separate_geometries() {
        let area = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]]);
        assert!(intersects(&area, &Geometry::LineString(line_string![(x: 5.0, y: 5.0), (x: 20.0, y: 5.0)])));
        assert!(intersects(&area, &Geometry::Point(Point::new(10.0, 3.0))));
        assert!(!intersects(&area, &Geometry::Point(Point::new(13.0, 14.0))));
    }

    #[test]
    fn rectangle_has_right_angles() {
        let ring = line_string![(x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)];
        let angles = interior_angles(&ring);
        assert_eq!(angles.len(), 4);
        for angle in angles {
            assert_relative_eq!(angle, 90.0, epsilon = 1e-9);
        }
    }
}

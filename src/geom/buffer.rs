use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};

use super::boolean::{union, union_all};
use super::shapes::circle;

/// Vertices per round join; buffers here are coarse planning envelopes.
const JOIN_SEGMENTS: usize = 16;

/// Rectangle of half-width `distance` around segment `a`–`b`, or `None` if degenerate.
fn segment_quad(a: Coord<f64>, b: Coord<f64>, distance: f64) -> Option<Polygon<f64>> {
    let d = b - a;
    let len = d.x.hypot(d.y);
    if len == 0.0 || !len.is_finite() { return None }
    let n = Coord { x: -d.y / len * distance, y: d.x / len * distance };
    Some(Polygon::new(LineString(vec![a + n, b + n, b - n, a - n, a + n]), vec![]))
}

/// Round-capped buffer of a set of lines: union of segment rectangles and vertex discs.
pub fn buffer_lines(lines: &MultiLineString<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance <= 0.0 { return MultiPolygon::new(vec![]) }

    let mut pieces = Vec::new();
    for line in &lines.0 {
        for w in line.0.windows(2) {
            if let Some(quad) = segment_quad(w[0], w[1], distance) {
                pieces.push(MultiPolygon::new(vec![quad]));
            }
        }
        for &vertex in &line.0 {
            pieces.push(MultiPolygon::new(vec![circle(vertex, distance, JOIN_SEGMENTS)]));
        }
    }
    union_all(pieces)
}

/// Discs of radius `distance` around each point.
pub fn buffer_points(points: &[Coord<f64>], distance: f64) -> MultiPolygon<f64> {
    if distance <= 0.0 { return MultiPolygon::new(vec![]) }
    union_all(points.iter()
        .map(|&p| MultiPolygon::new(vec![circle(p, distance, JOIN_SEGMENTS)]))
        .collect())
}

/// Outward buffer of polygons: the shape united with a buffer of its rings.
pub fn buffer_polygons(shape: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance <= 0.0 || shape.0.is_empty() { return shape.clone() }

    let rings: Vec<LineString<f64>> = shape.0.iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior().clone()).chain(polygon.interiors().iter().cloned()))
        .collect();
    let outline = buffer_lines(&MultiLineString::new(rings), distance);
    union(shape, &outline).unwrap_or_else(|| shape.clone())
}

/// Buffer any geometry into an areal shape.
pub fn buffer_geometry(geometry: &Geometry<f64>, distance: f64) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Point(p) => buffer_points(&[p.0], distance),
        Geometry::MultiPoint(mp) => buffer_points(&mp.0.iter().map(|p| p.0).collect::<Vec<_>>(), distance),
        Geometry::Line(line) => buffer_lines(&MultiLineString::new(vec![LineString(vec![line.start, line.end])]), distance),
        Geometry::LineString(ls) => buffer_lines(&MultiLineString::new(vec![ls.clone()]), distance),
        Geometry::MultiLineString(mls) => buffer_lines(mls, distance),
        Geometry::Polygon(polygon) => buffer_polygons(&MultiPolygon::new(vec![polygon.clone()]), distance),
        Geometry::MultiPolygon(mp) => buffer_polygons(mp, distance),
        Geometry::Rect(rect) => buffer_polygons(&MultiPolygon::new(vec![rect.to_polygon()]), distance),
        Geometry::Triangle(tri) => buffer_polygons(&MultiPolygon::new(vec![tri.to_polygon()]), distance),
        Geometry::GeometryCollection(gc) => union_all(gc.iter().map(|g| buffer_geometry(g, distance)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{line_string, polygon, Area, Intersects, Point};
    use std::f64::consts::PI;

    #[test]
    fn line_buffer_is_a_capsule() {
        let line = MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]]);
        let buffered = buffer_lines(&line, 10.0);
        // Rectangle 100 x 20 plus two half discs of radius 10.
        let expected = 100.0 * 20.0 + PI * 100.0;
        assert_relative_eq!(buffered.unsigned_area(), expected, max_relative = 0.02);
        assert!(buffered.intersects(&Point::new(50.0, 9.0)));
        assert!(!buffered.intersects(&Point::new(50.0, 11.0)));
    }

    #[test]
    fn polygon_buffer_grows_area() {
        let square = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]]);
        let buffered = buffer_polygons(&square, 1.0);
        // 10x10 + 4 edges * 10 * 1 + disc corners (pi * 1^2).
        assert_relative_eq!(buffered.unsigned_area(), 100.0 + 40.0 + PI, max_relative = 0.02);
    }

    #[test]
    fn zero_distance_is_identity_or_empty() {
        let line = MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]]);
        assert!(buffer_lines(&line, 0.0).0.is_empty());
        let square = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        assert_eq!(buffer_polygons(&square, 0.0), square);
    }
}

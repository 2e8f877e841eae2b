use std::f64::consts::PI;

use geo::{Coord, LineString, Polygon, Rect};

/// Meters per degree of latitude (spherical approximation).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Vertices used for circles built by the repair strategies.
pub const CIRCLE_SEGMENTS: usize = 32;

/// Counter-clockwise regular polygon approximating a circle.
pub fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(3);
    let mut ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / segments as f64;
            Coord { x: center.x + radius * theta.cos(), y: center.y + radius * theta.sin() }
        })
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString(ring), vec![])
}

/// Axis-aligned box centered on `center` with the given half extents.
pub fn rect_around(center: Coord<f64>, half_x: f64, half_y: f64) -> Polygon<f64> {
    Rect::new(
        Coord { x: center.x - half_x, y: center.y - half_y },
        Coord { x: center.x + half_x, y: center.y + half_y },
    ).to_polygon()
}

/// Grow a rectangle by `margin` on every side.
pub fn expand_rect(rect: &Rect<f64>, margin_x: f64, margin_y: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: rect.min().x - margin_x, y: rect.min().y - margin_y },
        Coord { x: rect.max().x + margin_x, y: rect.max().y + margin_y },
    )
}

/// Convert a distance in meters to degree offsets (dx, dy) at latitude `lat`.
pub fn meters_to_degrees(meters: f64, lat: f64) -> (f64, f64) {
    let cos = lat.to_radians().cos().abs().max(1e-6);
    (meters / (METERS_PER_DEGREE * cos), meters / METERS_PER_DEGREE)
}

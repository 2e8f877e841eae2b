use std::iter::once;

use geo::{Area, BoundingRect, Coord, Geometry, LineString, MultiPolygon, Polygon, Validation};
use serde_json::Value;
use tracing::debug;

use crate::common::io::{ensure_closed, parse_coord, parse_ring_coords};
use crate::geom::boolean::guarded;
use crate::geom::{rect_around, Crs};
use crate::types::{Feature, Properties};

use super::repair::{repair, RepairStrategy};

/// Side of the square synthesized when input has points but no usable ring (m).
const PLACEHOLDER_SIDE_M: f64 = 10.0;

/// Simplification tolerance used by the repair chain (m).
const REPAIR_TOLERANCE_M: f64 = 0.5;

/// A canonical areal geometry and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub shape: MultiPolygon<f64>,
    /// Repair strategy that made the shape valid, if it needed one.
    pub repair: Option<RepairStrategy>,
    /// `true` if the shape is a square synthesized from stray points.
    pub placeholder: bool,
}

impl Validated {
    #[inline] pub fn was_repaired(&self) -> bool { self.repair.is_some() }

    #[inline] pub fn into_geometry(self) -> Geometry<f64> { to_geometry(self.shape) }
}

/// A single polygon stays a Polygon; anything else is a MultiPolygon.
pub fn to_geometry(mut shape: MultiPolygon<f64>) -> Geometry<f64> {
    if shape.0.len() == 1 {
        if let Some(polygon) = shape.0.pop() { return Geometry::Polygon(polygon) }
    }
    Geometry::MultiPolygon(shape)
}

/// Rings of one polygon, exterior first; coordinates not yet cleaned.
type RawPolygon = Vec<Vec<Coord<f64>>>;

/// Nesting depth of a coordinate array: 1 for a position, 2 for a ring, and so on.
fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map_or(0, depth),
        _ => 0,
    }
}

fn raw_rings(value: &Value) -> Vec<Vec<Coord<f64>>> {
    value.as_array()
        .map(|rings| rings.iter().filter_map(Value::as_array).map(|ring| parse_ring_coords(ring)).collect())
        .unwrap_or_default()
}

/// Group raw coordinates into polygons by nesting depth.
fn raw_polygons(coordinates: &Value) -> Vec<RawPolygon> {
    match depth(coordinates) {
        1 => parse_coord(coordinates).map(|c| vec![vec![vec![c]]]).unwrap_or_default(),
        2 => coordinates.as_array().map(|ring| vec![vec![parse_ring_coords(ring)]]).unwrap_or_default(),
        3 => vec![raw_rings(coordinates)],
        4 => coordinates.as_array()
            .map(|polygons| polygons.iter().map(raw_rings).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Shoelace area; positive for counter-clockwise rings. The ring need not be closed.
fn signed_ring_area(ring: &[Coord<f64>]) -> f64 {
    let Some(&first) = ring.first() else { return 0.0 };
    ring.iter().zip(ring.iter().skip(1).chain(once(&first)))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>() * 0.5
}

/// Esri rings: clockwise rings are outer boundaries, counter-clockwise rings are
/// holes of the preceding outer ring. Uniformly oriented input is all outers.
fn esri_polygons(rings: Vec<Vec<Coord<f64>>>) -> Vec<RawPolygon> {
    let clockwise: Vec<bool> = rings.iter().map(|ring| signed_ring_area(ring) < 0.0).collect();
    let mixed = clockwise.iter().any(|&cw| cw) && clockwise.iter().any(|&cw| !cw);

    let mut polygons: Vec<RawPolygon> = Vec::new();
    for (ring, cw) in rings.into_iter().zip(clockwise) {
        match polygons.last_mut() {
            Some(polygon) if mixed && !cw => polygon.push(ring),
            _ => polygons.push(vec![ring]),
        }
    }
    polygons
}

/// Raw polygons from a geometry-like object (typed or duck-typed).
fn geometry_polygons(value: &Value) -> Vec<RawPolygon> {
    if let Some(geometries) = value.get("geometries").and_then(Value::as_array) {
        return geometries.iter().flat_map(geometry_polygons).collect();
    }
    if let Some(coordinates) = value.get("coordinates") {
        return raw_polygons(coordinates);
    }
    if let Some(rings) = value.get("rings") {
        return esri_polygons(raw_rings(rings));
    }
    if value.is_array() {
        return raw_polygons(value);
    }
    Vec::new()
}

/// Locate the geometry, attributes and id of the first feature-like thing in `input`.
fn unwrap_input(input: &Value) -> Option<(&Value, Properties, Option<String>)> {
    match input {
        Value::Array(items) => match items.first()? {
            first @ Value::Object(_) => unwrap_input(first),
            _ => Some((input, Properties::new(), None)),
        },
        Value::Object(object) => {
            if object.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
                return unwrap_input(object.get("features")?.as_array()?.first()?);
            }
            if let Some(features) = object.get("features").and_then(Value::as_array) {
                return unwrap_input(features.first()?);
            }
            let properties = object.get("properties")
                .or_else(|| object.get("attributes"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let id = match object.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            match object.get("geometry") {
                Some(geometry @ Value::Object(_)) => Some((geometry, properties, id)),
                Some(_) => None,
                None => Some((input, properties, id)),
            }
        }
        _ => None,
    }
}

/// Drop consecutive duplicates and require at least three distinct points. Returns a closed ring.
fn clean_ring(points: &[Coord<f64>]) -> Option<Vec<Coord<f64>>> {
    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(points.len() + 1);
    for &p in points {
        if ring.last() != Some(&p) { ring.push(p) }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let mut distinct = ring.clone();
    distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    distinct.dedup();
    if distinct.len() < 3 { return None }

    ensure_closed(&mut ring);
    Some(ring)
}

fn mean(points: &[Coord<f64>]) -> Option<Coord<f64>> {
    if points.is_empty() { return None }
    let n = points.len() as f64;
    let sum = points.iter().fold(Coord { x: 0.0, y: 0.0 }, |acc, &p| acc + p);
    Some(Coord { x: sum.x / n, y: sum.y / n })
}

/// Clean raw rings into polygons, or fall back to a small square around the points.
fn assemble(raw: Vec<RawPolygon>, crs: Crs) -> Option<(MultiPolygon<f64>, bool)> {
    let mut seen = Vec::new();
    let mut polygons = Vec::new();
    for rings in raw {
        seen.extend(rings.iter().flatten().copied());
        let mut rings = rings.iter();
        let Some(exterior) = rings.next().and_then(|ring| clean_ring(ring)) else { continue };
        let holes = rings.filter_map(|ring| clean_ring(ring)).map(LineString).collect();
        polygons.push(Polygon::new(LineString(exterior), holes));
    }

    if !polygons.is_empty() {
        return Some((MultiPolygon::new(polygons), false));
    }

    let center = mean(&seen)?;
    let (dx, dy) = crs.offsets(PLACEHOLDER_SIDE_M / 2.0, center);
    debug!("[validate] no usable ring among {} points, using placeholder square", seen.len());
    Some((MultiPolygon::new(vec![rect_around(center, dx, dy)]), true))
}

/// Accept `shape` if valid, otherwise run the repair chain.
pub fn validate(shape: MultiPolygon<f64>, crs: Crs) -> Option<Validated> {
    if is_valid(&shape) {
        return Some(Validated { shape, repair: None, placeholder: false });
    }

    let at = shape.bounding_rect()?.center();
    let tolerance = crs.tolerance(REPAIR_TOLERANCE_M, at);
    match repair(&shape, tolerance) {
        Some((repaired, strategy)) => {
            debug!("[validate] repaired geometry with {}", strategy.to_str());
            Some(Validated { shape: repaired, repair: Some(strategy), placeholder: false })
        }
        None => {
            debug!("[validate] geometry could not be repaired");
            None
        }
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> RawPolygon {
    once(polygon.exterior()).chain(polygon.interiors()).map(|ring| ring.0.clone()).collect()
}

fn typed_polygons(geometry: &Geometry<f64>) -> Vec<RawPolygon> {
    match geometry {
        Geometry::Polygon(polygon) => vec![polygon_rings(polygon)],
        Geometry::MultiPolygon(multi) => multi.0.iter().map(polygon_rings).collect(),
        Geometry::Rect(rect) => vec![polygon_rings(&rect.to_polygon())],
        Geometry::Triangle(tri) => vec![polygon_rings(&tri.to_polygon())],
        Geometry::LineString(line) => vec![vec![line.0.clone()]],
        Geometry::MultiLineString(lines) => lines.0.iter().map(|line| vec![line.0.clone()]).collect(),
        Geometry::Line(line) => vec![vec![vec![line.start, line.end]]],
        Geometry::Point(point) => vec![vec![vec![point.0]]],
        Geometry::MultiPoint(points) => vec![vec![points.0.iter().map(|p| p.0).collect()]],
        Geometry::GeometryCollection(collection) => collection.iter().flat_map(typed_polygons).collect(),
    }
}

/// Canonicalize an already-typed geometry into a valid areal shape.
pub fn normalize_geometry(geometry: &Geometry<f64>, crs: Crs) -> Option<Validated> {
    finish(typed_polygons(geometry), crs)
}

fn finish(raw: Vec<RawPolygon>, crs: Crs) -> Option<Validated> {
    let (shape, placeholder) = assemble(raw, crs)?;
    validate(shape, crs).map(|validated| Validated { placeholder, ..validated })
}

/// Canonicalize loosely-shaped JSON (bare geometry, Feature, FeatureCollection,
/// `{ geometry }` wrapper, or an untyped bag with `coordinates` or Esri `rings`)
/// into a Polygon / MultiPolygon feature. `None` if nothing usable remains.
pub fn normalize(input: &Value, crs: Crs) -> Option<Feature> {
    let (geometry, mut properties, id) = unwrap_input(input)?;
    let validated = finish(geometry_polygons(geometry), crs)?;
    if let Some(strategy) = validated.repair {
        properties.insert("repairStrategy".into(), strategy.to_str().into());
    }
    if validated.placeholder {
        properties.insert("placeholder".into(), true.into());
    }
    Some(Feature { id, geometry: validated.into_geometry(), properties })
}

fn ring_is_well_formed(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4
        && ring.0.first() == ring.0.last()
        && ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Closed rings of at least four finite points, non-zero exterior area,
/// and OGC-valid otherwise: no self-intersections, holes inside their shell,
/// members neither overlapping nor sharing an edge.
pub fn is_valid(shape: &MultiPolygon<f64>) -> bool {
    if shape.0.is_empty() { return false }
    let rings_ok = shape.0.iter().all(|polygon| {
        ring_is_well_formed(polygon.exterior())
            && polygon.interiors().iter().all(ring_is_well_formed)
            && Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area() > 0.0
    });
    rings_ok && guarded(|| Validation::is_valid(shape)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn geometry_area(feature: &Feature) -> f64 { feature.geometry.unsigned_area() }

    #[test]
    fn feature_collection_yields_first_feature() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "name": "Lot 1" },
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] } },
                { "type": "Feature", "properties": { "name": "Lot 2" },
                  "geometry": { "type": "Polygon", "coordinates": [[[20, 0], [30, 0], [30, 10], [20, 0]]] } },
            ]
        });
        let feature = normalize(&input, Crs::Projected).unwrap();
        assert_eq!(feature.property("name"), Some(&json!("Lot 1")));
        assert_relative_eq!(geometry_area(&feature), 100.0);
    }

    #[test]
    fn untyped_coordinates_infer_type_and_drop_elevation() {
        let input = json!({ "coordinates": [[[0, 0, 5], [10, 0, 5], [10, 10, 5], [0, 10, 5]]] });
        let feature = normalize(&input, Crs::Projected).unwrap();
        let Geometry::Polygon(polygon) = &feature.geometry else { panic!("expected polygon") };
        // Ring was closed during normalization.
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_relative_eq!(geometry_area(&feature), 100.0);
    }

    #[test]
    fn bare_ring_is_a_polygon() {
        let input = json!([[0, 0], [4, 0], [4, 4], [0, 4]]);
        assert_relative_eq!(geometry_area(&normalize(&input, Crs::Projected).unwrap()), 16.0);
    }

    #[test]
    fn esri_rings_with_hole() {
        // Clockwise outer ring, counter-clockwise hole.
        let input = json!({
            "rings": [
                [[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]],
                [[2, 2], [4, 2], [4, 4], [2, 4], [2, 2]],
            ],
            "attributes": { "OBJECTID": 7 }
        });
        let feature = normalize(&input, Crs::Projected).unwrap();
        assert_relative_eq!(geometry_area(&feature), 96.0);
        assert_eq!(feature.property("OBJECTID"), Some(&json!(7)));
    }

    #[test]
    fn malformed_entries_and_duplicates_are_dropped() {
        let input = json!({ "type": "Polygon", "coordinates": [[
            [0, 0], [0, 0], ["x", 1], [10], [10, 0], [10, 10], [10, 10], [0, 10], [0, 0]
        ]] });
        let feature = normalize(&input, Crs::Projected).unwrap();
        let Geometry::Polygon(polygon) = &feature.geometry else { panic!("expected polygon") };
        assert_eq!(polygon.exterior().0.len(), 5);
    }

    #[test]
    fn stray_points_become_placeholder_square() {
        let input = json!({ "type": "Polygon", "coordinates": [[[100, 100], [110, 100], [100, 100]]] });
        let feature = normalize(&input, Crs::Projected).unwrap();
        assert_relative_eq!(geometry_area(&feature), PLACEHOLDER_SIDE_M * PLACEHOLDER_SIDE_M, epsilon = 1e-9);
        assert_eq!(feature.property("placeholder"), Some(&json!(true)));
    }

    #[test]
    fn geographic_placeholder_is_about_ten_meters() {
        let input = json!({ "type": "Point", "coordinates": [151.2, -33.9] });
        let feature = normalize(&input, Crs::Geographic).unwrap();
        let rect = feature.bounds().unwrap();
        assert_relative_eq!(rect.height() * 111_320.0, 10.0, max_relative = 1e-6);
    }

    #[test]
    fn nothing_usable_is_none() {
        assert!(normalize(&json!({ "type": "Polygon", "coordinates": [] }), Crs::Projected).is_none());
        assert!(normalize(&json!({ "type": "FeatureCollection", "features": [] }), Crs::Projected).is_none());
        assert!(normalize(&json!("not geometry"), Crs::Projected).is_none());
    }

    #[test]
    fn bow_tie_is_invalid_and_repaired() {
        let bow_tie = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![],
        )]);
        assert!(!is_valid(&bow_tie));

        let validated = validate(bow_tie, Crs::Projected).unwrap();
        assert_eq!(validated.repair, Some(RepairStrategy::ZeroBuffer));
        assert!(is_valid(&validated.shape));
        assert_relative_eq!(validated.shape.unsigned_area(), 50.0, epsilon = 1e-6);
    }

    #[test]
    fn hole_touching_exterior_at_a_point_is_valid() {
        let shape = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(0.0, 5.0), (3.0, 4.0), (3.0, 6.0), (0.0, 5.0)])],
        )]);
        assert!(is_valid(&shape));
    }

    #[test]
    fn zero_area_and_open_rings_are_invalid() {
        let flat = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (0.0, 0.0)]),
            vec![],
        )]);
        assert!(!is_valid(&flat));
        assert!(!is_valid(&MultiPolygon::new(vec![])));
    }

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x, y), (x + side, y), (x + side, y + side), (x, y + side), (x, y)]),
            vec![],
        )
    }

    #[test]
    fn duplicate_and_nested_members_are_invalid() {
        assert!(!is_valid(&MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(0.0, 0.0, 10.0)])));
        assert!(!is_valid(&MultiPolygon::new(vec![square(0.0, 0.0, 100.0), square(25.0, 25.0, 50.0)])));
        assert!(is_valid(&MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)])));
    }

    #[test]
    fn hole_outside_its_shell_is_invalid() {
        let shape = MultiPolygon::new(vec![Polygon::new(
            square(0.0, 0.0, 10.0).exterior().clone(),
            vec![square(20.0, 20.0, 5.0).exterior().clone()],
        )]);
        assert!(!is_valid(&shape));
    }

    #[test]
    fn nested_member_is_merged_not_double_counted() {
        let shape = MultiPolygon::new(vec![square(0.0, 0.0, 100.0), square(25.0, 25.0, 50.0)]);
        let validated = validate(shape, Crs::Projected).unwrap();
        assert_eq!(validated.repair, Some(RepairStrategy::ZeroBuffer));
        assert_eq!(validated.shape.0.len(), 1);
        assert_relative_eq!(validated.shape.unsigned_area(), 10_000.0, epsilon = 1e-6);
    }
}

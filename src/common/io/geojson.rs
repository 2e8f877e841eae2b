use std::path::Path;

use anyhow::{anyhow, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Value};

use crate::types::{Feature, FeatureCollection, Properties};

/// Read a single coordinate pair, dropping any elevation / measure values.
/// Returns `None` for malformed entries (non-numeric, non-finite, fewer than 2 values).
pub(crate) fn parse_coord(value: &Value) -> Option<Coord<f64>> {
    let array = value.as_array()?;
    if array.len() < 2 { return None }
    let x = array[0].as_f64()?;
    let y = array[1].as_f64()?;
    (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates, skipping malformed entries.
/// Format: [[x, y], [x, y], ...]
pub(crate) fn parse_ring_coords(coords: &[Value]) -> Vec<Coord<f64>> {
    coords.iter().filter_map(parse_coord).collect()
}

/// Close a coordinate ring in place (first point == last point).
pub(crate) fn ensure_closed(points: &mut Vec<Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            points.push(first);
        }
    }
}

/// Parse polygon coordinates: [[ring], [hole], ...]
fn parse_polygon_coords(coords: &[Value]) -> Option<Polygon<f64>> {
    let mut rings = coords.iter()
        .filter_map(|ring| ring.as_array())
        .map(|ring| {
            let mut points = parse_ring_coords(ring);
            ensure_closed(&mut points);
            LineString(points)
        });
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

/// Parse a GeoJSON geometry object into a `geo::Geometry`.
/// Unknown types and empty coordinate arrays yield `None`.
pub fn parse_geometry(value: &Value) -> Option<Geometry<f64>> {
    let kind = value.get("type")?.as_str()?;
    if kind == "GeometryCollection" {
        let geometries = value.get("geometries")?.as_array()?
            .iter()
            .filter_map(parse_geometry)
            .collect::<Vec<_>>();
        return Some(Geometry::GeometryCollection(geo::GeometryCollection::from(geometries)));
    }

    let coords = value.get("coordinates")?;
    match kind {
        "Point" => parse_coord(coords).map(|c| Geometry::Point(Point(c))),
        "MultiPoint" => {
            let points: Vec<Point<f64>> = coords.as_array()?.iter().filter_map(parse_coord).map(Point).collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint(points)))
        }
        "LineString" => {
            let points = parse_ring_coords(coords.as_array()?);
            (points.len() >= 2).then(|| Geometry::LineString(LineString(points)))
        }
        "MultiLineString" => {
            let lines: Vec<LineString<f64>> = coords.as_array()?.iter()
                .filter_map(|line| line.as_array())
                .map(|line| LineString(parse_ring_coords(line)))
                .filter(|line| line.0.len() >= 2)
                .collect();
            (!lines.is_empty()).then(|| Geometry::MultiLineString(MultiLineString(lines)))
        }
        "Polygon" => parse_polygon_coords(coords.as_array()?).map(Geometry::Polygon),
        "MultiPolygon" => {
            let polygons: Vec<Polygon<f64>> = coords.as_array()?.iter()
                .filter_map(|polygon| polygon.as_array())
                .filter_map(|polygon| parse_polygon_coords(polygon))
                .collect();
            (!polygons.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        _ => None,
    }
}

/// Parse a GeoJSON Feature. Features without a usable geometry yield `None`.
pub fn parse_feature(value: &Value) -> Option<Feature> {
    let geometry = parse_geometry(value.get("geometry")?)?;
    let properties = value.get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let id = match value.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Some(Feature { id, geometry, properties })
}

/// Parse a FeatureCollection, a single Feature, or a bare geometry into a collection.
/// Features with unusable geometry are skipped.
pub fn parse_feature_collection(value: &Value) -> FeatureCollection {
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = value.get("features")
                .and_then(Value::as_array)
                .map(|features| features.iter().filter_map(parse_feature).collect())
                .unwrap_or_default();
            let properties = value.get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            FeatureCollection { features, properties }
        }
        Some("Feature") => parse_feature(value).map(|f| FeatureCollection::new(vec![f])).unwrap_or_default(),
        Some(_) => parse_geometry(value).map(|g| FeatureCollection::new(vec![Feature::new(g)])).unwrap_or_default(),
        None => value.as_array()
            .map(|items| FeatureCollection::new(items.iter().filter_map(parse_feature).collect()))
            .unwrap_or_default(),
    }
}

/// Read features from GeoJSON bytes.
pub fn read_from_geojson_bytes(bytes: &[u8]) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    if !value.is_object() && !value.is_array() {
        return Err(anyhow!("GeoJSON document must be an object or an array of features"));
    }
    Ok(parse_feature_collection(&value))
}

/// Read features from a GeoJSON file.
pub fn read_geojson(path: &Path) -> Result<FeatureCollection> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read GeoJSON file {}", path.display()))?;
    read_from_geojson_bytes(&bytes)
        .with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

fn coord_json(c: &Coord<f64>) -> Value { json!([c.x, c.y]) }

fn ring_json(ls: &LineString<f64>) -> Value {
    Value::Array(ls.coords().map(coord_json).collect())
}

fn polygon_json(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![ring_json(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_json));
    Value::Array(rings)
}

/// Convert a geometry to a GeoJSON geometry object.
pub fn geometry_to_geojson(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": coord_json(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| coord_json(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::Line(line) => json!({
            "type": "LineString",
            "coordinates": [coord_json(&line.start), coord_json(&line.end)],
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": ring_json(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(ring_json).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(polygon) => json!({ "type": "Polygon", "coordinates": polygon_json(polygon) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
        Geometry::Rect(rect) => json!({ "type": "Polygon", "coordinates": polygon_json(&rect.to_polygon()) }),
        Geometry::Triangle(tri) => json!({ "type": "Polygon", "coordinates": polygon_json(&tri.to_polygon()) }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_geojson).collect::<Vec<_>>(),
        }),
    }
}

/// Convert a feature to a GeoJSON Feature object.
pub fn feature_to_geojson(feature: &Feature) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), json!("Feature"));
    if let Some(id) = &feature.id {
        object.insert("id".into(), json!(id));
    }
    object.insert("geometry".into(), geometry_to_geojson(&feature.geometry));
    object.insert("properties".into(), Value::Object(feature.properties.clone()));
    Value::Object(object)
}

/// Convert a collection to a GeoJSON FeatureCollection object.
pub fn to_geojson(collection: &FeatureCollection) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), json!("FeatureCollection"));
    object.insert("features".into(), Value::Array(collection.iter().map(feature_to_geojson).collect()));
    if !collection.properties.is_empty() {
        object.insert("properties".into(), Value::Object(collection.properties.clone()));
    }
    Value::Object(object)
}

/// Write a collection to a GeoJSON file.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(&to_geojson(collection))
        .context("Failed to serialize GeoJSON to bytes")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write GeoJSON file {}", path.display()))
}

/// Shorthand for building property maps in tests and fixtures.
pub fn properties(pairs: &[(&str, Value)]) -> Properties {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polygon_and_drops_elevation() {
        let value = json!({
            "type": "Feature",
            "id": 7,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0, 12.0], [1.0, 0.0, 12.0], [1.0, 1.0, 13.0], [0.0, 1.0, 12.5]]]
            },
            "properties": { "name": "Lot 1" }
        });
        let feature = parse_feature(&value).unwrap();
        assert_eq!(feature.id.as_deref(), Some("7"));
        let Geometry::Polygon(polygon) = &feature.geometry else { panic!("expected polygon") };
        // Ring was closed on parse.
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.exterior().0[0], polygon.exterior().0[4]);
    }

    #[test]
    fn malformed_coordinates_are_skipped() {
        let ring = vec![json!([0.0, 0.0]), json!(["a", 1.0]), json!([1.0]), json!([2.0, 2.0])];
        assert_eq!(parse_ring_coords(&ring).len(), 2);
    }

    #[test]
    fn feature_collection_round_trip_through_file() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0, 0], [3, 4]] }, "properties": { "lanes": 2 } },
                { "type": "Feature", "geometry": null, "properties": {} }
            ]
        });
        let collection = parse_feature_collection(&value);
        assert_eq!(collection.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.geojson");
        write_geojson(&path, &collection).unwrap();
        let reread = read_geojson(&path).unwrap();
        assert_eq!(reread, collection);
    }

    #[test]
    fn bare_geometry_becomes_single_feature() {
        let value = json!({ "type": "Point", "coordinates": [151.2, -33.8] });
        let collection = parse_feature_collection(&value);
        assert_eq!(collection.len(), 1);
        assert!(matches!(collection.features[0].geometry, Geometry::Point(_)));
    }
}

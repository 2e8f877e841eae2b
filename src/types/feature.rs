use geo::{BoundingRect, Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon, Rect};
use serde_json::{Map, Value};

/// Open attribute mapping carried by every feature.
pub type Properties = Map<String, Value>;

/// A geometry plus its attributes and optional identity.
/// Features are treated as immutable values; clone before mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self { id: None, geometry: geometry.into(), properties: Properties::new() }
    }

    pub fn with_properties(geometry: impl Into<Geometry<f64>>, properties: Properties) -> Self {
        Self { id: None, geometry: geometry.into(), properties }
    }

    /// Builder-style attribute setter, used mostly when assembling output parts.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    #[inline] pub fn property(&self, key: &str) -> Option<&Value> { self.properties.get(key) }

    /// Bounding rectangle of the geometry, if it has any coordinates.
    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.geometry.bounding_rect() }

    /// Areal part of the geometry (Polygon / MultiPolygon), if any.
    pub fn areal(&self) -> Option<MultiPolygon<f64>> {
        match &self.geometry {
            Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon.clone()])),
            Geometry::MultiPolygon(multi) => Some(multi.clone()),
            Geometry::Rect(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
            Geometry::Triangle(tri) => Some(MultiPolygon::new(vec![tri.to_polygon()])),
            Geometry::GeometryCollection(collection) => {
                let polygons: Vec<Polygon<f64>> = collection.iter()
                    .filter_map(|g| match g {
                        Geometry::Polygon(p) => Some(vec![p.clone()]),
                        Geometry::MultiPolygon(mp) => Some(mp.0.clone()),
                        _ => None,
                    })
                    .flatten()
                    .collect();
                (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
            }
            _ => None,
        }
    }

    /// Linear part of the geometry (LineString / MultiLineString / Line), if any.
    pub fn linear(&self) -> Option<MultiLineString<f64>> {
        match &self.geometry {
            Geometry::Line(line) => Some(MultiLineString::new(vec![LineString::new(vec![line.start, line.end])])),
            Geometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
            Geometry::MultiLineString(mls) => Some(mls.clone()),
            _ => None,
        }
    }

    /// Point coordinates of the geometry, if it is a point or multipoint.
    pub fn points(&self) -> Option<Vec<Coord<f64>>> {
        match &self.geometry {
            Geometry::Point(Point(c)) => Some(vec![*c]),
            Geometry::MultiPoint(mp) => Some(mp.0.iter().map(|p| p.0).collect()),
            _ => None,
        }
    }
}

/// An ordered set of features plus collection-level attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub properties: Properties,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features, properties: Properties::new() }
    }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Feature> { self.features.iter() }

    /// Bounding rectangle of every feature in the collection.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features.iter()
            .filter_map(|feature| feature.bounds())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self { Self::new(features) }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter { self.features.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    #[test]
    fn areal_and_linear_views() {
        let square = Feature::new(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]);
        assert_eq!(square.areal().map(|mp| mp.0.len()), Some(1));
        assert!(square.linear().is_none());

        let road = Feature::new(line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)]);
        assert!(road.areal().is_none());
        assert_eq!(road.linear().map(|mls| mls.0.len()), Some(1));
    }

    #[test]
    fn collection_bounds_cover_all_features() {
        let fc = FeatureCollection::new(vec![
            Feature::new(Point::new(1.0, 2.0)),
            Feature::new(Point::new(-3.0, 7.0)),
        ]);
        let bounds = fc.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -3.0, y: 2.0 });
        assert_eq!(bounds.max(), Coord { x: 1.0, y: 7.0 });
    }

    #[test]
    fn with_property_inserts_value() {
        let feature = Feature::new(Point::new(0.0, 0.0)).with_property("partIndex", 2);
        assert_eq!(feature.property("partIndex").and_then(Value::as_u64), Some(2));
    }
}

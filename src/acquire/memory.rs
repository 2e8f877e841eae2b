use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;
use geo::{Intersects, Rect};
use rstar::RTree;
use tracing::debug;

use crate::common::read_geojson_dir;
use crate::geom::{envelope, BoundingBox};
use crate::types::{Feature, FeatureCollection, Layer, LayerDescriptor};

use super::{zone_matches, FeatureSource, FetchError};

/// Features of one layer with an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
struct IndexedLayer {
    features: Vec<Feature>,
    rtree: RTree<BoundingBox>,
}

impl IndexedLayer {
    fn new(collection: FeatureCollection) -> Self {
        let features: Vec<Feature> = collection.features.into_iter()
            .filter(|feature| feature.bounds().is_some())
            .collect();
        let rtree = RTree::bulk_load(features.iter().enumerate()
            .filter_map(|(i, feature)| BoundingBox::of_feature(i, feature))
            .collect());
        Self { features, rtree }
    }
}

/// In-memory layer store answering envelope queries; used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    layers: AHashMap<Layer, IndexedLayer>,
}

impl MemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn with_layer(mut self, layer: Layer, collection: FeatureCollection) -> Self {
        self.insert(layer, collection);
        self
    }

    pub fn insert(&mut self, layer: Layer, collection: FeatureCollection) {
        self.layers.insert(layer, IndexedLayer::new(collection));
    }

    #[inline] pub fn len(&self) -> usize { self.layers.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    /// Load `<layer>.geojson` files (e.g. `biodiversity.geojson`, `power_lines.geojson`) from `dir`.
    /// Files that do not name a layer are ignored.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut source = Self::new();
        for (stem, collection) in read_geojson_dir(dir)? {
            match Layer::from_str(&stem.replace('-', "_")) {
                Some(layer) => source.insert(layer, collection),
                None => debug!(file = %stem, "[acquire] ignoring file that names no layer"),
            }
        }
        Ok(source)
    }

    /// Features of the descriptor's layer whose bounding boxes meet `envelope`,
    /// after the descriptor's zone filter.
    pub fn query(&self, descriptor: &LayerDescriptor, envelope_rect: Rect<f64>) -> FeatureCollection {
        let Some(indexed) = self.layers.get(&descriptor.layer) else { return FeatureCollection::default() };
        let mut hits: Vec<usize> = indexed.rtree
            .locate_in_envelope_intersecting(&envelope(&envelope_rect))
            .filter(|bb| bb.bbox().intersects(&envelope_rect))
            .map(|bb| bb.idx())
            .collect();
        hits.sort_unstable();

        FeatureCollection::new(hits.into_iter()
            .map(|i| &indexed.features[i])
            .filter(|feature| zone_matches(descriptor, feature))
            .cloned()
            .collect())
    }
}

impl FeatureSource for MemorySource {
    async fn fetch_features(&self, descriptor: &LayerDescriptor, envelope: Rect<f64>) -> Result<FeatureCollection, FetchError> {
        Ok(self.query(descriptor, envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Coord};

    fn parcel(x: f64, zone: &str) -> Feature {
        Feature::new(polygon![(x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0)])
            .with_property("zone_code", zone)
    }

    fn source() -> MemorySource {
        MemorySource::new().with_layer(Layer::Zoning, FeatureCollection::new(vec![
            parcel(0.0, "R2"), parcel(2.0, "RE1"), parcel(100.0, "RE1"),
        ]))
    }

    #[test]
    fn query_filters_by_envelope_and_zone() {
        let envelope = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 5.0, y: 5.0 });
        let all = source().query(&LayerDescriptor::new(Layer::Zoning, 1.0), envelope);
        assert_eq!(all.len(), 2);

        let excluded = LayerDescriptor::new(Layer::Zoning, 1.0).with_zone_codes(vec!["RE1".into()]);
        let hits = source().query(&excluded, envelope);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.features[0].property("zone_code"), Some(&"RE1".into()));
    }

    #[test]
    fn missing_layer_is_empty() {
        let envelope = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 5.0, y: 5.0 });
        assert!(source().query(&LayerDescriptor::new(Layer::Flood, 1.0), envelope).is_empty());
    }

    #[test]
    fn loads_layer_files_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}]}"#;
        std::fs::write(dir.path().join("power_lines.geojson"), doc).unwrap();
        std::fs::write(dir.path().join("unrelated.geojson"), doc).unwrap();

        let source = MemorySource::from_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 1);
        let envelope = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 2.0 });
        assert_eq!(source.query(&LayerDescriptor::new(Layer::PowerLines, 10.0), envelope).len(), 1);
    }
}

//! Conversion of loosely shaped dataset input into planar features.
//! Every dataset passes through here exactly once before scoring.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::common::io::parse_feature_collection;
use crate::common::read_geojson_dir;
use crate::geom::Projection;
use crate::types::{Dataset, Feature, FeatureCollection};

use super::inputs::Datasets;

/// Project a parsed collection; features that fail to project or carry no coordinates are dropped.
pub fn normalize_collection(collection: &FeatureCollection, projection: &Projection) -> Vec<Feature> {
    collection.iter()
        .filter(|feature| feature.bounds().is_some())
        .filter_map(|feature| projection.forward_feature(feature))
        .collect()
}

/// A FeatureCollection, a Feature, an array of features or a bare geometry, as planar features.
pub fn normalize_dataset(input: &Value, projection: &Projection) -> Vec<Feature> {
    normalize_collection(&parse_feature_collection(input), projection)
}

/// Normalize every raw dataset into a `Datasets` table.
pub fn normalize_all(raw: &BTreeMap<Dataset, FeatureCollection>, projection: &Projection) -> Datasets {
    let mut datasets = Datasets::new();
    for (&dataset, collection) in raw {
        let features = normalize_collection(collection, projection);
        debug!(dataset = dataset.to_str(), raw = collection.len(), kept = features.len(), "[score] normalized dataset");
        datasets.insert(dataset, features);
    }
    datasets
}

/// Load `<dataset>.geojson` files (e.g. `flood.geojson`, `udp-precincts.geojson`) from `dir`.
/// Files that do not name a dataset are ignored.
pub fn read_datasets(dir: &Path) -> Result<BTreeMap<Dataset, FeatureCollection>> {
    let mut raw = BTreeMap::new();
    for (stem, collection) in read_geojson_dir(dir)? {
        match Dataset::from_str(&stem.replace('-', "_")) {
            Some(dataset) => { raw.insert(dataset, collection); }
            None => debug!(file = %stem, "[score] ignoring file that names no dataset"),
        }
    }
    Ok(raw)
}

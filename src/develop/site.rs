use serde_json::Value;
use tracing::warn;

use crate::common::io::parse_feature;
use crate::common::{feature_name, prop, prop_bool};
use crate::geom::Crs;
use crate::geometry::normalize;
use crate::types::{Feature, FeatureCollection};

const MULTI_FLAG: &str = "isMultipleProperties";
const ALL_PROPERTIES: &str = "allProperties";

/// One boundary to process.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub index: usize,
    pub feature: Feature,
    pub name: Option<String>,
}

impl Site {
    fn new(index: usize, feature: Feature) -> Self {
        let name = feature_name(&feature);
        Self { index, feature, name }
    }
}

/// Entries of an `allProperties` array: typed features, or anything the validator can shape.
fn site_feature(value: &Value) -> Option<Feature> {
    parse_feature(value).or_else(|| normalize(value, Crs::Geographic))
}

fn collection_flag(collection: &FeatureCollection) -> bool {
    collection.properties.iter()
        .any(|(k, v)| k.eq_ignore_ascii_case(MULTI_FLAG) && matches!(v, Value::Bool(true)))
}

fn all_properties(collection: &FeatureCollection) -> Option<&Vec<Value>> {
    collection.properties.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(ALL_PROPERTIES))
        .and_then(|(_, v)| v.as_array())
        .or_else(|| collection.features.first().and_then(|f| prop(f, &[ALL_PROPERTIES])).and_then(Value::as_array))
}

/// Split an input boundary collection into the sites to process.
///
/// A collection is multi-site when it (or its first feature) carries `isMultipleProperties`,
/// or when an `allProperties` array is present. Otherwise only the first feature is used.
pub fn sites(collection: &FeatureCollection) -> Vec<Site> {
    if let Some(entries) = all_properties(collection) {
        return entries.iter().enumerate()
            .filter_map(|(i, entry)| match site_feature(entry) {
                Some(feature) => Some(Site::new(i, feature)),
                None => {
                    warn!(site = i, "[develop] skipping allProperties entry without usable geometry");
                    None
                }
            })
            .collect();
    }

    let multi = collection_flag(collection)
        || collection.features.first().is_some_and(|f| prop_bool(f, &[MULTI_FLAG]));
    if multi {
        return collection.features.iter().cloned().enumerate()
            .map(|(i, feature)| Site::new(i, feature))
            .collect();
    }

    collection.features.first().cloned()
        .map(|feature| vec![Site::new(0, feature)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use serde_json::json;

    fn lot(x: f64, name: &str) -> Feature {
        Feature::new(polygon![(x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0)])
            .with_property("name", name)
    }

    #[test]
    fn single_site_uses_first_feature() {
        let collection = FeatureCollection::new(vec![lot(0.0, "a"), lot(5.0, "b")]);
        let sites = sites(&collection);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name.as_deref(), Some("a"));
    }

    #[test]
    fn flag_on_first_feature_enables_multi_site() {
        let collection = FeatureCollection::new(vec![
            lot(0.0, "a").with_property("isMultipleProperties", true),
            lot(5.0, "b"),
        ]);
        let sites = sites(&collection);
        assert_eq!(sites.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn all_properties_array_lists_sites() {
        let mut collection = FeatureCollection::new(vec![lot(0.0, "summary")]);
        collection.properties.insert("allProperties".into(), json!([
            { "type": "Feature", "properties": { "name": "north" },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } },
            { "geometry": { "coordinates": [[[2, 0], [3, 0], [3, 1], [2, 0]]] }, "properties": { "name": "south" } },
            { "note": "no geometry here" },
        ]));
        let sites = sites(&collection);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[1].name.as_deref(), Some("south"));
    }
}

use geo::{Area, MultiPolygon, Polygon};
use serde_json::Value;
use tracing::warn;

use crate::common::part_letters;
use crate::geom::Projection;
use crate::types::Feature;

use super::context::area_name;

/// Attributes shared by every part produced for one site.
#[derive(Debug, Clone)]
pub(crate) struct PartMeta {
    pub site_index: usize,
    pub sequence: usize,
    pub estimated: bool,
    pub site_name: Option<String>,
}

/// Planar polygons larger than `min_area`, largest first.
pub(crate) fn split(shape: &MultiPolygon<f64>, min_area: f64) -> Vec<(Polygon<f64>, f64)> {
    let mut parts: Vec<(Polygon<f64>, f64)> = shape.0.iter()
        .map(|polygon| (polygon.clone(), polygon.unsigned_area()))
        .filter(|(_, area)| area.is_finite() && *area > min_area)
        .collect();
    parts.sort_by(|a, b| b.1.total_cmp(&a.1));
    parts
}

/// Take an estimated reduction (m²) off the parts' areas, each in proportion to its share.
pub(crate) fn apply_reduction(parts: &mut [(Polygon<f64>, f64)], reduction: f64) {
    let total: f64 = parts.iter().map(|(_, area)| area).sum();
    if !(reduction > 0.0 && total > 0.0) { return }
    let keep = ((total - reduction) / total).max(0.0);
    parts.iter_mut().for_each(|(_, area)| *area *= keep);
}

fn tag(feature: Feature, meta: &PartMeta, index: usize, label: Option<String>, name: String, area: f64, fallback: bool) -> Feature {
    let mut feature = feature
        .with_property("partIndex", index)
        .with_property("partLabel", label.map_or(Value::Null, Value::from))
        .with_property("name", name)
        .with_property("autoGenerated", true)
        .with_property("estimated", meta.estimated)
        .with_property("fallback", fallback)
        .with_property("area", area)
        .with_property("siteIndex", meta.site_index);
    if let Some(site_name) = &meta.site_name {
        feature.properties.insert("siteName".into(), site_name.clone().into());
    }
    feature
}

/// Label planar parts and return them to lon/lat. Parts that fail to unproject are dropped.
pub(crate) fn into_features(parts: Vec<(Polygon<f64>, f64)>, projection: &Projection, meta: &PartMeta) -> Vec<Feature> {
    let lettered = parts.len() > 1;
    parts.into_iter().enumerate()
        .filter_map(|(index, (polygon, area))| {
            let Some(mut restored) = projection.inverse_multipolygon(&MultiPolygon::new(vec![polygon])) else {
                warn!(site = meta.site_index, part = index, "[develop] dropping part that failed to unproject");
                return None;
            };
            let polygon = restored.0.pop()?;
            let letter = lettered.then(|| part_letters(index));
            let name = area_name(meta.sequence, lettered.then_some(index));
            Some(tag(Feature::new(polygon), meta, index, letter, name, area, false))
        })
        .collect()
}

/// The original boundary as the sole part, flagged as a fallback.
pub(crate) fn fallback(original: &Feature, meta: &PartMeta) -> Feature {
    let area = original.bounds()
        .and_then(|bounds| Projection::for_bounds(&bounds).ok())
        .and_then(|projection| projection.forward(&original.geometry))
        .map(|planar| planar.unsigned_area())
        .unwrap_or(0.0);
    let name = format!("{} (Fallback)", area_name(meta.sequence, None));
    let feature = Feature { id: original.id.clone(), geometry: original.geometry.clone(), properties: Default::default() };
    tag(feature, meta, 0, None, name, area, true)
}

use ahash::AHashMap;
use geo::line_measures::{Distance, Euclidean};
use geo::{Area, CoordsIter, Geometry, MultiPolygon};

use crate::geom::boolean::{guarded, union_all};
use crate::geom::{buffer_polygons, intersects, Projection};
use crate::types::{Dataset, FeatureCollection, Feature};

/// Planar (meter) features per dataset. A missing dataset and an empty one are treated alike.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    layers: AHashMap<Dataset, Vec<Feature>>,
}

impl Datasets {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, dataset: Dataset, features: Vec<Feature>) {
        self.layers.insert(dataset, features);
    }

    pub fn with(mut self, dataset: Dataset, features: Vec<Feature>) -> Self {
        self.insert(dataset, features);
        self
    }

    /// Features of `dataset`; empty when it was never loaded.
    pub fn features(&self, dataset: Dataset) -> &[Feature] {
        self.layers.get(&dataset).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline] pub fn has(&self, dataset: Dataset) -> bool { !self.features(dataset).is_empty() }

    #[inline] pub fn len(&self) -> usize { self.layers.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.layers.is_empty() }
}

/// The developable area in planar meters, as seen by the scorers.
#[derive(Debug, Clone)]
pub struct Footprint {
    shape: MultiPolygon<f64>,
    outline: Geometry<f64>,
    area: f64,
}

impl Footprint {
    /// `None` for shapes without positive area.
    pub fn new(shape: MultiPolygon<f64>) -> Option<Self> {
        let area = shape.unsigned_area();
        if !(area.is_finite() && area > 0.0) { return None }
        let outline = Geometry::MultiPolygon(shape.clone());
        Some(Self { shape, outline, area })
    }

    /// Union of the areal parts of a developable-area collection, projected with `projection`.
    pub fn from_parts(parts: &FeatureCollection, projection: &Projection) -> Option<Self> {
        let shapes = parts.iter()
            .filter_map(Feature::areal)
            .filter_map(|shape| projection.forward_multipolygon(&shape))
            .collect::<Vec<_>>();
        if shapes.is_empty() { return None }
        Self::new(union_all(shapes))
    }

    #[inline] pub fn shape(&self) -> &MultiPolygon<f64> { &self.shape }

    /// Area in m².
    #[inline] pub fn area(&self) -> f64 { self.area }

    /// The footprint grown by `distance` meters.
    pub fn buffered(&self, distance: f64) -> MultiPolygon<f64> {
        buffer_polygons(&self.shape, distance)
    }

    #[inline] pub fn intersects(&self, geometry: &Geometry<f64>) -> bool { intersects(&self.shape, geometry) }

    /// Distance to `geometry` in meters; 0 when they touch, `INFINITY` for an empty geometry.
    pub fn distance(&self, geometry: &Geometry<f64>) -> f64 {
        if geometry.coords_count() == 0 { return f64::INFINITY }
        if self.intersects(geometry) { return 0.0 }
        guarded(|| Euclidean.distance(&self.outline, geometry)).unwrap_or(f64::INFINITY)
    }
}

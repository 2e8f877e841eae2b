use geo::Rect;
use rstar::{RTreeObject, AABB};

use crate::types::Feature;

/// R-tree entry: a feature's bounding rectangle plus its position in the owning collection.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Entry for the `idx`-th feature; `None` when the feature has no coordinates.
    pub fn of_feature(idx: usize, feature: &Feature) -> Option<Self> {
        feature.bounds().map(|bbox| Self::new(idx, bbox))
    }

    #[inline] pub fn idx(&self) -> usize { self.idx }

    #[inline] pub fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { envelope(&self.bbox) }
}

/// Query envelope for a rectangle.
#[inline]
pub fn envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

mod feature;
mod layer;

pub use feature::{Feature, FeatureCollection, Properties};
pub use layer::{Dataset, Layer, LayerDescriptor};

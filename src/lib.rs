#![doc = "sitelens public API"]
mod common;
pub mod acquire;
pub mod config;
pub mod develop;
pub mod geom;
pub mod geometry;
pub mod score;
pub mod types;

#[doc(inline)]
pub use common::io::{parse_feature_collection, read_geojson, to_geojson, write_geojson};

#[doc(inline)]
pub use common::{read_geojson_dir, require_dir_exists};

#[doc(inline)]
pub use config::Config;

#[doc(inline)]
pub use develop::{BuildOutput, DevelopableAreaBuilder, RunContext};

#[doc(inline)]
pub use score::{CompositeScore, ScoringEngine};

#[doc(inline)]
pub use types::{Dataset, Feature, FeatureCollection, Layer};

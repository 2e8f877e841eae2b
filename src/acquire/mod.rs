#[cfg(feature = "remote")]
mod arcgis;
mod cancel;
mod fetch;
mod memory;
mod source;

#[cfg(feature = "remote")]
pub use arcgis::ArcGisSource;
pub use cancel::CancellationToken;
pub use fetch::{fetch_or_empty, fetch_with_deadline};
pub use memory::MemorySource;
pub use source::{zone_matches, FeatureSource, FetchError};

use std::future::Future;
use std::time::Duration;

use geo::Rect;

use crate::common::prop_str;
use crate::types::{Feature, FeatureCollection, LayerDescriptor};

/// Attribute keys that may carry a land zoning code.
const ZONE_KEYS: [&str; 4] = ["zone_code", "zone", "sym_code", "lay_class"];

/// Why a layer could not be fetched. Callers treat every variant as "no features".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("could not parse response: {0}")]
    Parse(String),
}

/// Supplier of features for a constraint layer within a lon/lat envelope.
pub trait FeatureSource: Send + Sync {
    fn fetch_features(&self, descriptor: &LayerDescriptor, envelope: Rect<f64>)
        -> impl Future<Output = Result<FeatureCollection, FetchError>> + Send;
}

/// Returns `true` if the feature passes the descriptor's zone-code filter.
/// Descriptors without zone codes accept everything.
pub fn zone_matches(descriptor: &LayerDescriptor, feature: &Feature) -> bool {
    if descriptor.zone_codes.is_empty() { return true }
    let Some(code) = prop_str(feature, &ZONE_KEYS) else { return false };
    descriptor.zone_codes.iter().any(|zone| zone.eq_ignore_ascii_case(code.trim()))
}

use std::time::Duration;

use ahash::AHashMap;
use anyhow::{Context, Result};
use geo::Rect;
use serde_json::Value;

use crate::common::io::parse_feature_collection;
use crate::types::{FeatureCollection, Layer, LayerDescriptor};

use super::{zone_matches, FeatureSource, FetchError};

/// ArcGIS REST feature services, one `.../FeatureServer/<n>` endpoint per layer.
/// Queries request GeoJSON in WGS84 for features intersecting the envelope.
#[derive(Debug, Clone)]
pub struct ArcGisSource {
    client: reqwest::Client,
    endpoints: AHashMap<Layer, String>,
}

impl ArcGisSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sitelens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoints: AHashMap::new() })
    }

    pub fn with_endpoint(mut self, layer: Layer, url: impl Into<String>) -> Self {
        self.endpoints.insert(layer, url.into());
        self
    }

    /// Query URL and parameters for `envelope` against `endpoint`.
    fn query(endpoint: &str, envelope: Rect<f64>) -> (String, Vec<(&'static str, String)>) {
        let url = format!("{}/query", endpoint.trim_end_matches('/'));
        let geometry = format!("{},{},{},{}", envelope.min().x, envelope.min().y, envelope.max().x, envelope.max().y);
        let params = vec![
            ("where", "1=1".to_string()),
            ("geometry", geometry),
            ("geometryType", "esriGeometryEnvelope".to_string()),
            ("inSR", "4326".to_string()),
            ("spatialRel", "esriSpatialRelIntersects".to_string()),
            ("outFields", "*".to_string()),
            ("returnGeometry", "true".to_string()),
            ("outSR", "4326".to_string()),
            ("f", "geojson".to_string()),
        ];
        (url, params)
    }
}

/// ArcGIS reports failures inside a 200 response as `{ "error": { "code", "message" } }`.
fn parse_response(value: &Value) -> Result<FeatureCollection, FetchError> {
    if let Some(error) = value.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown service error");
        return Err(FetchError::Http(message.to_string()));
    }
    if !value.is_object() {
        return Err(FetchError::Parse("response is not a JSON object".into()));
    }
    Ok(parse_feature_collection(value))
}

impl FeatureSource for ArcGisSource {
    async fn fetch_features(&self, descriptor: &LayerDescriptor, envelope: Rect<f64>) -> Result<FeatureCollection, FetchError> {
        let Some(endpoint) = self.endpoints.get(&descriptor.layer) else { return Ok(FeatureCollection::default()) };
        let (url, params) = Self::query(endpoint, envelope);

        let response = self.client.get(&url).query(&params).send().await
            .and_then(|response| response.error_for_status())
            .map_err(|err| FetchError::Http(err.to_string()))?;
        let bytes = response.bytes().await.map_err(|err| FetchError::Http(err.to_string()))?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|err| FetchError::Parse(err.to_string()))?;

        let mut collection = parse_response(&value)?;
        collection.features.retain(|feature| zone_matches(descriptor, feature));
        Ok(collection)
    }
}

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Layer, LayerDescriptor};

/// Settings for the developable-area pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Parts at or below this area (m²) are discarded as noise.
    pub min_part_area_m2: f64,
    /// Query envelope growth on every side, as a fraction of the boundary's larger dimension.
    pub envelope_expansion: f64,
    /// Deadline for each layer fetch.
    pub fetch_timeout_secs: u64,
    /// Buffer applied to high-voltage power lines (m).
    pub power_line_buffer_m: f64,
    /// Buffer applied to line or point features on other layers (m).
    pub feature_buffer_m: f64,
    /// Biodiversity features are subtracted in batches of this size.
    pub biodiversity_batch_size: usize,
    /// Zone codes that disqualify land from development.
    pub excluded_zones: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            min_part_area_m2: 100.0,
            envelope_expansion: 1.0,
            fetch_timeout_secs: 10,
            power_line_buffer_m: 10.0,
            feature_buffer_m: 1.0,
            biodiversity_batch_size: 5,
            excluded_zones: ["RE1", "RE2", "C1", "C2", "C3", "SP1", "SP2", "W1", "W2"]
                .iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BuilderConfig {
    #[inline] pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }

    /// Descriptor passed to the feature source for `layer`.
    pub fn descriptor(&self, layer: Layer) -> LayerDescriptor {
        match layer {
            Layer::PowerLines => LayerDescriptor::new(layer, self.power_line_buffer_m),
            Layer::Zoning => LayerDescriptor::new(layer, self.feature_buffer_m)
                .with_zone_codes(self.excluded_zones.clone()),
            _ => LayerDescriptor::new(layer, self.feature_buffer_m),
        }
    }
}

/// Tolerances for the polygon difference fallback chain. Distances are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferenceConfig {
    /// Buffer applied to both operands by the epsilon strategy.
    pub epsilon_m: f64,
    /// Minimum side of the box that replaces degenerate cutouts.
    pub min_cutout_box_m: f64,
    /// Tolerance used when simplifying operands.
    pub simplify_tolerance_m: f64,
    /// Circle radius multiplier applied to the cutout's equivalent radius.
    pub circle_scale: f64,
    /// Smallest radius of the circular approximation.
    pub min_circle_radius_m: f64,
    /// Maximum cutout vertices buffered by the multi-circle strategy.
    pub max_buffer_vertices: usize,
    /// Smallest relative area reduction the multi-circle strategy must achieve.
    pub min_area_reduction: f64,
    /// Fraction of `min(base_area, cutout_area)` used by the area-ratio estimate.
    pub estimate_factor: f64,
}

impl Default for DifferenceConfig {
    fn default() -> Self {
        Self {
            epsilon_m: 0.01,
            min_cutout_box_m: 10.0,
            simplify_tolerance_m: 0.5,
            circle_scale: 1.5,
            min_circle_radius_m: 50.0,
            max_buffer_vertices: 8,
            min_area_reduction: 0.01,
            estimate_factor: 0.1,
        }
    }
}

/// Settings shared by the criterion scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fixed ceiling of the composite score.
    pub max_total: f64,
    /// Buffer around the developable area used to find roads (m).
    pub road_buffer_m: f64,
    /// Buffer around the developable area used to find service lines (m).
    pub service_buffer_m: f64,
    /// Fraction used by the coverage estimate when exact intersection fails.
    pub estimate_factor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { max_total: 48.0, road_buffer_m: 20.0, service_buffer_m: 20.0, estimate_factor: 0.1 }
    }
}

/// Top-level configuration. Every section falls back to its defaults when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub builder: BuilderConfig,
    pub difference: DifferenceConfig,
    pub scoring: ScoringConfig,
}

impl Config {
    /// Read configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

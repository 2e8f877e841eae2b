use std::fmt;

use serde::{Deserialize, Serialize};

/// A disqualifying constraint layer subtracted from the site boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Biodiversity,   // Biodiversity values map
    Easements,      // Registered easements
    PowerLines,     // High-voltage transmission lines (buffered)
    Flood,          // 1% AEP flood extents
    Zoning,         // Land zoning, filtered to excluded codes
}

impl Layer {
    pub fn to_str(&self) -> &'static str {
        match self {
            Layer::Biodiversity => "biodiversity",
            Layer::Easements => "easements",
            Layer::PowerLines => "power_lines",
            Layer::Flood => "flood",
            Layer::Zoning => "zoning",
        }
    }

    /// Order in which layers are subtracted from the running polygon.
    pub fn order() -> [Layer; 5] {
        [
            Layer::Biodiversity,
            Layer::Easements,
            Layer::PowerLines,
            Layer::Flood,
            Layer::Zoning,
        ]
    }

    pub fn from_str(name: &str) -> Option<Self> {
        Self::order().into_iter().find(|layer| layer.to_str() == name)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// What to fetch for a layer and how to turn its features into cutouts.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub layer: Layer,
    /// Buffer applied to line and point features before subtraction, in meters.
    pub buffer_m: f64,
    /// For zoning: only features whose zone code is in this list are cutouts.
    pub zone_codes: Vec<String>,
}

impl LayerDescriptor {
    pub fn new(layer: Layer, buffer_m: f64) -> Self {
        Self { layer, buffer_m, zone_codes: Vec::new() }
    }

    pub fn with_zone_codes(mut self, codes: Vec<String>) -> Self {
        self.zone_codes = codes;
        self
    }
}

/// A feature dataset consumed by one or more criterion scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Flood,
    Bushfire,
    Contamination,
    Heritage,
    AcidSulfate,
    Roads,
    UdpPrecincts,
    Ptal,
    Tec,
    Biodiversity,
    Buildings,
    Water,
    Sewer,
    Power,
    Contours,
}

impl Dataset {
    pub fn to_str(&self) -> &'static str {
        match self {
            Dataset::Flood => "flood",
            Dataset::Bushfire => "bushfire",
            Dataset::Contamination => "contamination",
            Dataset::Heritage => "heritage",
            Dataset::AcidSulfate => "acid_sulfate",
            Dataset::Roads => "roads",
            Dataset::UdpPrecincts => "udp_precincts",
            Dataset::Ptal => "ptal",
            Dataset::Tec => "tec",
            Dataset::Biodiversity => "biodiversity",
            Dataset::Buildings => "buildings",
            Dataset::Water => "water",
            Dataset::Sewer => "sewer",
            Dataset::Power => "power",
            Dataset::Contours => "contours",
        }
    }

    pub const ALL: [Dataset; 15] = [
        Dataset::Flood,
        Dataset::Bushfire,
        Dataset::Contamination,
        Dataset::Heritage,
        Dataset::AcidSulfate,
        Dataset::Roads,
        Dataset::UdpPrecincts,
        Dataset::Ptal,
        Dataset::Tec,
        Dataset::Biodiversity,
        Dataset::Buildings,
        Dataset::Water,
        Dataset::Sewer,
        Dataset::Power,
        Dataset::Contours,
    ];

    pub fn from_str(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dataset| dataset.to_str() == name)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

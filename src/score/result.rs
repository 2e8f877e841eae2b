use serde::Serialize;

use crate::types::Feature;

/// Fixed text for criteria scored without a developable area.
pub const NOT_ASSESSED: &str = "Not assessed: no developable area available.";

/// Highest suitability score a criterion can award.
pub const MAX_SCORE: u8 = 3;

/// Outcome of one criterion. The score is clamped to `0..=3` on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    score: u8,
    /// Distance in meters or coverage in percent; `INFINITY` when not applicable, 0 at intersection.
    pub measure: f64,
    pub description: String,
    #[serde(skip)]
    pub supporting: Vec<Feature>,
    pub nearest: Option<String>,
    pub class: Option<String>,
    pub assessed: bool,
    pub estimated: bool,
}

impl ScoreResult {
    pub fn new(score: i64, measure: f64) -> Self {
        Self {
            score: score.clamp(0, MAX_SCORE as i64) as u8,
            measure,
            description: String::new(),
            supporting: Vec::new(),
            nearest: None,
            class: None,
            assessed: true,
            estimated: false,
        }
    }

    /// Score 0 with the fixed "not assessed" text.
    pub fn not_assessed() -> Self {
        Self { assessed: false, description: NOT_ASSESSED.to_string(), ..Self::new(0, f64::INFINITY) }
    }

    #[inline] pub fn score(&self) -> u8 { self.score }

    pub fn with_supporting(mut self, features: Vec<Feature>) -> Self {
        self.supporting = features;
        self
    }

    pub fn with_nearest(mut self, name: Option<String>) -> Self {
        self.nearest = name;
        self
    }

    pub fn with_class(mut self, class: Option<String>) -> Self {
        self.class = class;
        self
    }

    pub fn with_estimated(mut self, estimated: bool) -> Self {
        self.estimated = estimated;
        self
    }
}

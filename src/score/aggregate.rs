use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use super::result::ScoreResult;

/// Unweighted sum of criterion scores against a fixed ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    /// Results in criterion order.
    pub criteria: Vec<(String, ScoreResult)>,
    pub total: u32,
    pub max: f64,
    pub percentage: f64,
}

impl CompositeScore {
    pub fn get(&self, key: &str) -> Option<&ScoreResult> {
        self.criteria.iter().find(|(k, _)| k == key).map(|(_, result)| result)
    }

    /// `true` if any criterion fell back to an estimate.
    pub fn is_estimated(&self) -> bool {
        self.criteria.iter().any(|(_, result)| result.estimated)
    }
}

/// Sum scores and express the total as a percentage of `max`.
pub fn aggregate(results: Vec<(String, ScoreResult)>, max: f64) -> CompositeScore {
    let total: u32 = results.iter().map(|(_, result)| result.score() as u32).sum();
    let percentage = if max > 0.0 { total as f64 / max * 100.0 } else { 0.0 };
    CompositeScore { criteria: results, total, max, percentage }
}

/// Criterion entry as written to JSON.
struct Entry<'a>(&'a ScoreResult);

impl Serialize for Entry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Criterion", 3)?;
        state.serialize_field("score", &self.0.score())?;
        state.serialize_field("description", &self.0.description)?;
        state.serialize_field("estimated", &self.0.estimated)?;
        state.end()
    }
}

/// Keyed criteria, written in criterion order.
struct Criteria<'a>(&'a [(String, ScoreResult)]);

impl Serialize for Criteria<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, result) in self.0 {
            map.serialize_entry(key, &Entry(result))?;
        }
        map.end()
    }
}

impl Serialize for CompositeScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompositeScore", 4)?;
        state.serialize_field("criteria", &Criteria(&self.criteria))?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("max", &self.max)?;
        state.serialize_field("percentage", &self.percentage)?;
        state.end()
    }
}

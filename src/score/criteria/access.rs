use crate::common::{feature_name, prop_f64, prop_str};
use crate::geom::intersects;
use crate::types::{Dataset, Feature};

use super::{intersecting, named, nearest, Criterion, Datasets, Footprint, ScoreResult};

const LANE_KEYS: [&str; 5] = ["lanes", "lane_count", "num_lanes", "lanecount", "total_lanes"];
const PTAL_KEYS: [&str; 5] = ["ptal", "ptal_class", "ptal_level", "level", "category"];
const PTAL_LEVELS: [&str; 6] = ["Low", "Low-Medium", "Medium", "Medium-High", "High", "Very High"];

/// Road frontage: a road inside the buffer with at least two lanes ⇒ 3, any road ⇒ 2, none ⇒ 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Roads {
    buffer_m: f64,
}

impl Roads {
    pub fn new(buffer_m: f64) -> Self { Self { buffer_m } }
}

impl Criterion for Roads {
    fn key(&self) -> &'static str { "roads" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let roads = datasets.features(Dataset::Roads);
        let reach = footprint.buffered(self.buffer_m);
        let adjacent: Vec<&Feature> = roads.iter().filter(|road| intersects(&reach, &road.geometry)).collect();

        if adjacent.is_empty() {
            let distance = nearest(footprint, roads).map_or(f64::INFINITY, |(d, _)| d);
            return ScoreResult::new(1, distance);
        }

        let widest = adjacent.iter()
            .map(|road| (prop_f64(road, &LANE_KEYS).unwrap_or(0.0), *road))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        let (lanes, road) = match widest {
            Some((lanes, road)) => (lanes, road),
            None => return ScoreResult::new(1, f64::INFINITY),
        };
        let distance = adjacent.iter()
            .map(|road| footprint.distance(&road.geometry))
            .fold(f64::INFINITY, f64::min);

        ScoreResult::new(if lanes >= 2.0 { 3 } else { 2 }, distance)
            .with_nearest(feature_name(road))
            .with_class((lanes > 0.0).then(|| format!("{lanes} lanes")))
            .with_supporting(adjacent.into_iter().cloned().collect())
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        let name = named(result.nearest.as_deref());
        match result.score() {
            3 => format!(
                "Multi-lane road within {:.0} m{name}, {}.",
                self.buffer_m,
                result.class.as_deref().unwrap_or("2+ lanes"),
            ),
            2 => format!("Road within {:.0} m{name}, fewer than 2 lanes recorded.", self.buffer_m),
            _ => format!("No road within {:.0} m of the site.", self.buffer_m),
        }
    }
}

/// Proximity to an urban development precinct: ≤800 m ⇒ 3, ≤1600 m ⇒ 2, otherwise 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpPrecinct;

impl UdpPrecinct {
    pub fn score_for(distance: f64) -> i64 {
        if distance <= 800.0 { 3 }
        else if distance <= 1600.0 { 2 }
        else { 1 }
    }
}

impl Criterion for UdpPrecinct {
    fn key(&self) -> &'static str { "udp_precinct" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        match nearest(footprint, datasets.features(Dataset::UdpPrecincts)) {
            Some((distance, precinct)) => ScoreResult::new(Self::score_for(distance), distance)
                .with_nearest(feature_name(precinct))
                .with_supporting(vec![precinct.clone()]),
            None => ScoreResult::new(1, f64::INFINITY),
        }
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        let name = named(result.nearest.as_deref());
        let distance = result.measure;
        if !distance.is_finite() {
            "No urban development precinct found near the site.".to_string()
        } else if distance == 0.0 {
            format!("Site lies within an urban development precinct{name}.")
        } else {
            format!("Nearest urban development precinct{name} is {distance:.0} m away.")
        }
    }
}

/// Rank 1 (low) to 6 (very high) of a public transport accessibility level.
pub fn ptal_rank(label: &str) -> Option<usize> {
    let normalized = label.to_ascii_lowercase().replace(['-', '_'], " ");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(rank) = normalized.parse::<usize>() {
        return (1..=6).contains(&rank).then_some(rank);
    }
    PTAL_LEVELS.iter()
        .position(|level| level.to_ascii_lowercase().replace('-', " ") == normalized)
        .map(|i| i + 1)
}

/// Public transport accessibility: high or very high ⇒ 3, medium ⇒ 2, low or none ⇒ 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ptal;

impl Criterion for Ptal {
    fn key(&self) -> &'static str { "ptal" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let zones = intersecting(footprint, datasets.features(Dataset::Ptal));
        let best = zones.iter()
            .filter_map(|zone| prop_str(zone, &PTAL_KEYS).and_then(|label| ptal_rank(&label)))
            .max();

        let score = match best {
            Some(rank) if rank >= 5 => 3,
            Some(rank) if rank >= 3 => 2,
            _ => 1,
        };
        ScoreResult::new(score, 0.0)
            .with_class(best.map(|rank| PTAL_LEVELS[rank - 1].to_string()))
            .with_supporting(zones.into_iter().cloned().collect())
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        match &result.class {
            Some(level) => format!("Public transport accessibility level is {level}."),
            None => "No public transport accessibility level recorded for the site.".to_string(),
        }
    }
}

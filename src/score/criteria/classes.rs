use crate::common::{feature_name, prop_str};
use crate::types::{Dataset, Feature};

use super::{intersecting, named, Criterion, Datasets, Footprint, ScoreResult};

const SIGNIFICANCE_KEYS: [&str; 6] = ["significance", "heritage_significance", "sig", "listing", "level", "status"];
const ACID_CLASS_KEYS: [&str; 5] = ["class", "ass_class", "acid_class", "lay_class", "classification"];

/// Heritage listing level, from most to least restrictive.
fn significance(feature: &Feature) -> Option<&'static str> {
    let text = prop_str(feature, &SIGNIFICANCE_KEYS)?.to_ascii_lowercase();
    if text.contains("national") || text.contains("world") { Some("national") }
    else if text.contains("state") { Some("state") }
    else if text.contains("local") { Some("local") }
    else { None }
}

/// Heritage items on the site: state or national ⇒ 1, local ⇒ 2, otherwise 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heritage;

impl Criterion for Heritage {
    fn key(&self) -> &'static str { "heritage" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let items = intersecting(footprint, datasets.features(Dataset::Heritage));
        if items.is_empty() { return ScoreResult::new(3, f64::INFINITY) }

        let worst = items.iter()
            .filter_map(|item| significance(item).map(|level| (level, *item)))
            .min_by_key(|(level, _)| match *level { "local" => 2, _ => 1 });

        let supporting = items.iter().map(|item| (*item).clone()).collect();
        match worst {
            Some((level, item)) => {
                let score = if level == "local" { 2 } else { 1 };
                ScoreResult::new(score, 0.0)
                    .with_class(Some(level.to_string()))
                    .with_nearest(feature_name(item))
                    .with_supporting(supporting)
            }
            None => ScoreResult::new(3, 0.0).with_supporting(supporting),
        }
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        match (&result.class, result.supporting.is_empty()) {
            (Some(level), _) => format!(
                "Site contains an item of {level} heritage significance{}.",
                named(result.nearest.as_deref()),
            ),
            (None, false) => "Heritage item on the site has no recorded significance.".to_string(),
            (None, true) => "No heritage items on the site.".to_string(),
        }
    }
}

/// First digit 1-5 in a class attribute such as `2`, `"Class 3"` or `"5"`.
fn acid_class(feature: &Feature) -> Option<u32> {
    prop_str(feature, &ACID_CLASS_KEYS)?
        .chars()
        .find_map(|c| c.to_digit(10))
        .filter(|class| (1..=5).contains(class))
}

fn acid_score(class: u32) -> i64 {
    match class {
        1 | 2 => 1,
        3 | 4 => 2,
        _ => 3,
    }
}

/// Acid sulfate soils under the site: classes 1-2 ⇒ 1, 3-4 ⇒ 2, otherwise 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcidSulfate;

impl Criterion for AcidSulfate {
    fn key(&self) -> &'static str { "acid_sulfate" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let zones = intersecting(footprint, datasets.features(Dataset::AcidSulfate));
        if zones.is_empty() { return ScoreResult::new(3, f64::INFINITY) }

        let worst = zones.iter().filter_map(|zone| acid_class(zone)).min_by_key(|&class| acid_score(class));
        let supporting = zones.iter().map(|zone| (*zone).clone()).collect();

        ScoreResult::new(worst.map(acid_score).unwrap_or(3), 0.0)
            .with_class(worst.map(|class| class.to_string()))
            .with_supporting(supporting)
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        let Some(class) = &result.class else {
            return if result.supporting.is_empty() {
                "No acid sulfate soils mapped on the site.".to_string()
            } else {
                "Acid sulfate soils of unknown class on the site.".to_string()
            };
        };
        let risk = match result.score() {
            1 => "high",
            2 => "medium",
            _ => "low",
        };
        format!("Class {class} acid sulfate soils ({risk} risk) on the site.")
    }
}

use std::collections::BTreeMap;

use geo::{polygon, MultiPolygon};
use serde_json::Value;
use sitelens::score::criteria::{Coverage, ProximityHazard};
use sitelens::score::{Criterion, Datasets, Footprint, NOT_ASSESSED};
use sitelens::types::Dataset;
use sitelens::{Feature, FeatureCollection, ScoringEngine};

fn square(x: f64, y: f64, side: f64) -> geo::Polygon<f64> {
    polygon![(x: x, y: y), (x: x + side, y: y), (x: x + side, y: y + side), (x: x, y: y + side)]
}

fn footprint() -> Footprint {
    Footprint::new(MultiPolygon::new(vec![square(0.0, 0.0, 100.0)])).unwrap()
}

#[test]
fn flood_on_site_is_reported_as_impact() {
    let datasets = Datasets::new().with(Dataset::Flood, vec![Feature::new(square(50.0, 50.0, 200.0))]);
    let result = ProximityHazard::flood().calculate_score(&datasets, Some(&footprint()));
    assert_eq!(result.score(), 1);
    assert_eq!(result.measure, 0.0);
    assert!(result.description.contains("impacted by flooding"));
}

#[test]
fn hazard_scores_are_monotonic_in_distance() {
    let fp = footprint();
    for hazard in [ProximityHazard::flood(), ProximityHazard::bushfire(), ProximityHazard::contamination()] {
        let scores: Vec<u8> = (0..30)
            .map(|i| {
                let datasets = Datasets::new()
                    .with(Dataset::Flood, vec![Feature::new(square(100.0 + i as f64 * 25.0, 0.0, 10.0))])
                    .with(Dataset::Bushfire, vec![Feature::new(square(100.0 + i as f64 * 25.0, 0.0, 10.0))])
                    .with(Dataset::Contamination, vec![Feature::new(square(100.0 + i as f64 * 25.0, 0.0, 10.0))]);
                hazard.calculate_score(&datasets, Some(&fp)).score()
            })
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{}: {scores:?}", hazard.key());
    }
}

#[test]
fn coverage_scores_are_monotonic_in_share() {
    let fp = footprint();
    let tec = Coverage::tec(0.1);
    let scores: Vec<u8> = (1..=10)
        .map(|i| {
            let width = i as f64 * 10.0;
            let cover = polygon![(x: 0.0, y: 0.0), (x: width, y: 0.0), (x: width, y: 100.0), (x: 0.0, y: 100.0)];
            tec.calculate_score(&Datasets::new().with(Dataset::Tec, vec![Feature::new(cover)]), Some(&fp)).score()
        })
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
}

#[test]
fn no_footprint_scores_zero_everywhere() {
    let composite = ScoringEngine::default().score(&Datasets::new(), None);
    assert_eq!(composite.total, 0);
    assert_eq!(composite.percentage, 0.0);
    for (key, result) in &composite.criteria {
        assert_eq!(result.score(), 0, "{key}");
        assert_eq!(result.description, NOT_ASSESSED);
    }
}

#[test]
fn composite_json_shape() {
    let area = FeatureCollection::new(vec![Feature::new(square(300_000.0, 6_250_000.0, 70.0))]);
    let flood = FeatureCollection::new(vec![Feature::new(square(300_000.0, 6_250_000.0, 10.0))]);
    let composite = ScoringEngine::default().score_area(&area, &BTreeMap::from([(Dataset::Flood, flood)]));

    let json = serde_json::to_value(&composite).unwrap();
    assert_eq!(json["max"], 48.0);
    assert_eq!(json["criteria"]["flood"]["score"], 1);
    assert_eq!(json["criteria"]["developable_area"]["score"], 3);
    assert!(json["criteria"]["flood"]["description"].as_str().is_some_and(|d| d.contains("flooding")));

    let total: u64 = json["criteria"].as_object().unwrap().values()
        .filter_map(|entry| entry["score"].as_u64())
        .sum();
    assert_eq!(json["total"], Value::from(total));
    assert!(composite.criteria.iter().all(|(_, r)| r.score() <= 3));
}

use approx::assert_relative_eq;
use geo::{polygon, MultiPolygon, Polygon};
use serde_json::Value;
use sitelens::acquire::MemorySource;
use sitelens::geometry::{DifferenceEngine, Strategy};
use sitelens::{read_geojson, write_geojson, Config, DevelopableAreaBuilder, Feature, FeatureCollection, Layer, RunContext};

const X0: f64 = 300_000.0;
const Y0: f64 = 6_250_000.0;

fn rect(x: f64, y: f64, width: f64, height: f64) -> Polygon<f64> {
    polygon![(x: x, y: y), (x: x + width, y: y), (x: x + width, y: y + height), (x: x, y: y + height)]
}

/// 100 m × 50 m lot in planar meters.
fn lot() -> FeatureCollection {
    FeatureCollection::new(vec![Feature::new(rect(X0, Y0, 100.0, 50.0))])
}

#[tokio::test]
async fn biodiversity_covering_forty_percent() {
    // Six-vertex ring reaching 40 m into the lot from its west edge.
    let biodiversity = Feature::new(polygon![
        (x: X0 - 10.0, y: Y0 - 10.0), (x: X0 + 40.0, y: Y0 - 10.0), (x: X0 + 40.0, y: Y0 + 25.0),
        (x: X0 + 40.0, y: Y0 + 60.0), (x: X0 - 10.0, y: Y0 + 60.0), (x: X0 - 10.0, y: Y0 + 25.0),
    ]);
    let source = MemorySource::new().with_layer(Layer::Biodiversity, FeatureCollection::new(vec![biodiversity]));

    let output = DevelopableAreaBuilder::new(source, &Config::default())
        .build(&lot(), &mut RunContext::new()).await;

    assert_eq!(output.parts.len(), 1);
    assert_relative_eq!(output.total_area(), 3_000.0, max_relative = 0.01);
    assert!(!output.is_estimated());
    assert!(!output.has_fallback());

    let part = &output.parts.features[0];
    assert_eq!(part.property("name"), Some(&Value::from("Developable Area 1")));
    assert_eq!(part.property("partLabel"), Some(&Value::Null));
    assert_eq!(output.parts.properties.get("partCount"), Some(&Value::from(1)));
}

#[tokio::test]
async fn geographic_sites_keep_lon_lat_output() {
    let boundary = FeatureCollection::new(vec![Feature::new(polygon![
        (x: 151.000, y: -33.900), (x: 151.001, y: -33.900), (x: 151.001, y: -33.899), (x: 151.000, y: -33.899),
    ])]);
    let easement = Feature::new(polygon![
        (x: 150.999, y: -33.901), (x: 151.0005, y: -33.901), (x: 151.0005, y: -33.898), (x: 150.999, y: -33.898),
    ]);

    let config = Config::default();
    let open = DevelopableAreaBuilder::new(MemorySource::new(), &config)
        .build(&boundary, &mut RunContext::new()).await;
    let cut = DevelopableAreaBuilder::new(
        MemorySource::new().with_layer(Layer::Easements, FeatureCollection::new(vec![easement])),
        &config,
    ).build(&boundary, &mut RunContext::new()).await;

    assert_relative_eq!(cut.total_area() / open.total_area(), 0.5, max_relative = 0.02);
    let bounds = cut.parts.bounds().unwrap();
    assert!(bounds.min().x >= 151.0 - 1e-6 && bounds.max().x <= 151.001 + 1e-6);
    assert!(bounds.min().y >= -33.900 - 1e-6 && bounds.max().y <= -33.899 + 1e-6);
}

#[tokio::test]
async fn multiple_sites_are_numbered_in_order() {
    let mut boundary = FeatureCollection::new(vec![
        lot().features[0].clone(),
        Feature::new(polygon![
            (x: X0 + 500.0, y: Y0), (x: X0 + 600.0, y: Y0), (x: X0 + 600.0, y: Y0 + 100.0), (x: X0 + 500.0, y: Y0 + 100.0),
        ]),
    ]);
    boundary.properties.insert("isMultipleProperties".into(), Value::Bool(true));

    let output = DevelopableAreaBuilder::new(MemorySource::new(), &Config::default())
        .build(&boundary, &mut RunContext::new()).await;

    let names: Vec<_> = output.parts.iter().filter_map(|p| p.property("name").and_then(Value::as_str)).collect();
    assert_eq!(names, vec!["Developable Area 1", "Developable Area 2"]);
    assert_relative_eq!(output.total_area(), 15_000.0, max_relative = 1e-6);
}

#[tokio::test]
async fn parts_round_trip_through_geojson_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parts.geojson");

    let output = DevelopableAreaBuilder::new(MemorySource::new(), &Config::default())
        .build(&lot(), &mut RunContext::new()).await;
    write_geojson(&path, &output.parts).unwrap();

    let restored = read_geojson(&path).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.features[0].property("area"), output.parts.features[0].property("area"));
}

#[tokio::test]
async fn multipolygon_boundary_parts_sum_to_its_area() {
    let members = MultiPolygon::new(vec![rect(X0, Y0, 100.0, 50.0), rect(X0 + 200.0, Y0, 40.0, 40.0)]);
    let boundary = FeatureCollection::new(vec![Feature::new(members)]);

    let output = DevelopableAreaBuilder::new(MemorySource::new(), &Config::default())
        .build(&boundary, &mut RunContext::new()).await;

    assert_eq!(output.parts.len(), 2);
    assert_relative_eq!(output.total_area(), 5_000.0 + 1_600.0, max_relative = 1e-6);
}

#[tokio::test]
async fn overlapping_boundary_members_are_counted_once() {
    // A nested member and an exact duplicate of the lot.
    let members = MultiPolygon::new(vec![
        rect(X0, Y0, 100.0, 100.0),
        rect(X0 + 25.0, Y0 + 25.0, 50.0, 50.0),
        rect(X0, Y0, 100.0, 100.0),
    ]);
    let boundary = FeatureCollection::new(vec![Feature::new(members)]);

    let output = DevelopableAreaBuilder::new(MemorySource::new(), &Config::default())
        .build(&boundary, &mut RunContext::new()).await;

    assert_eq!(output.parts.len(), 1);
    assert_relative_eq!(output.total_area(), 10_000.0, max_relative = 1e-6);
}

#[tokio::test]
async fn area_estimate_is_taken_off_the_parts() {
    let boundary = FeatureCollection::new(vec![Feature::new(rect(X0, Y0, 100.0, 100.0))]);
    let flood = FeatureCollection::new(vec![Feature::new(rect(X0 + 50.0, Y0, 50.0, 100.0))]);

    let output = DevelopableAreaBuilder::new(MemorySource::new().with_layer(Layer::Flood, flood), &Config::default())
        .with_engine(DifferenceEngine::default().with_chain([]))
        .build(&boundary, &mut RunContext::new()).await;

    // min(10 000, 5 000) × 0.1 comes off the untouched boundary.
    assert!(output.is_estimated());
    assert_relative_eq!(output.total_area(), 9_500.0, max_relative = 1e-6);

    let report = output.reports.iter().find(|r| r.layer == Layer::Flood).unwrap();
    assert_eq!(report.strategies, vec![Strategy::AreaEstimate]);
    assert_relative_eq!(report.area_after, 9_500.0, max_relative = 1e-6);
}

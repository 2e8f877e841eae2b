use std::f64::consts::PI;

use geo::{Area, Centroid, MultiPolygon};
use tracing::debug;

use crate::geom::boolean::{self, guarded, union_all};
use crate::geom::{circle, CIRCLE_SEGMENTS};
use crate::geometry::{DifferenceEngine, Strategy};

/// Circle radii tried by the aggressive pass, as multiples of the cutout's equivalent radius.
const AGGRESSIVE_MULTIPLIERS: [f64; 3] = [1.0, 2.0, 4.0];

/// What happened while subtracting one layer's cutouts.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pass {
    pub intersecting: usize,
    pub strategies: Vec<Strategy>,
    pub estimated: bool,
    /// Area (m²) taken off by area estimates; the geometry itself was left uncut.
    pub estimated_reduction: f64,
    pub aggressive: usize,
    pub failed: usize,
}

impl Pass {
    fn record(&mut self, strategy: Strategy) {
        self.strategies.push(strategy);
        self.estimated |= strategy.is_estimated();
    }

    fn record_estimate(&mut self, reduction: f64) {
        self.record(Strategy::AreaEstimate);
        self.estimated_reduction += reduction;
    }
}

/// Subtract cutouts one at a time, skipping those that miss the running shape.
pub(crate) fn subtract_each(engine: &DifferenceEngine, mut running: MultiPolygon<f64>, cutouts: &[MultiPolygon<f64>]) -> (MultiPolygon<f64>, Pass) {
    let mut pass = Pass::default();
    for cutout in cutouts {
        if running.0.is_empty() { break }
        if !engine.overlaps(&running, cutout) { continue }
        pass.intersecting += 1;
        let subtraction = engine.subtract(&running, cutout);
        match subtraction.strategy {
            Strategy::AreaEstimate => pass.record_estimate(subtraction.estimated_reduction),
            Strategy::Failed => {
                pass.record(Strategy::Failed);
                pass.failed += 1;
            }
            strategy => pass.record(strategy),
        }
        running = subtraction.result;
    }
    (running, pass)
}

/// Biodiversity cutouts are merged and subtracted `batch_size` at a time. A batch
/// that cannot be cut exactly is redone feature by feature, and features that still
/// fail get an aggressive pass with growing circles at their centroids. A feature
/// the aggressive pass cannot cut either falls back to its area estimate, if any.
pub(crate) fn subtract_batched(
    engine: &DifferenceEngine,
    mut running: MultiPolygon<f64>,
    cutouts: &[MultiPolygon<f64>],
    batch_size: usize,
) -> (MultiPolygon<f64>, Pass) {
    let mut pass = Pass::default();
    let mut retry = Vec::new();

    for (batch_index, batch) in cutouts.chunks(batch_size.max(1)).enumerate() {
        if running.0.is_empty() { break }
        let hits: Vec<&MultiPolygon<f64>> = batch.iter().filter(|cutout| engine.overlaps(&running, cutout)).collect();
        if hits.is_empty() { continue }
        pass.intersecting += hits.len();

        let merged = union_all(hits.iter().map(|cutout| (*cutout).clone()).collect());
        let subtraction = engine.subtract(&running, &merged);
        if subtraction.changed() && !subtraction.is_estimated() {
            pass.record(subtraction.strategy);
            running = subtraction.result;
            continue;
        }

        debug!(batch = batch_index, "[develop:biodiversity] batch needs per-feature subtraction");
        for cutout in hits {
            let subtraction = engine.subtract(&running, cutout);
            match subtraction.strategy {
                Strategy::AreaEstimate | Strategy::Failed => retry.push((cutout.clone(), subtraction.estimated_reduction)),
                strategy => {
                    pass.record(strategy);
                    running = subtraction.result;
                }
            }
        }
    }

    for (cutout, reduction) in &retry {
        match aggressive(&running, cutout) {
            Some(result) => {
                running = result;
                pass.aggressive += 1;
                pass.estimated = true;
            }
            None if *reduction > 0.0 => pass.record_estimate(*reduction),
            None => pass.failed += 1,
        }
    }
    if !retry.is_empty() {
        debug!(retried = retry.len(), succeeded = pass.aggressive, "[develop:biodiversity] aggressive pass finished");
    }

    (running, pass)
}

/// Remove circles of 1×, 2× then 4× the cutout's equivalent radius; first reduction wins.
fn aggressive(running: &MultiPolygon<f64>, cutout: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let center = guarded(|| cutout.centroid()).flatten()?;
    let radius = (cutout.unsigned_area() / PI).sqrt().max(1.0);
    let area = running.unsigned_area();
    AGGRESSIVE_MULTIPLIERS.iter().find_map(|multiplier| {
        let disc = MultiPolygon::new(vec![circle(center.0, radius * multiplier, CIRCLE_SEGMENTS)]);
        let result = boolean::difference(running, &disc)?;
        (result.unsigned_area() < area).then_some(result)
    })
}

use crate::geom::intersects;
use crate::types::Dataset;

use super::{nearest, Criterion, Datasets, Footprint, ScoreResult};

const SERVICES: [(Dataset, &str); 3] = [
    (Dataset::Water, "water"),
    (Dataset::Sewer, "sewer"),
    (Dataset::Power, "power"),
];

/// One point per service with a line inside the buffer around the site.
#[derive(Debug, Clone, PartialEq)]
pub struct Servicing {
    buffer_m: f64,
}

impl Servicing {
    pub fn new(buffer_m: f64) -> Self { Self { buffer_m } }
}

impl Criterion for Servicing {
    fn key(&self) -> &'static str { "servicing" }

    fn assess(&self, datasets: &Datasets, footprint: &Footprint) -> ScoreResult {
        let reach = footprint.buffered(self.buffer_m);

        let mut available = Vec::new();
        let mut supporting = Vec::new();
        let mut closest = f64::INFINITY;
        for (dataset, name) in SERVICES {
            let features = datasets.features(dataset);
            let lines: Vec<_> = features.iter().filter(|f| intersects(&reach, &f.geometry)).cloned().collect();
            if !lines.is_empty() {
                available.push(name);
                supporting.extend(lines);
            }
            if let Some((distance, _)) = nearest(footprint, features) {
                closest = closest.min(distance);
            }
        }

        ScoreResult::new(available.len() as i64, closest)
            .with_class((!available.is_empty()).then(|| available.join(", ")))
            .with_supporting(supporting)
    }

    fn score_description(&self, result: &ScoreResult) -> String {
        match &result.class {
            Some(services) => format!("Services within {:.0} m: {services}.", self.buffer_m),
            None => format!("No service lines within {:.0} m of the site.", self.buffer_m),
        }
    }
}

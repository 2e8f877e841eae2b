use geo::{Area, MultiPolygon, Rect};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::acquire::{fetch_with_deadline, zone_matches, CancellationToken, FeatureSource};
use crate::config::{BuilderConfig, Config};
use crate::geom::{buffer_geometry, expand_rect, Crs, Projection};
use crate::geometry::{is_valid, normalize_geometry, validate, DifferenceEngine, Strategy};
use crate::types::{Feature, FeatureCollection, Layer, LayerDescriptor};

use super::biodiversity::{subtract_batched, subtract_each, Pass};
use super::context::RunContext;
use super::parts::{apply_reduction, fallback, into_features, split, PartMeta};
use super::site::{sites, Site};

/// How a layer stage ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageOutcome {
    /// Features were fetched and checked against the running shape.
    Applied,
    /// The source returned no features.
    Empty,
    /// Timeout, cancellation or upstream error; the layer was skipped.
    Unavailable(String),
}

/// Per-layer telemetry for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub site_index: usize,
    pub layer: Layer,
    pub fetched: usize,
    pub intersecting: usize,
    pub strategies: Vec<Strategy>,
    pub estimated: bool,
    /// Area (m²) this layer removed by estimate only.
    pub estimated_reduction: f64,
    pub failed: usize,
    /// Effective areas: geometry area less every estimated reduction so far.
    pub area_before: f64,
    pub area_after: f64,
    pub outcome: StageOutcome,
}

/// Developable-area parts (lon/lat) plus per-layer reports.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub parts: FeatureCollection,
    pub reports: Vec<StageReport>,
}

impl BuildOutput {
    /// Sum of the `area` attribute over all parts (m²).
    pub fn total_area(&self) -> f64 {
        self.parts.iter().filter_map(|part| part.property("area").and_then(Value::as_f64)).sum()
    }

    pub fn has_fallback(&self) -> bool {
        self.parts.iter().any(|part| part.property("fallback") == Some(&Value::Bool(true)))
    }

    pub fn is_estimated(&self) -> bool {
        self.parts.iter().any(|part| part.property("estimated") == Some(&Value::Bool(true)))
    }
}

/// Boundary in planar form, ready for subtraction.
struct Prepared {
    projection: Projection,
    shape: MultiPolygon<f64>,
    envelope: Rect<f64>,
}

/// Query envelope: `bounds` grown on every side by `expansion` times its larger dimension.
pub fn query_envelope(bounds: &Rect<f64>, expansion: f64) -> Rect<f64> {
    let margin = bounds.width().max(bounds.height()) * expansion;
    expand_rect(bounds, margin, margin)
}

/// Planar cutouts for a layer: zone-filtered, projected, lines and points buffered.
fn cutouts(collection: &FeatureCollection, descriptor: &LayerDescriptor, projection: &Projection) -> Vec<MultiPolygon<f64>> {
    collection.iter()
        .filter(|feature| zone_matches(descriptor, feature))
        .filter_map(|feature| {
            let planar = Feature::new(projection.forward(&feature.geometry)?);
            match planar.areal() {
                Some(shape) => Some(shape),
                None => {
                    let buffered = buffer_geometry(&planar.geometry, descriptor.buffer_m);
                    (!buffered.0.is_empty()).then_some(buffered)
                }
            }
        })
        .collect()
}

/// Derives the developable area of site boundaries by subtracting constraint layers.
pub struct DevelopableAreaBuilder<S> {
    source: S,
    config: BuilderConfig,
    engine: DifferenceEngine,
    token: CancellationToken,
}

impl<S: FeatureSource> DevelopableAreaBuilder<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            config: config.builder.clone(),
            engine: DifferenceEngine::new(config.difference.clone()),
            token: CancellationToken::new(),
        }
    }

    pub fn with_engine(mut self, engine: DifferenceEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token that aborts outstanding layer fetches of this builder.
    #[inline] pub fn token(&self) -> &CancellationToken { &self.token }

    #[inline] pub fn source(&self) -> &S { &self.source }

    /// Build developable-area parts for every site in `boundary`.
    pub async fn build(&self, boundary: &FeatureCollection, ctx: &mut RunContext) -> BuildOutput {
        let sites = sites(boundary);
        info!(sites = sites.len(), "[develop] building developable area");

        let mut output = BuildOutput::default();
        for site in &sites {
            let (parts, reports) = self.build_site(site, ctx).await;
            output.parts.features.extend(parts);
            output.reports.extend(reports);
        }

        let total_area = output.total_area();
        output.parts.properties.insert("partCount".into(), output.parts.len().into());
        output.parts.properties.insert("totalArea".into(), total_area.into());
        info!(parts = output.parts.len(), total_area, "[develop] done");
        output
    }

    fn prepare(&self, site: &Site) -> Option<Prepared> {
        let bounds = site.feature.bounds()?;
        let validated = normalize_geometry(&site.feature.geometry, Crs::detect(&bounds))?;
        let projection = Projection::for_bounds(&bounds)
            .map_err(|err| warn!(site = site.index, "[develop] no planar frame for site: {err:#}"))
            .ok()?;
        let shape = projection.forward_multipolygon(&validated.shape)?;
        let shape = if is_valid(&shape) { shape } else { validate(shape, Crs::Projected)?.shape };
        debug!(site = site.index, crs = %projection.label(), area = shape.unsigned_area(), "[develop] prepared boundary");
        Some(Prepared { projection, shape, envelope: query_envelope(&bounds, self.config.envelope_expansion) })
    }

    async fn build_site(&self, site: &Site, ctx: &mut RunContext) -> (Vec<Feature>, Vec<StageReport>) {
        let mut meta = PartMeta {
            site_index: site.index,
            sequence: ctx.next_sequence(),
            estimated: false,
            site_name: site.name.clone(),
        };

        let Some(Prepared { projection, shape, envelope }) = self.prepare(site) else {
            warn!(site = site.index, "[develop] boundary is unusable, returning it as a fallback part");
            return (vec![fallback(&site.feature, &meta)], Vec::new());
        };

        let mut running = shape;
        let mut reduction = 0.0;
        let mut reports = Vec::new();
        for layer in Layer::order() {
            let descriptor = self.config.descriptor(layer);
            let area_before = (running.unsigned_area() - reduction).max(0.0);
            let report = |fetched, pass: Pass, area_after, outcome| StageReport {
                site_index: site.index,
                layer,
                fetched,
                intersecting: pass.intersecting,
                strategies: pass.strategies,
                estimated: pass.estimated,
                estimated_reduction: pass.estimated_reduction,
                failed: pass.failed,
                area_before,
                area_after,
                outcome,
            };

            let fetched = fetch_with_deadline(&self.source, &descriptor, envelope, self.config.fetch_timeout(), &self.token).await;
            let collection = match fetched {
                Ok(collection) => collection,
                Err(err) => {
                    warn!(site = site.index, %layer, "[develop] layer unavailable, skipping: {err}");
                    reports.push(report(0, Pass::default(), area_before, StageOutcome::Unavailable(err.to_string())));
                    continue;
                }
            };
            if collection.is_empty() {
                reports.push(report(0, Pass::default(), area_before, StageOutcome::Empty));
                continue;
            }

            let cutouts = cutouts(&collection, &descriptor, &projection);
            let (next, pass) = match layer {
                Layer::Biodiversity => subtract_batched(&self.engine, running, &cutouts, self.config.biodiversity_batch_size),
                _ => subtract_each(&self.engine, running, &cutouts),
            };
            running = next;
            reduction += pass.estimated_reduction;
            meta.estimated |= pass.estimated;

            let area_after = (running.unsigned_area() - reduction).max(0.0);
            debug!(site = site.index, %layer, fetched = collection.len(), intersecting = pass.intersecting,
                area_before, area_after, "[develop] layer applied");
            reports.push(report(collection.len(), pass, area_after, StageOutcome::Applied));
        }

        let mut parts = split(&running, self.config.min_part_area_m2);
        apply_reduction(&mut parts, reduction);
        let parts = into_features(parts, &projection, &meta);
        if parts.is_empty() {
            warn!(site = site.index, "[develop] nothing developable remains, returning boundary as a fallback part");
            return (vec![fallback(&site.feature, &meta)], reports);
        }
        (parts, reports)
    }
}

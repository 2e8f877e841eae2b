use anyhow::{anyhow, Context, Result};
use geo::{Coord, CoordsIter, Geometry, MapCoords, MultiPolygon, Rect};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::types::Feature;

use super::shapes::meters_to_degrees;

const GEOGRAPHIC_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Returns `true` if the rectangle lies within the valid lon/lat domain.
pub fn is_geographic(bounds: &Rect<f64>) -> bool {
    bounds.min().x >= -180.0 && bounds.max().x <= 180.0
        && bounds.min().y >= -90.0 && bounds.max().y <= 90.0
}

/// Coordinate frame of raw input; decides how meter-based tolerances are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    Geographic,     // lon/lat degrees
    Projected,      // meters
}

impl Crs {
    pub fn detect(bounds: &Rect<f64>) -> Self {
        if is_geographic(bounds) { Crs::Geographic } else { Crs::Projected }
    }

    /// Express a distance in meters as (dx, dy) offsets in this frame at `at`.
    pub fn offsets(&self, meters: f64, at: Coord<f64>) -> (f64, f64) {
        match self {
            Crs::Projected => (meters, meters),
            Crs::Geographic => meters_to_degrees(meters, at.y),
        }
    }

    /// Single scalar tolerance for `meters` (the smaller of the two offsets).
    pub fn tolerance(&self, meters: f64, at: Coord<f64>) -> f64 {
        let (dx, dy) = self.offsets(meters, at);
        dx.min(dy)
    }
}

/// Local planar frame used for area and distance work.
/// Geographic input is reprojected to the UTM zone of its center;
/// input that is already projected passes through unchanged.
pub enum Projection {
    Utm { zone: u32, south: bool, geographic: Proj4, utm: Proj4 },
    Identity,
}

impl Projection {
    /// Choose a projection for data covering `bounds`.
    pub fn for_bounds(bounds: &Rect<f64>) -> Result<Self> {
        if !is_geographic(bounds) { return Ok(Self::Identity) }

        let center = bounds.center();
        let zone = (((center.x + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u32;
        let south = center.y < 0.0;

        let geographic = Proj4::from_proj_string(GEOGRAPHIC_PROJ4)
            .with_context(|| anyhow!("failed to build source PROJ.4: {GEOGRAPHIC_PROJ4}"))?;

        let utm = {
            let proj_string = format!(
                "+proj=utm +zone={zone}{} +datum=WGS84 +units=m +no_defs +type=crs",
                if south { " +south" } else { "" },
            );
            Proj4::from_proj_string(&proj_string)
                .with_context(|| anyhow!("failed to build target PROJ.4: {proj_string}"))?
        };

        Ok(Self::Utm { zone, south, geographic, utm })
    }

    #[inline] pub fn identity() -> Self { Self::Identity }

    #[inline] pub fn is_identity(&self) -> bool { matches!(self, Self::Identity) }

    /// Human-readable CRS label, e.g. `UTM 56S`.
    pub fn label(&self) -> String {
        match self {
            Self::Utm { zone, south, .. } => format!("UTM {zone}{}", if *south { "S" } else { "N" }),
            Self::Identity => "planar".to_string(),
        }
    }

    /// Degrees in, meters out. Failed transforms produce NaN so callers can reject the geometry.
    fn forward_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Identity => coord,
            Self::Utm { geographic, utm, .. } => {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
                match transform(geographic, utm, &mut point) {
                    Ok(_) => Coord { x: point.0, y: point.1 },
                    Err(_) => Coord { x: f64::NAN, y: f64::NAN },
                }
            }
        }
    }

    /// Meters in, degrees out.
    fn inverse_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Identity => coord,
            Self::Utm { geographic, utm, .. } => {
                let mut point = (coord.x, coord.y, 0.0);
                match transform(utm, geographic, &mut point) {
                    Ok(_) => Coord { x: point.0.to_degrees(), y: point.1.to_degrees() },
                    Err(_) => Coord { x: f64::NAN, y: f64::NAN },
                }
            }
        }
    }

    /// Reproject a geometry into the planar frame. `None` if any coordinate fails.
    pub fn forward(&self, geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
        let projected = geometry.map_coords(|c: Coord<f64>| self.forward_coord(c));
        let finite = projected.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite());
        finite.then_some(projected)
    }

    /// Reproject a planar geometry back to lon/lat. `None` if any coordinate fails.
    pub fn inverse(&self, geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
        let restored = geometry.map_coords(|c: Coord<f64>| self.inverse_coord(c));
        let finite = restored.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite());
        finite.then_some(restored)
    }

    pub fn forward_multipolygon(&self, shape: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        let projected = shape.map_coords(|c: Coord<f64>| self.forward_coord(c));
        let finite = projected.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite());
        finite.then_some(projected)
    }

    pub fn inverse_multipolygon(&self, shape: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        let restored = shape.map_coords(|c: Coord<f64>| self.inverse_coord(c));
        let finite = restored.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite());
        finite.then_some(restored)
    }

    /// Reproject a feature, keeping its attributes.
    pub fn forward_feature(&self, feature: &Feature) -> Option<Feature> {
        Some(Feature {
            id: feature.id.clone(),
            geometry: self.forward(&feature.geometry)?,
            properties: feature.properties.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Point};

    #[test]
    fn projected_bounds_pass_through() {
        let rect = Rect::new(Coord { x: 300_000.0, y: 6_250_000.0 }, Coord { x: 300_100.0, y: 6_250_100.0 });
        assert!(Projection::for_bounds(&rect).unwrap().is_identity());
    }

    #[test]
    fn sydney_uses_zone_56_south() {
        let rect = Rect::new(Coord { x: 151.0, y: -34.0 }, Coord { x: 151.1, y: -33.9 });
        let projection = Projection::for_bounds(&rect).unwrap();
        assert_eq!(projection.label(), "UTM 56S");
    }

    #[test]
    fn forward_then_inverse_recovers_coordinates() {
        let rect = Rect::new(Coord { x: 151.0, y: -34.0 }, Coord { x: 151.1, y: -33.9 });
        let projection = Projection::for_bounds(&rect).unwrap();
        let point = Geometry::Point(Point::new(151.05, -33.95));

        let metric = projection.forward(&point).unwrap();
        let Geometry::Point(p) = projection.inverse(&metric).unwrap() else { panic!("expected point") };
        assert_relative_eq!(p.x(), 151.05, epsilon = 1e-7);
        assert_relative_eq!(p.y(), -33.95, epsilon = 1e-7);
    }

    #[test]
    fn thousandth_degree_square_has_plausible_area() {
        // ~0.001° square near the equator is roughly 111 m on a side.
        let rect = Rect::new(Coord { x: 0.0005, y: 0.0005 }, Coord { x: 0.0015, y: 0.0015 });
        let projection = Projection::for_bounds(&rect).unwrap();
        let projected = projection.forward(&Geometry::Polygon(rect.to_polygon())).unwrap();
        let area = projected.unsigned_area();
        assert!(area > 11_000.0 && area < 13_000.0, "area = {area}");
    }
}

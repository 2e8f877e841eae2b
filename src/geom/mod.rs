//! Planar geometry helpers shared by the repair, subtraction and scoring code.
//! Distances and areas are in the units of the input; the pipeline projects
//! to meters before calling into here.

mod algorithm;
mod bbox;
pub mod boolean;
mod buffer;
mod measure;
mod proj;
mod shapes;

pub use algorithm::significant_vertices;
pub use bbox::{envelope, BoundingBox};
pub use buffer::{buffer_geometry, buffer_lines, buffer_points, buffer_polygons};
pub use measure::{interior_angles, intersects};
pub use proj::{is_geographic, Crs, Projection};
pub use shapes::{circle, expand_rect, meters_to_degrees, rect_around, CIRCLE_SEGMENTS, METERS_PER_DEGREE};

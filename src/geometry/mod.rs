mod difference;
mod repair;
mod validate;

pub use difference::{DifferenceEngine, Strategy, Subtraction};
pub use repair::{repair, RepairStrategy};
pub use validate::{is_valid, normalize, normalize_geometry, to_geometry, validate, Validated};
